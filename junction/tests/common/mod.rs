#![allow(dead_code)]

use junction::{CallContext, Callback, Middleware, Next, Params, RpcError, Server, Service};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

// ============================================================================
// Test Types
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Identity attached to the call context by [`authenticate`].
#[derive(Clone, Debug, PartialEq)]
pub struct User(pub String);

// ============================================================================
// Test Service
// ============================================================================

/// Builds the `test` service used across the integration tests.
///
/// `attempts` counts calls to `flaky`, which fails until its third attempt.
pub fn test_service(attempts: Arc<AtomicUsize>) -> Service {
    Service::new()
        .method(
            "echo",
            Callback::with_context(|_ctx: CallContext, s: String| async move {
                Ok::<_, RpcError>(s)
            }),
        )
        .method(
            "add",
            Callback::with_context(|_ctx: CallContext, a: i64, b: i64| async move {
                Ok::<_, RpcError>(a + b)
            }),
        )
        .method(
            "norm",
            Callback::new(|p: Point| async move { Ok::<_, RpcError>(p.x * p.x + p.y * p.y) }),
        )
        .method(
            "whoami",
            Callback::with_context(|ctx: CallContext| async move {
                match ctx.value::<User>() {
                    Some(User(name)) => Ok(name.clone()),
                    None => Err(RpcError::new(-32001, "not authenticated")),
                }
            }),
        )
        .method(
            "fail",
            Callback::new(|| async { Err::<(), _>(RpcError::new(-39001, "custom failure")) }),
        )
        .method(
            "crash",
            Callback::new(|reason: String| async move {
                if !reason.is_empty() {
                    panic!("{reason}");
                }
                Ok::<_, RpcError>(())
            }),
        )
        .method(
            "div",
            Callback::new(|n: u64| {
                let quotient = 100u64.checked_div(n).expect("division by zero");
                async move { Ok::<_, RpcError>(quotient) }
            }),
        )
        .method(
            "sleep",
            Callback::new(|millis: u64| async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok::<_, RpcError>(millis)
            }),
        )
        .method(
            "flaky",
            Callback::new(move || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt < 3 {
                        Err(RpcError::new(-32000, "busy"))
                    } else {
                        Ok(attempt)
                    }
                }
            }),
        )
}

/// A server with the `test` service registered and no middlewares.
pub fn test_server() -> (Server, Arc<AtomicUsize>) {
    let attempts = Arc::new(AtomicUsize::new(0));
    let server = Server::new();
    server
        .register_name("test", test_service(attempts.clone()))
        .unwrap();
    (server, attempts)
}

// ============================================================================
// Test Middlewares
// ============================================================================

/// Appends `tag` to the array passed as the first argument, then continues.
pub fn tag(name: &'static str) -> impl Middleware {
    move |ctx: CallContext, method: String, mut args: Params, next: Next| async move {
        if let Some(Value::Array(tags)) = args.first_mut() {
            tags.push(json!(name));
        }
        next.run(ctx, method, args).await
    }
}

/// Attaches a [`User`] to every call's context.
pub struct Authenticate {
    pub user: &'static str,
}

impl Middleware for Authenticate {
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> junction::MethodResult {
        let ctx = ctx.with_value(User(self.user.to_string()));
        next.run(ctx, method, args).await
    }
}

pub fn authenticate(user: &'static str) -> Authenticate {
    Authenticate { user }
}
