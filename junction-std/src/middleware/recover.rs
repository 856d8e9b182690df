//! Recover Middleware - Turn handler panics into error results.

use futures::FutureExt;
use junction_core::{CallContext, MethodResult, Middleware, Next, Params, RpcError};
use std::{any::Any, panic::AssertUnwindSafe};

/// A middleware that catches panics raised further down the chain.
///
/// The dispatcher itself never suppresses panics. Place this link first in
/// the stack to convert a crashing handler (or later link) into an
/// [`RpcError::internal`] result instead of tearing down the connection task.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverMiddleware;

impl RecoverMiddleware {
    /// Create a new `RecoverMiddleware`.
    pub fn new() -> Self {
        Self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

impl Middleware for RecoverMiddleware {
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> MethodResult {
        #[cfg(feature = "tracing")]
        let name = method.clone();

        // `next.run` itself may panic, so it must start inside the guarded future
        let rest = async move { next.run(ctx, method, args).await };
        match AssertUnwindSafe(rest).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                #[cfg(feature = "tracing")]
                tracing::error!(method = %name, panic = %message, "RPC method handler crashed");
                MethodResult::err(RpcError::internal(format!(
                    "method handler crashed: {message}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::respond_with;
    use junction_core::{Chain, MiddlewareStack, codes};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let crashing = |_ctx: CallContext, _method: String, _args: Params| async {
            if true {
                panic!("index out of range");
            }
            MethodResult::empty()
        };
        let stack = MiddlewareStack::new().with(RecoverMiddleware::new());
        let chain = Chain::new(Arc::new(stack), Arc::new(crashing));

        let result = chain
            .call(CallContext::background(), "test_crash".into(), vec![])
            .await;
        let err = result.error.unwrap();
        assert_eq!(err.code(), codes::INTERNAL);
        assert_eq!(err.message(), "method handler crashed: index out of range");
    }

    #[tokio::test]
    async fn test_formatted_panic_message() {
        let crashing = |_ctx: CallContext, method: String, _args: Params| async move {
            if !method.is_empty() {
                panic!("bad method {method}");
            }
            MethodResult::empty()
        };
        let stack = MiddlewareStack::new().with(RecoverMiddleware::new());
        let chain = Chain::new(Arc::new(stack), Arc::new(crashing));

        let result = chain
            .call(CallContext::background(), "test_crash".into(), vec![])
            .await;
        assert_eq!(
            result.error.unwrap().message(),
            "method handler crashed: bad method test_crash"
        );
    }

    #[tokio::test]
    async fn test_panic_before_handler_future_is_caught() {
        let dividing = |_ctx: CallContext, _method: String, args: Params| {
            let quotient = 10usize.checked_div(args.len()).expect("division by zero");
            async move { MethodResult::ok(json!(quotient)) }
        };
        let stack = MiddlewareStack::new().with(RecoverMiddleware::new());
        let chain = Chain::new(Arc::new(stack), Arc::new(dividing));

        let ok = chain
            .call(CallContext::background(), "test_div".into(), vec![json!(1), json!(2)])
            .await;
        assert_eq!(ok, MethodResult::ok(json!(5)));

        let result = chain
            .call(CallContext::background(), "test_div".into(), vec![])
            .await;
        let err = result.error.unwrap();
        assert_eq!(err.code(), codes::INTERNAL);
        assert_eq!(err.message(), "method handler crashed: division by zero");
    }

    #[tokio::test]
    async fn test_panic_in_closure_link_is_caught() {
        let eager = |ctx: CallContext, method: String, args: Params, next: Next| {
            if method.starts_with("admin_") {
                panic!("refusing {method}");
            }
            async move { next.run(ctx, method, args).await }
        };
        let stack = MiddlewareStack::new()
            .with(RecoverMiddleware::new())
            .with(eager);
        let chain = Chain::new(Arc::new(stack), Arc::new(respond_with(json!("fine"))));

        let result = chain
            .call(CallContext::background(), "admin_reset".into(), vec![])
            .await;
        assert_eq!(
            result.error.unwrap().message(),
            "method handler crashed: refusing admin_reset"
        );

        let result = chain
            .call(CallContext::background(), "test_ok".into(), vec![])
            .await;
        assert_eq!(result, MethodResult::ok(json!("fine")));
    }

    #[tokio::test]
    async fn test_no_panic_is_untouched() {
        let stack = MiddlewareStack::new().with(RecoverMiddleware::new());
        let chain = Chain::new(Arc::new(stack), Arc::new(respond_with(json!("fine"))));

        let result = chain
            .call(CallContext::background(), "test_ok".into(), vec![])
            .await;
        assert_eq!(result, MethodResult::ok(json!("fine")));
    }
}
