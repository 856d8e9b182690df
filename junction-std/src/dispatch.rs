//! Call dispatch: the `run_method` step between method resolution and the
//! transport's response encoding.

use crate::registry::ServiceRegistry;
use junction_core::{CallContext, Callback, Chain, MethodResult, Params, RpcError};
use std::sync::Arc;

/// Runs resolved calls through the registry's current middleware stack.
///
/// For each call the dispatcher takes a single snapshot of the middleware
/// stack, composes it around the callback, and runs it. It adds no retry,
/// timeout or panic handling of its own; those belong to middlewares.
///
/// # Example
/// ```ignore
/// let dispatcher = Dispatcher::new(registry.clone());
/// let cb = registry.callback("test_echo").unwrap();
/// let result = dispatcher.dispatch(ctx, "test_echo", cb, vec![json!("hello")]).await;
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over `registry`.
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Run one resolved call and return its result unchanged.
    ///
    /// `args` must already match the callback's argument list; a mismatch is
    /// reported by the callback as an `invalid_params` error.
    pub async fn dispatch(
        &self,
        ctx: CallContext,
        method: &str,
        callback: Arc<Callback>,
        args: Params,
    ) -> MethodResult {
        let chain = Chain::new(self.registry.current_middlewares(), callback);

        #[cfg(feature = "tracing")]
        {
            use tracing::Instrument;

            let started = std::time::Instant::now();
            let span = tracing::debug_span!("rpc_call", %method, middlewares = chain.len());
            let result = chain
                .call(ctx, method.to_string(), args)
                .instrument(span)
                .await;
            match &result.error {
                Some(err) => tracing::debug!(
                    %method,
                    code = err.code(),
                    elapsed = ?started.elapsed(),
                    "Dispatch finished with error"
                ),
                None => tracing::debug!(%method, elapsed = ?started.elapsed(), "Dispatch finished"),
            }
            result
        }

        #[cfg(not(feature = "tracing"))]
        {
            chain.call(ctx, method.to_string(), args).await
        }
    }

    /// Resolve `method` in the registry and dispatch it.
    ///
    /// Unknown methods fail with `method_not_found` without running any
    /// middleware.
    pub async fn dispatch_method(
        &self,
        ctx: CallContext,
        method: &str,
        args: Params,
    ) -> MethodResult {
        match self.registry.callback(method) {
            Some(callback) => self.dispatch(ctx, method, callback, args).await,
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%method, "Method not found");
                MethodResult::err(RpcError::method_not_found(method))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registry::Service,
        testing::{CountingMiddleware, MarkerMiddleware, OrderLog, ShortCircuitMiddleware},
    };
    use junction_core::{MiddlewareStack, Next, codes};
    use serde_json::json;

    fn echo() -> Arc<Callback> {
        Arc::new(Callback::with_context(|_ctx: CallContext, s: String| async move {
            Ok::<_, RpcError>(s)
        }))
    }

    #[tokio::test]
    async fn test_dispatch_without_middleware() {
        let dispatcher = Dispatcher::new(Arc::new(ServiceRegistry::new()));
        let result = dispatcher
            .dispatch(CallContext::background(), "test_echo", echo(), vec![json!("hello")])
            .await;
        assert_eq!(result, MethodResult::ok(json!("hello")));
    }

    #[tokio::test]
    async fn test_middleware_called_once() {
        let registry = Arc::new(ServiceRegistry::new());
        let counter = CountingMiddleware::new();
        registry.set_middlewares(MiddlewareStack::new().with(counter.clone()));

        let dispatcher = Dispatcher::new(registry);
        dispatcher
            .dispatch(CallContext::background(), "test_echo", echo(), vec![json!("hello")])
            .await;
        assert_eq!(counter.count(), 1);
    }

    #[tokio::test]
    async fn test_chain_order_around_add() {
        let registry = Arc::new(ServiceRegistry::new());
        let log = OrderLog::new();
        registry.set_middlewares(
            MiddlewareStack::new()
                .with(MarkerMiddleware::new(log.clone(), 1, 4))
                .with(MarkerMiddleware::new(log.clone(), 2, 3)),
        );

        let add = Arc::new(Callback::with_context(
            |_ctx: CallContext, a: i64, b: i64| async move { Ok::<_, RpcError>(a + b) },
        ));
        let result = Dispatcher::new(registry)
            .dispatch(CallContext::background(), "test_add", add, vec![json!(1), json!(2)])
            .await;

        assert_eq!(result.value, Some(json!(3)));
        assert_eq!(log.entries(), [1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let registry = Arc::new(ServiceRegistry::new());
        let counter = CountingMiddleware::new();
        registry.set_middlewares(
            MiddlewareStack::new()
                .with(ShortCircuitMiddleware::new(MethodResult::ok(json!("cached"))))
                .with(counter.clone()),
        );

        let result = Dispatcher::new(registry)
            .dispatch(CallContext::background(), "test_echo", echo(), vec![json!("hello")])
            .await;
        assert_eq!(result, MethodResult::ok(json!("cached")));
        assert_eq!(counter.count(), 0);
    }

    #[tokio::test]
    async fn test_handler_error_is_returned_unchanged() {
        let failing = Arc::new(Callback::new(|| async {
            Err::<(), _>(RpcError::new(-39001, "custom failure"))
        }));
        let result = Dispatcher::new(Arc::new(ServiceRegistry::new()))
            .dispatch(CallContext::background(), "test_fail", failing, vec![])
            .await;
        assert_eq!(result, MethodResult::err(RpcError::new(-39001, "custom failure")));
    }

    #[tokio::test]
    async fn test_middleware_can_wrap_error() {
        let registry = Arc::new(ServiceRegistry::new());
        let wrap = |ctx: CallContext, method: String, args: Params, next: Next| async move {
            let mut result = next.run(ctx, method, args).await;
            if let Some(err) = result.error.take() {
                result.error = Some(RpcError::new(err.code(), format!("wrapped: {err}")));
            }
            result
        };
        registry.set_middlewares(MiddlewareStack::new().with(wrap));

        let result = Dispatcher::new(registry)
            .dispatch(CallContext::background(), "test_echo", echo(), vec![json!(5)])
            .await;
        let err = result.error.unwrap();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
        assert!(err.message().starts_with("wrapped: invalid argument 0"));
    }

    #[tokio::test]
    async fn test_dispatch_method_resolves_and_rejects() {
        let registry = Arc::new(ServiceRegistry::new());
        registry
            .register_name("test", Service::new().method("echo", (*echo()).clone()))
            .unwrap();
        let counter = CountingMiddleware::new();
        registry.set_middlewares(MiddlewareStack::new().with(counter.clone()));
        let dispatcher = Dispatcher::new(registry);

        let ok = dispatcher
            .dispatch_method(CallContext::background(), "test_echo", vec![json!("hi")])
            .await;
        assert_eq!(ok.value, Some(json!("hi")));

        let missing = dispatcher
            .dispatch_method(CallContext::background(), "test_nope", vec![])
            .await;
        assert_eq!(missing.error.unwrap().code(), codes::METHOD_NOT_FOUND);
        assert_eq!(counter.count(), 1);
    }
}
