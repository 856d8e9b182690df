//! Logging Middleware - Observability for method calls.

use junction_core::{CallContext, MethodResult, Middleware, Next, Params};
#[cfg(feature = "tracing")]
use std::time::Instant;

/// A middleware that logs calls for observability.
///
/// Logs the method before the call and its outcome after, then returns the
/// result untouched. Uses the `tracing` crate when the `tracing` feature is
/// enabled and does nothing otherwise.
///
/// # Example
///
/// ```rust,ignore
/// use junction::middleware::LoggingMiddleware;
///
/// // Default name
/// let logging = LoggingMiddleware::new();
///
/// // Or with a custom name
/// let logging = LoggingMiddleware::named("public_api");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LoggingMiddleware {
    name: &'static str,
}

impl LoggingMiddleware {
    /// Create a new `LoggingMiddleware` with a default name.
    pub fn new() -> Self {
        Self { name: "rpc" }
    }

    /// Create a new `LoggingMiddleware` with a custom name.
    ///
    /// The name is used in log messages to identify the stack.
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }

    /// The name used in log messages.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> MethodResult {
        #[cfg(feature = "tracing")]
        {
            let peer = ctx.peer().remote_addr.clone();
            let started = Instant::now();
            tracing::debug!(name = %self.name, %method, %peer, argc = args.len(), "Serving call");

            let result = next.run(ctx, method.clone(), args).await;

            let elapsed = started.elapsed();
            match &result.error {
                Some(err) => tracing::warn!(
                    name = %self.name,
                    %method,
                    %peer,
                    code = err.code(),
                    error = %err,
                    ?elapsed,
                    "Call failed"
                ),
                None => tracing::debug!(name = %self.name, %method, %peer, ?elapsed, "Served call"),
            }
            result
        }

        #[cfg(not(feature = "tracing"))]
        {
            next.run(ctx, method, args).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::respond_with;
    use junction_core::{Chain, MiddlewareStack, RpcError};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_logging_passes_result_through() {
        let stack = MiddlewareStack::new().with(LoggingMiddleware::new());
        let chain = Chain::new(Arc::new(stack), Arc::new(respond_with(json!(7))));

        let result = chain
            .call(CallContext::background(), "test_seven".into(), vec![])
            .await;
        assert_eq!(result, MethodResult::ok(json!(7)));
    }

    #[tokio::test]
    async fn test_logging_passes_error_through() {
        let failing = |_ctx: CallContext, _method: String, _args: Params| async {
            MethodResult::err(RpcError::internal("boom"))
        };
        let stack = MiddlewareStack::new().with(LoggingMiddleware::named("errors"));
        let chain = Chain::new(Arc::new(stack), Arc::new(failing));

        let result = chain
            .call(CallContext::background(), "test_fail".into(), vec![json!(1)])
            .await;
        assert_eq!(result.error.unwrap().message(), "boom");
    }

    #[test]
    fn test_logging_named() {
        assert_eq!(LoggingMiddleware::named("my_stack").name(), "my_stack");
        assert_eq!(LoggingMiddleware::default().name(), "rpc");
    }
}
