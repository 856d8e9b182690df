//! Timeout Middleware - Time-limited execution.
//!
//! **Note**: This module requires the `tokio` runtime (feature `timeout`).

use junction_core::{CallContext, MethodResult, Middleware, Next, Params, RpcError};
use std::time::Duration;
use tokio::time::timeout;

/// A middleware that bounds the time spent in the rest of the chain.
///
/// If the remaining links and the handler do not complete in time, the
/// in-flight future is dropped and an [`RpcError::timeout`] result is returned.
/// A call context with an earlier deadline tightens the limit.
///
/// # Example
///
/// ```rust,ignore
/// use junction::middleware::TimeoutMiddleware;
///
/// // Give every call at most five seconds
/// let stack = MiddlewareStack::new().with(TimeoutMiddleware::secs(5));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TimeoutMiddleware {
    duration: Duration,
}

impl TimeoutMiddleware {
    /// Create a new `TimeoutMiddleware`.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Create a `TimeoutMiddleware` with the timeout specified in seconds.
    pub fn secs(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }

    /// Create a `TimeoutMiddleware` with the timeout specified in milliseconds.
    pub fn millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Get the configured timeout duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Middleware for TimeoutMiddleware {
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> MethodResult {
        let limit = match ctx.remaining() {
            Some(remaining) if remaining < self.duration => remaining,
            _ => self.duration,
        };

        #[cfg(feature = "tracing")]
        let name = method.clone();

        let rest = async move { next.run(ctx, method, args).await };
        match timeout(limit, rest).await {
            Ok(result) => result,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(method = %name, ?limit, "Call timed out");
                MethodResult::err(RpcError::timeout())
            }
        }
    }
}
