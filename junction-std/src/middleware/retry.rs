//! Retry Middleware - Re-run the remaining chain on failure.

use junction_core::{CallContext, MethodResult, Middleware, Next, Params, RpcError};
use std::{fmt, sync::Arc};

type RetryPredicate = Arc<dyn Fn(&RpcError) -> bool + Send + Sync>;

/// A middleware that re-invokes `next` while the result is a retryable error.
///
/// Each attempt re-runs every link after this one and the handler itself.
/// Retrying stops after `max_attempts` runs, on the first success, on an
/// error the predicate rejects, or once the call context is done.
///
/// # Example
///
/// ```rust,ignore
/// use junction::{codes, middleware::RetryMiddleware};
///
/// // Up to three attempts, only for timeouts
/// let retry = RetryMiddleware::new(3).retry_if(|err| err.code() == codes::TIMEOUT);
/// ```
#[derive(Clone)]
pub struct RetryMiddleware {
    max_attempts: usize,
    should_retry: RetryPredicate,
}

impl RetryMiddleware {
    /// Create a retry middleware that retries any error.
    ///
    /// `max_attempts` counts the first call; values below 1 are treated as 1.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            should_retry: Arc::new(|_| true),
        }
    }

    /// Only retry errors accepted by `predicate`.
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RpcError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Get the configured attempt limit.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

impl fmt::Debug for RetryMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryMiddleware")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Middleware for RetryMiddleware {
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> MethodResult {
        let mut attempt = 1;
        loop {
            let result = next.run(ctx.clone(), method.clone(), args.clone()).await;
            let retryable = result
                .error
                .as_ref()
                .is_some_and(|err| (self.should_retry)(err));
            if !retryable || attempt >= self.max_attempts || ctx.is_done() {
                return result;
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(%method, attempt, max = self.max_attempts, "Retrying failed call");
            attempt += 1;
        }
    }
}
