//! Conditional Middleware - Apply a middleware to selected calls only.

use junction_core::{CallContext, MethodResult, Middleware, Next, Params};

/// A middleware that conditionally applies an inner middleware.
///
/// The inner middleware only sees the call if the condition returns `true`.
/// Otherwise the call passes straight to `next`.
///
/// # Example
///
/// ```rust,ignore
/// use junction::middleware::{ConditionalMiddleware, TimeoutMiddleware};
///
/// // Only time-limit calls coming over websockets
/// let ws_only = ConditionalMiddleware::new(
///     |ctx: &CallContext, _method: &str| ctx.peer().transport == "ws",
///     TimeoutMiddleware::secs(5),
/// );
/// ```
pub struct ConditionalMiddleware<C, M> {
    condition: C,
    inner: M,
}

impl<C, M> ConditionalMiddleware<C, M> {
    /// Create a new `ConditionalMiddleware`.
    ///
    /// The inner middleware will only run when `condition(ctx, method)` returns `true`.
    pub fn new(condition: C, inner: M) -> Self {
        Self { condition, inner }
    }

    /// Get a reference to the inner middleware.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<C, M> Middleware for ConditionalMiddleware<C, M>
where
    C: Fn(&CallContext, &str) -> bool + Send + Sync + 'static,
    M: Middleware,
{
    async fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> MethodResult {
        if (self.condition)(&ctx, &method) {
            self.inner.handle(ctx, method, args, next).await
        } else {
            next.run(ctx, method, args).await
        }
    }
}

/// Apply `inner` only to methods whose full name starts with `prefix`.
///
/// ```rust,ignore
/// // Log everything in the `debug` service
/// let stack = MiddlewareStack::new().with(only_methods("debug_", LoggingMiddleware::new()));
/// ```
pub fn only_methods<M: Middleware>(
    prefix: impl Into<String>,
    inner: M,
) -> ConditionalMiddleware<impl Fn(&CallContext, &str) -> bool + Send + Sync + 'static, M> {
    let prefix = prefix.into();
    ConditionalMiddleware::new(
        move |_: &CallContext, method: &str| method.starts_with(prefix.as_str()),
        inner,
    )
}
