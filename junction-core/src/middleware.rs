//! # Middleware Links
//!
//! A middleware is an interceptor around a method call. It receives the call
//! context, the method name, the argument list and a [`Next`] continuation,
//! and returns a [`MethodResult`]. What it does with `next` is up to it:
//!
//! - call it once, with logic before and/or after (logging, metrics)
//! - never call it, returning its own result (caching, access control)
//! - call it several times (retry)
//! - change the context, method name or arguments it passes on
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Middleware`] uses a native `async fn` style signature. Stacks store links
//! as [`DynMiddleware`] trait objects, which every `Middleware` implements
//! through a blanket impl.
//!
//! # Closures
//!
//! Any `Fn(CallContext, String, Params, Next) -> impl Future<Output = MethodResult>`
//! is a middleware:
//!
//! ```rust,ignore
//! let stack = MiddlewareStack::new().with(
//!     |ctx: CallContext, method: String, args: Params, next: Next| async move {
//!         let started = Instant::now();
//!         let result = next.run(ctx, method, args).await;
//!         record_latency(started.elapsed());
//!         result
//!     },
//! );
//! ```

use crate::{callback::Params, chain::Next, context::CallContext, result::MethodResult};
use futures::future::BoxFuture;
use std::{fmt, future::Future, sync::Arc};

/// An interceptor participating in the chain around a method call.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Middleware`",
    label = "missing `Middleware` implementation",
    note = "Middlewares implement `handle(ctx, method, args, next)` or are async closures of that shape."
)]
pub trait Middleware: Send + Sync + 'static {
    /// Intercept one call.
    fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> impl Future<Output = MethodResult> + Send;
}

/// Dynamic object-safe version of [`Middleware`].
pub trait DynMiddleware: Send + Sync + 'static {
    /// Intercept one call (dynamic dispatch version).
    fn handle_dyn(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> BoxFuture<'_, MethodResult>;
}

// Blanket implementation: Any type implementing Middleware implements DynMiddleware automatically.
impl<T: Middleware> DynMiddleware for T {
    fn handle_dyn(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> BoxFuture<'_, MethodResult> {
        Box::pin(self.handle(ctx, method, args, next))
    }
}

// Blanket impl for closures
impl<F, Fut> Middleware for F
where
    F: Fn(CallContext, String, Params, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MethodResult> + Send,
{
    fn handle(
        &self,
        ctx: CallContext,
        method: String,
        args: Params,
        next: Next,
    ) -> impl Future<Output = MethodResult> + Send {
        (self)(ctx, method, args, next)
    }
}

/// An ordered, immutable-once-shared list of middleware links.
///
/// The first link is the outermost: its "before" logic runs first and its
/// "after" logic runs last.
///
/// # Example
/// ```ignore
/// let stack = MiddlewareStack::new()
///     .with(RecoverMiddleware::new())
///     .with(LoggingMiddleware::new());
/// registry.set_middlewares(stack);
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    links: Vec<Arc<dyn DynMiddleware>>,
}

impl MiddlewareStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Append a middleware (builder version).
    pub fn with<M: Middleware>(mut self, middleware: M) -> Self {
        self.push(middleware);
        self
    }

    /// Append a middleware.
    pub fn push<M: Middleware>(&mut self, middleware: M) {
        self.links.push(Arc::new(middleware));
    }

    /// Append an already shared middleware.
    pub fn push_shared(&mut self, middleware: Arc<dyn DynMiddleware>) {
        self.links.push(middleware);
    }

    /// Get the link at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn DynMiddleware> {
        self.links.get(index).map(|m| m.as_ref())
    }

    /// Get the number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Check if the stack has no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl FromIterator<Arc<dyn DynMiddleware>> for MiddlewareStack {
    fn from_iter<I: IntoIterator<Item = Arc<dyn DynMiddleware>>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Arc<dyn DynMiddleware>>> for MiddlewareStack {
    fn from(links: Vec<Arc<dyn DynMiddleware>>) -> Self {
        Self { links }
    }
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("len", &self.links.len())
            .finish()
    }
}
