//! # Chain Composition
//!
//! Composes a [`MiddlewareStack`] and a terminal [`Endpoint`] into a single
//! callable [`Chain`]:
//!
//! ```text
//! C = m1(ctx, method, args, next = m2(..., next = ... mn(..., next = T)))
//! ```
//!
//! The composition is index based: a [`Next`] is a cursor into a shared
//! snapshot of the stack. Running it invokes the link at its index with a
//! cursor to the following link, or the terminal once the links are
//! exhausted. Cursors hold no single-use state, so a link may run its `next`
//! any number of times and each run re-executes the whole remaining
//! sub-chain.

use crate::{
    callback::{Callback, Params},
    context::CallContext,
    middleware::MiddlewareStack,
    result::MethodResult,
};
use futures::future::BoxFuture;
use std::{fmt, future::Future, sync::Arc};

/// The terminal step of a chain: the actual handler invocation.
///
/// Implemented for [`Callback`] and for closures of shape
/// `Fn(CallContext, String, Params) -> impl Future<Output = MethodResult>`.
pub trait Endpoint: Send + Sync + 'static {
    /// Invoke the handler.
    fn invoke(&self, ctx: CallContext, method: String, args: Params) -> BoxFuture<'_, MethodResult>;
}

impl Endpoint for Callback {
    fn invoke(&self, ctx: CallContext, _method: String, args: Params) -> BoxFuture<'_, MethodResult> {
        Callback::invoke(self, ctx, args)
    }
}

impl<F, Fut> Endpoint for F
where
    F: Fn(CallContext, String, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MethodResult> + Send + 'static,
{
    fn invoke(&self, ctx: CallContext, method: String, args: Params) -> BoxFuture<'_, MethodResult> {
        Box::pin((self)(ctx, method, args))
    }
}

/// Continuation handed to each middleware link.
///
/// Cheap to clone. Running it consumes nothing, so it can be run repeatedly.
#[derive(Clone)]
pub struct Next {
    stack: Arc<MiddlewareStack>,
    index: usize,
    terminal: Arc<dyn Endpoint>,
}

impl Next {
    /// Run the rest of the chain.
    pub fn run(&self, ctx: CallContext, method: String, args: Params) -> BoxFuture<'_, MethodResult> {
        match self.stack.get(self.index) {
            Some(link) => {
                let next = Next {
                    stack: Arc::clone(&self.stack),
                    index: self.index + 1,
                    terminal: Arc::clone(&self.terminal),
                };
                link.handle_dyn(ctx, method, args, next)
            }
            None => self.terminal.invoke(ctx, method, args),
        }
    }

    /// Number of links still ahead of the terminal.
    pub fn remaining(&self) -> usize {
        self.stack.len().saturating_sub(self.index)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

/// A fully composed middleware chain ending in a terminal step.
///
/// With an empty stack, calling the chain is exactly calling the terminal.
///
/// # Example
/// ```ignore
/// let chain = Chain::new(registry.current_middlewares(), Arc::new(callback));
/// let result = chain.call(ctx, "test_echo".into(), vec![json!("hello")]).await;
/// ```
#[derive(Clone, Debug)]
pub struct Chain {
    head: Next,
}

impl Chain {
    /// Build a chain over `stack` with `terminal` innermost.
    ///
    /// The stack is shared, never copied or reordered; its first link is the
    /// outermost.
    pub fn new(stack: Arc<MiddlewareStack>, terminal: Arc<dyn Endpoint>) -> Self {
        Self {
            head: Next {
                stack,
                index: 0,
                terminal,
            },
        }
    }

    /// Execute the chain.
    pub fn call(&self, ctx: CallContext, method: String, args: Params) -> BoxFuture<'_, MethodResult> {
        self.head.run(ctx, method, args)
    }

    /// Number of middleware links in the chain.
    pub fn len(&self) -> usize {
        self.head.remaining()
    }

    /// Check if the chain has no middleware links.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
