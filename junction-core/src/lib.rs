//! # junction-core
//!
//! Core traits and data types for the Junction JSON-RPC dispatch engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! middleware authors and transports that don't need the registry or the
//! standard middlewares from `junction-std`.
//!
//! # Building Blocks
//!
//! ## Callback Descriptor ([`Callback`])
//!
//! The resolved form of one registered method: a type-erased async function,
//! its declared argument types, whether it takes the [`CallContext`], and where
//! its error outcome sits. Argument values are converted at call time.
//!
//! ## Method Result ([`MethodResult`])
//!
//! The value/error outcome of a call. Errors are ordinary data flowing back
//! up the chain, not control flow.
//!
//! ## Middleware Link ([`Middleware`])
//!
//! An interceptor receiving `(ctx, method, args, next)`. Stateful structs and
//! async closures both qualify.
//!
//! ## Chain ([`Chain`])
//!
//! A [`MiddlewareStack`] composed around a terminal [`Endpoint`]. "Before"
//! logic runs in stack order, "after" logic in reverse.
//!
//! # Error Types
//!
//! - [`RpcError`] - Error outcome of a call
//! - [`RegistryError`] - Service registration errors
//! - [`BoxError`] - Boxed error accepted from handlers

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod callback;
mod chain;
mod context;
mod error;
mod middleware;
mod result;

// Re-exports
pub use callback::{ArgType, Callback, ContextHandler, Handler, Params};
pub use chain::{Chain, Endpoint, Next};
pub use context::{CallContext, PeerInfo};
pub use error::{BoxError, RegistryError, RpcError, codes};
pub use middleware::{DynMiddleware, Middleware, MiddlewareStack};
pub use result::{IntoMethodResult, MethodResult};
