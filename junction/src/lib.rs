//! # junction - JSON-RPC Method Dispatch with Middleware
//!
//! `junction` runs registered RPC methods through a configurable chain of
//! middlewares. Each middleware sees the call context, the method name and the
//! arguments, and decides whether and how to continue.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use junction::prelude::*;
//! use junction::middleware::LoggingMiddleware;
//!
//! let server = Server::builder()
//!     .service(
//!         "test",
//!         Service::new().method(
//!             "echo",
//!             Callback::with_context(|_ctx: CallContext, s: String| async move {
//!                 Ok::<_, RpcError>(s)
//!             }),
//!         ),
//!     )
//!     .middleware(LoggingMiddleware::new())
//!     .build()?;
//!
//! let result = server
//!     .call(CallContext::background(), "test_echo", vec![json!("hello")])
//!     .await;
//! ```
//!
//! ## Execution Order
//!
//! Middlewares `[A, B, C]` around handler `T` run as
//! `A-before, B-before, C-before, T, C-after, B-after, A-after`. A middleware
//! that returns without calling `next` short-circuits the rest.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod server;

pub use junction_core::{
    // Callbacks
    ArgType,
    // Errors
    BoxError,
    CallContext,
    Callback,
    // Chain
    Chain,
    ContextHandler,
    DynMiddleware,
    Endpoint,
    Handler,
    IntoMethodResult,
    // Results
    MethodResult,
    // Middleware
    Middleware,
    MiddlewareStack,
    Next,
    Params,
    PeerInfo,
    RegistryError,
    RpcError,
    codes,
};

// Registry and dispatch
pub use junction_std::{
    Dispatcher, META_SERVICE, SERVICE_METHOD_SEPARATOR, Service, ServiceRegistry,
};

pub use server::{Server, ServerBuilder};

/// Standard middleware implementations.
pub mod middleware {
    #![allow(clippy::wildcard_imports)]
    pub use junction_std::middleware::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use junction_std::testing::*;
}

/// Prelude module - common imports for Junction.
///
/// # Usage
///
/// ```rust,ignore
/// use junction::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CallContext, Callback, MethodResult, Middleware, MiddlewareStack, Next, Params, RpcError,
        Server, Service,
    };
}
