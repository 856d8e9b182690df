//! # junction-std
//!
//! Standard implementations for the Junction JSON-RPC dispatch engine.
//!
//! This crate provides:
//! - **Registry**: [`ServiceRegistry`] holding services and the active middleware stack
//! - **Dispatch**: [`Dispatcher`], the per-call entry point
//! - **Standard middlewares**: Logging, Recover, Retry, Conditional, Timeout (feature `timeout`)
//! - **Testing utilities**: order markers, counters, recorders

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use junction_core;

// Modules
pub mod dispatch;
pub mod middleware;
pub mod registry;
pub mod testing;

pub use dispatch::Dispatcher;
pub use registry::{META_SERVICE, SERVICE_METHOD_SEPARATOR, Service, ServiceRegistry};
