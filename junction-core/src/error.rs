//! Error types for Junction.
//!
//! This module provides the error vocabulary shared by every crate:
//!
//! - [`RpcError`] - The JSON-RPC shaped error carried inside a [`MethodResult`]
//! - [`RegistryError`] - Errors raised while registering services
//! - [`BoxError`] - Boxed error accepted from handlers
//!
//! [`MethodResult`]: crate::MethodResult

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Standard and server-defined JSON-RPC error codes.
pub mod codes {
    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Internal JSON-RPC error.
    pub const INTERNAL: i32 = -32603;
    /// Generic application error returned by handlers.
    pub const DEFAULT: i32 = -32000;
    /// The call did not finish before its deadline.
    pub const TIMEOUT: i32 = -32002;
}

/// An error outcome of a method call.
///
/// Handlers, middlewares and the dispatcher all report failures through this
/// type. The transport layer encodes it into the wire-level error object.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct RpcError {
    code: i32,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl RpcError {
    /// Create an error with an explicit code.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the error.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Invalid parameters supplied for a call.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, message)
    }

    /// The requested method is not registered.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("the method {method} does not exist/is not available"),
        )
    }

    /// An internal fault while serving the call.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, message)
    }

    /// The call exceeded its time budget.
    pub fn timeout() -> Self {
        Self::new(codes::TIMEOUT, "request timed out")
    }

    /// Convert an arbitrary handler error.
    ///
    /// An `RpcError` inside the box is returned as is; anything else becomes a
    /// [`codes::DEFAULT`] error carrying the display text.
    pub fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<RpcError>() {
            Ok(rpc) => *rpc,
            Err(other) => Self::new(codes::DEFAULT, other.to_string()),
        }
    }

    /// The numeric error code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// The human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Optional structured error data.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl From<BoxError> for RpcError {
    fn from(err: BoxError) -> Self {
        RpcError::from_boxed(err)
    }
}

/// Errors that can occur while registering services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The service name was empty.
    #[error("no service name for type")]
    EmptyName,

    /// The service exposes no callable methods.
    #[error("service {0} doesn't have any suitable methods to expose")]
    NoMethods(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_boxed_keeps_rpc_error() {
        let original = RpcError::new(-1234, "custom").with_data(json!({"k": 1}));
        let boxed: BoxError = Box::new(original.clone());
        assert_eq!(RpcError::from_boxed(boxed), original);
    }

    #[test]
    fn test_from_boxed_wraps_foreign_error() {
        let boxed: BoxError = "disk on fire".into();
        let err = RpcError::from_boxed(boxed);
        assert_eq!(err.code(), codes::DEFAULT);
        assert_eq!(err.message(), "disk on fire");
        assert!(err.data().is_none());
    }

    #[test]
    fn test_method_not_found_message() {
        let err = RpcError::method_not_found("foo_bar");
        assert_eq!(err.code(), codes::METHOD_NOT_FOUND);
        assert_eq!(err.to_string(), "the method foo_bar does not exist/is not available");
    }

    #[test]
    fn test_serialize_skips_missing_data() {
        let value = serde_json::to_value(RpcError::timeout()).unwrap();
        assert_eq!(value, json!({"code": codes::TIMEOUT, "message": "request timed out"}));
    }
}
