//! Method results and handler output conversion.

use crate::error::{BoxError, RpcError};
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;

/// The outcome of one method invocation.
///
/// A result carries a value, an error, or neither (a handler returning
/// nothing). When both fields are set the error takes precedence for every
/// control decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodResult {
    /// The handler's primary return value.
    pub value: Option<Value>,
    /// The error outcome.
    pub error: Option<RpcError>,
}

impl MethodResult {
    /// A successful result.
    pub fn ok(value: Value) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    /// A failed result.
    pub fn err(error: RpcError) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }

    /// A result with neither value nor error.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this result represents a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Collapse into a `Result`, the error taking precedence.
    ///
    /// A missing value becomes JSON `null`.
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value.unwrap_or(Value::Null)),
        }
    }
}

impl From<RpcError> for MethodResult {
    fn from(err: RpcError) -> Self {
        MethodResult::err(err)
    }
}

impl From<Result<Value, RpcError>> for MethodResult {
    fn from(res: Result<Value, RpcError>) -> Self {
        match res {
            Ok(value) => MethodResult::ok(value),
            Err(err) => MethodResult::err(err),
        }
    }
}

fn encode<T: Serialize>(value: T) -> MethodResult {
    match serde_json::to_value(value) {
        Ok(value) => MethodResult::ok(value),
        Err(e) => MethodResult::err(RpcError::internal(format!("result encoding failed: {e}"))),
    }
}

/// Conversion from a handler's return type into a [`MethodResult`].
///
/// [`error_position`](Self::error_position) reports which return slot
/// carries the error, mirroring how the output is packaged.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from an RPC handler",
    label = "unsupported handler output",
    note = "Handlers return `Result<T, E>` with `T: Serialize`, `serde_json::Value`, or `()`."
)]
pub trait IntoMethodResult: Send + 'static {
    /// Index of the error slot, `None` for infallible outputs.
    fn error_position() -> Option<usize>;

    /// Package the output.
    fn into_method_result(self) -> MethodResult;
}

impl<T, E> IntoMethodResult for Result<T, E>
where
    T: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn error_position() -> Option<usize> {
        // `Result<(), E>` only has an error slot
        if TypeId::of::<T>() == TypeId::of::<()>() {
            Some(0)
        } else {
            Some(1)
        }
    }

    fn into_method_result(self) -> MethodResult {
        match self {
            Ok(value) => encode(value),
            Err(err) => MethodResult::err(RpcError::from_boxed(err.into())),
        }
    }
}

impl IntoMethodResult for Value {
    fn error_position() -> Option<usize> {
        None
    }

    fn into_method_result(self) -> MethodResult {
        MethodResult::ok(self)
    }
}

impl IntoMethodResult for () {
    fn error_position() -> Option<usize> {
        None
    }

    fn into_method_result(self) -> MethodResult {
        MethodResult::empty()
    }
}

impl IntoMethodResult for MethodResult {
    fn error_position() -> Option<usize> {
        None
    }

    fn into_method_result(self) -> MethodResult {
        self
    }
}
