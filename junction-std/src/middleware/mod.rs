//! Standard middleware implementations.

pub mod conditional;
pub mod logging;
pub mod recover;
pub mod retry;
#[cfg(feature = "timeout")]
pub mod timeout;

pub use conditional::{ConditionalMiddleware, only_methods};
pub use logging::LoggingMiddleware;
pub use recover::RecoverMiddleware;
pub use retry::RetryMiddleware;
#[cfg(feature = "timeout")]
pub use timeout::TimeoutMiddleware;
