//! Error types for the maxbot framework.
//!
//! Handler failures use the boxed [`HandlerError`](crate::HandlerError);
//! this module covers misconfiguration detected while building the
//! router.

use thiserror::Error;

/// Errors raised while assembling routers and middlewares.
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// Throttle settings are out of range.
    #[error("invalid throttle settings: {0}")]
    InvalidThrottle(&'static str),
}

/// Result type for framework setup operations.
pub type FrameworkResult<T> = Result<T, FrameworkError>;
