//! Runtime error types.

use thiserror::Error;

use maxbot_core::ClientError;
use maxbot_framework::HandlerError;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that stop a polling loop, a webhook server or a runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    // ===== Lifecycle =====
    /// The cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    // ===== Update acquisition =====
    /// Fetching updates failed after the client's own retries.
    #[error("client error: {0}")]
    Client(ClientError),

    /// A handler or middleware returned an error.
    #[error("dispatch failed: {0}")]
    Dispatch(HandlerError),

    /// The webhook server could not bind or failed while serving.
    #[error("server error: {0}")]
    Server(String),

    // ===== Setup =====
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RuntimeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<ClientError> for RuntimeError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Cancelled => Self::Cancelled,
            other => Self::Client(other),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
