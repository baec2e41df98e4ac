//! Unified error types for the maxbot client.
//!
//! Handler and runtime errors are defined in `maxbot-framework` and
//! `maxbot-runtime`.

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

// =============================================================================
// Structured API Errors
// =============================================================================

/// A failed HTTP response, classified into machine-inspectable fields.
///
/// Built once per failed attempt and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code.
    pub code: Option<String>,
    /// Human-readable message (`message`, or `error` when `message` is absent).
    pub message: Option<String>,
    /// Alternative human-readable description.
    pub description: Option<String>,
    /// Structured details object.
    pub details: Option<Map<String, Value>>,
    /// Raw response body, trimmed.
    pub body: String,
    /// Server-specified delay before the next attempt.
    pub retry_after: Option<Duration>,
}

impl ApiError {
    /// Returns `true` for statuses the transport retries: 429, 408 and 5xx.
    pub fn is_retryable(&self) -> bool {
        is_retryable_status(self.status)
    }

    /// Human-readable reason, falling back through message, description and
    /// raw body.
    pub fn reason(&self) -> &str {
        [
            self.message.as_deref(),
            self.description.as_deref(),
            Some(self.body.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("request failed")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => write!(
                f,
                "max api error: status={} code={} message={}",
                self.status,
                code,
                self.reason()
            ),
            None => write!(
                f,
                "max api error: status={} message={}",
                self.status,
                self.reason()
            ),
        }
    }
}

impl std::error::Error for ApiError {}

/// Returns `true` for statuses worth retrying: 429, 408 and 5xx.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status == 408 || status >= 500
}

// =============================================================================
// Client Errors
// =============================================================================

/// Errors returned by API client operations.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// A required configuration value is missing.
    #[error("{field} is required")]
    MissingConfig {
        /// The missing field.
        field: &'static str,
    },

    /// The request was rejected before reaching the network.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network-level failure (connect, timeout, broken body).
    #[error("request failed: {0}")]
    Transport(String),

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The API answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A request body could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
}

impl ClientError {
    /// Returns the structured API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
