//! # maxbot core
//!
//! Shared building blocks of the maxbot workspace:
//!
//! - [`model`]: the wire data model (updates, messages, outbound requests)
//!   and the envelopes for responses that come in more than one shape
//! - [`error`]: [`ApiError`] (a classified failed response) and
//!   [`ClientError`] (everything an API call can fail with)
//! - [`logger`]: the [`Logger`] capability injected into bot runtimes
//!
//! ```text
//! ┌─────────────────────┐
//! │  maxbot-runtime     │  (polling, webhook, config)
//! ├─────────────────────┤
//! │  maxbot-framework   │  (router, middleware, context)
//! ├─────────────────────┤
//! │  maxbot-transport   │  (retrying HTTP client)
//! ├─────────────────────┤
//! │  maxbot-core        │  <- This crate
//! └─────────────────────┘
//! ```

pub mod error;
pub mod logger;
pub mod model;

pub use error::{ApiError, ClientError, ClientResult, is_retryable_status};
pub use logger::{Logger, NopLogger, SharedLogger, TracingLogger};
pub use model::*;
