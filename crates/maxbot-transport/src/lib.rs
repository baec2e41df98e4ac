//! # maxbot transport
//!
//! Outbound side of the bot API:
//!
//! - [`HttpTransport`] executes an [`ApiRequest`] with rate limiting,
//!   bounded retries and exponential backoff
//! - [`classify`] turns a failed response into a structured
//!   [`ApiError`](maxbot_core::ApiError)
//! - [`Client`] exposes the typed operations (`get_updates`,
//!   `send_message`, `upload_media`, ...)
//!
//! Every operation takes a [`CancellationToken`](tokio_util::sync::CancellationToken);
//! rate-limit waits, in-flight sends and retry sleeps all abort when it fires.
//!
//! ```no_run
//! use maxbot_transport::{Client, ClientConfig};
//! use maxbot_core::SendMessageRequest;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> maxbot_core::ClientResult<()> {
//! let client = Client::new(ClientConfig::new("token", "https://botapi.example").with_max_retries(3))?;
//! client
//!     .send_message(&SendMessageRequest::new("42", "hello"), &CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod rate_limit;
pub mod transport;
pub mod wait;

pub use classify::{classify, parse_retry_after};
pub use client::{Client, DEFAULT_UPLOAD_CONTENT_TYPE, DEFAULT_UPLOAD_FILENAME, GetUpdatesOptions};
pub use config::{ClientConfig, RetryPolicy};
pub use rate_limit::RateLimiter;
pub use transport::{ApiRequest, HttpTransport, Method, RequestBody};
pub use wait::sleep_or_cancel;
