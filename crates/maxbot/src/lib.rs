//! # maxbot
//!
//! Bot framework for the MAX messenger Bot API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────┐     ┌────────────────────────┐
//! │ long polling │────▶│          │     │ middleware chain       │
//! │   or webhook │     │  Router  │────▶│   └─ command / text /  │──▶ Client ──▶ Bot API
//! └──────────────┘     │          │     │      callback handler  │
//!                      └──────────┘     └────────────────────────┘
//! ```
//!
//! - **Acquisition** ([`runtime`]): a long polling loop or a webhook server
//!   feeds updates to the router one at a time
//! - **Routing** ([`framework`]): at most one handler runs per update,
//!   wrapped in the registered middlewares
//! - **Client** ([`transport`]): a rate-limited HTTP client that retries
//!   transient failures and classifies API errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use maxbot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::new(
//!         std::env::var("MAX_TOKEN")?,
//!         "https://platform-api.max.ru",
//!     ))?;
//!
//!     let mut bot = Bot::new(client).with_logger(std::sync::Arc::new(TracingLogger));
//!     bot.middleware(throttle(5, std::time::Duration::from_secs(1))?)
//!         .on_command("start", |ctx| async move {
//!             ctx.reply("hello").await?;
//!             Ok(())
//!         })
//!         .on_text(|ctx| async move {
//!             ctx.reply(ctx.message_text()).await?;
//!             Ok(())
//!         });
//!
//!     let cancel = CancellationToken::new();
//!     bot.run_polling(&cancel).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use maxbot_core as core;
pub use maxbot_framework as framework;
pub use maxbot_runtime as runtime;
pub use maxbot_transport as transport;

/// Commonly used types for building bots.
///
/// ```rust,ignore
/// use maxbot::prelude::*;
/// ```
pub mod prelude {
    // Runtime
    pub use maxbot_runtime::{Bot, BotRuntime, PollingOptions, RuntimeError, WebhookOptions};

    // Routing and handlers
    pub use maxbot_framework::{
        Context, Handler, HandlerError, HandlerResult, Middleware, Next, Router, from_fn,
        handler_fn, throttle,
    };

    // Client
    pub use maxbot_transport::{Client, ClientConfig};

    // Data model and logging
    pub use maxbot_core::{
        ApiError, CallbackQuery, ClientError, Id, Logger, Message, SendMessageRequest,
        TracingLogger, Update,
    };

    pub use tokio_util::sync::CancellationToken;
}
