//! # maxbot runtime
//!
//! Update acquisition and process-level plumbing:
//!
//! - [`Bot`]: a client plus a router, fed by long polling
//!   ([`Bot::run_polling`]) or a webhook server ([`Bot::run_webhook`])
//! - [`config`]: layered configuration (defaults, TOML/YAML file,
//!   `MAXBOT_*` environment variables) and validation
//! - [`logging`]: `tracing-subscriber` setup driven by the configuration
//! - [`BotRuntime`]: builds a bot from configuration and runs the
//!   configured mode until Ctrl+C
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log lines
//!
//! ```rust,ignore
//! use maxbot_runtime::{Bot, BotRuntime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = BotRuntime::builder().build()?;
//!     runtime.bot_mut().on_text(|ctx| async move {
//!         ctx.reply(ctx.message_text()).await?;
//!         Ok(())
//!     });
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod webhook;

pub use bot::{Bot, PollingOptions};
pub use config::{ConfigError, ConfigLoader, ConfigResult, MaxbotConfig, RunMode};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{BotRuntime, RuntimeBuilder};
pub use webhook::WebhookOptions;
