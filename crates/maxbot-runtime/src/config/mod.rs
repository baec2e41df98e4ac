//! Configuration for bot runtimes.
//!
//! A [`MaxbotConfig`] is assembled by the [`ConfigLoader`] from built-in
//! defaults, an optional TOML or YAML file and `MAXBOT_*` environment
//! variables, then checked by [`validate_config`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    ApiConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, MaxbotConfig, PollingConfig,
    RunMode, WebhookConfig,
};
pub use validation::validate_config;
