//! Config-driven bot runtime.
//!
//! ```rust,ignore
//! use maxbot_runtime::BotRuntime;
//!
//! // maxbot.toml in the current directory, MAXBOT_* overrides
//! let mut runtime = BotRuntime::builder().build()?;
//! runtime.bot_mut().on_command("ping", |ctx| async move {
//!     ctx.reply("pong").await?;
//!     Ok(())
//! });
//! runtime.run().await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use maxbot_core::TracingLogger;
use maxbot_transport::Client;

use crate::bot::Bot;
use crate::config::{ConfigLoader, MaxbotConfig, RunMode, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// A [`Bot`] together with the configuration it was built from.
#[derive(Debug)]
pub struct BotRuntime {
    config: MaxbotConfig,
    bot: Bot,
}

impl BotRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Validates `config`, installs the logging subscriber and builds the
    /// bot with a [`TracingLogger`].
    pub fn from_config(config: &MaxbotConfig) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        let client = Client::new(config.client.to_client_config())?;
        let bot = Bot::new(client)
            .with_logger(Arc::new(TracingLogger))
            .with_polling(config.polling.to_options());

        info!(
            mode = %config.mode,
            base_url = %config.client.base_url,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );
        Ok(Self {
            config: config.clone(),
            bot,
        })
    }

    pub fn config(&self) -> &MaxbotConfig {
        &self.config
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// The bot, for registering handlers and middlewares before running.
    pub fn bot_mut(&mut self) -> &mut Bot {
        &mut self.bot
    }

    /// Runs the configured mode until Ctrl+C or SIGTERM.
    ///
    /// A shutdown signal is a clean exit; any other error is returned.
    pub async fn run(&self) -> RuntimeResult<()> {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let watcher = tokio::spawn(async move {
            wait_for_shutdown().await;
            trigger.cancel();
        });

        let result = self.run_with(&cancel).await;
        watcher.abort();

        match result {
            Err(RuntimeError::Cancelled) if cancel.is_cancelled() => Ok(()),
            other => other,
        }
    }

    /// Runs the configured mode until `cancel` fires or an error occurs.
    ///
    /// Polling reports cancellation as [`RuntimeError::Cancelled`]; the
    /// webhook server returns `Ok` after a graceful shutdown.
    pub async fn run_with(&self, cancel: &CancellationToken) -> RuntimeResult<()> {
        info!(mode = %self.config.mode, "Starting bot");
        match self.config.mode {
            RunMode::Polling => self.bot.run_polling(cancel).await,
            RunMode::Webhook => {
                self.bot
                    .run_webhook(self.config.webhook.to_options(), cancel)
                    .await
            }
        }
    }
}

/// Waits for Ctrl+C, or SIGTERM on Unix.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Loads the configuration and builds a [`BotRuntime`].
#[derive(Debug, Clone, Default)]
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads exactly this file instead of searching.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a programmatic configuration over files and environment.
    pub fn merge(mut self, config: MaxbotConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> RuntimeResult<BotRuntime> {
        let config = self.config_loader.load()?;
        BotRuntime::from_config(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::ConfigError;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> MaxbotConfig {
        let mut config = MaxbotConfig::default();
        config.client.token = "token".into();
        config.client.base_url = base_url.into();
        config.client.rate_limit_rps = 0;
        config.polling.idle_delay_ms = 10;
        config
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let err = BotRuntime::from_config(&MaxbotConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_builder_merges_programmatic_config() {
        let runtime = BotRuntime::builder()
            .search_path("/nonexistent/maxbot-config-dir")
            .without_env()
            .merge(config("http://127.0.0.1:9"))
            .build()
            .unwrap();
        assert_eq!(runtime.config().client.token, "token");
        assert_eq!(runtime.bot().polling_options().idle_delay, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_run_with_polls_until_cancelled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "updates": [{"update_id": 1, "message": {"chat": {"chat_id": 9}, "text": "/stop"}}]
            })))
            .mount(&server)
            .await;

        let mut runtime = BotRuntime::from_config(&config(&server.uri())).unwrap();
        runtime.bot_mut().on_command("stop", |ctx| async move {
            ctx.cancellation().cancel();
            Ok(())
        });

        let cancel = CancellationToken::new();
        let err = runtime.run_with(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_with_webhook_mode() {
        let mut config = config("http://127.0.0.1:9");
        config.mode = RunMode::Webhook;
        config.webhook.addr = "127.0.0.1:0".into();
        let runtime = BotRuntime::from_config(&config).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(runtime.run_with(&cancel).await.is_ok());
    }
}
