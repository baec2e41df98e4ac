//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use maxbot_transport::ClientConfig;

use crate::bot::PollingOptions;
use crate::webhook::WebhookOptions;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MaxbotConfig {
    /// API client settings.
    #[serde(default)]
    pub client: ApiConfig,

    /// Long polling settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Webhook server settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// How updates are acquired.
    #[serde(default)]
    pub mode: RunMode,
}

/// Update acquisition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Polling,
    Webhook,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling => f.write_str("polling"),
            Self::Webhook => f.write_str("webhook"),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// API client settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bot access token, sent as the `Authorization` header.
    #[serde(default)]
    pub token: String,

    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Retries after the first attempt.
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Requests per second; zero or negative disables limiting.
    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: i64,

    /// Per-attempt HTTP timeout.
    #[serde(default = "default_client_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: default_base_url(),
            max_retries: 0,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            rate_limit_rps: default_rate_limit_rps(),
            timeout_secs: default_client_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Converts to the transport client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig::new(self.token.clone(), self.base_url.clone())
            .with_max_retries(self.max_retries)
            .with_backoff(
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
            .with_rate_limit(self.rate_limit_rps)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://platform-api.max.ru".to_string()
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    3000
}

fn default_rate_limit_rps() -> i64 {
    30
}

fn default_client_timeout_secs() -> u64 {
    30
}

// =============================================================================
// Polling
// =============================================================================

/// Long polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// First offset to request.
    #[serde(default)]
    pub offset: i64,

    /// Maximum updates per request.
    #[serde(default = "default_polling_limit")]
    pub limit: u32,

    /// Server-side long poll timeout.
    #[serde(default = "default_polling_timeout_secs")]
    pub timeout_secs: u32,

    /// Pause after an empty batch.
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_polling_limit(),
            timeout_secs: default_polling_timeout_secs(),
            idle_delay_ms: default_idle_delay_ms(),
        }
    }
}

impl PollingConfig {
    pub fn to_options(&self) -> PollingOptions {
        PollingOptions {
            offset: self.offset,
            limit: i64::from(self.limit),
            timeout_secs: i64::from(self.timeout_secs),
            idle_delay: Duration::from_millis(self.idle_delay_ms),
        }
    }
}

fn default_polling_limit() -> u32 {
    100
}

fn default_polling_timeout_secs() -> u32 {
    25
}

fn default_idle_delay_ms() -> u64 {
    400
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Listen address.
    #[serde(default = "default_webhook_addr")]
    pub addr: String,

    /// Route the updates are posted to.
    #[serde(default = "default_webhook_path")]
    pub path: String,

    /// Grace period for in-flight requests after shutdown starts.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            addr: default_webhook_addr(),
            path: default_webhook_path(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl WebhookConfig {
    pub fn to_options(&self) -> WebhookOptions {
        WebhookOptions {
            addr: self.addr.clone(),
            path: self.path.clone(),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

fn default_webhook_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

fn default_max_body_bytes() -> usize {
    1 << 20
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required for [`LogOutput::File`].
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-target levels, e.g. `maxbot_transport = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            filters: HashMap::new(),
            thread_ids: false,
            file_location: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON; needs the `json-log` feature.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}
