//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ApiConfig, LogOutput, LoggingConfig, MaxbotConfig, PollingConfig, WebhookConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &MaxbotConfig) -> ConfigResult<()> {
    validate_client_config(&config.client)?;
    validate_polling_config(&config.polling)?;
    validate_webhook_config(&config.webhook)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_client_config(client: &ApiConfig) -> ConfigResult<()> {
    if client.token.trim().is_empty() {
        return Err(ConfigError::missing_field("client.token"));
    }
    validate_url(&client.base_url)?;

    // Zero falls back to the transport default, so only explicit values are compared.
    if client.initial_backoff_ms > 0
        && client.max_backoff_ms > 0
        && client.max_backoff_ms < client.initial_backoff_ms
    {
        return Err(ConfigError::validation(
            "client.max_backoff_ms must be greater than or equal to client.initial_backoff_ms",
        ));
    }
    Ok(())
}

fn validate_polling_config(polling: &PollingConfig) -> ConfigResult<()> {
    if polling.limit == 0 {
        return Err(ConfigError::validation("polling.limit must be greater than 0"));
    }
    if polling.offset < 0 {
        return Err(ConfigError::validation("polling.offset cannot be negative"));
    }
    Ok(())
}

fn validate_webhook_config(webhook: &WebhookConfig) -> ConfigResult<()> {
    if webhook.addr.trim().is_empty() {
        return Err(ConfigError::missing_field("webhook.addr"));
    }
    if webhook.path.trim().is_empty() {
        return Err(ConfigError::missing_field("webhook.path"));
    }
    if webhook.max_body_bytes == 0 {
        return Err(ConfigError::validation(
            "webhook.max_body_bytes must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ConfigError::missing_field("client.base_url"));
    }
    if !["http://", "https://"].iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::validation(format!(
            "client.base_url must start with http:// or https://, got {url}"
        )));
    }
    Ok(())
}
