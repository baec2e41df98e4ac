//! Configuration types for the API client.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(250);
/// Default upper bound of the retry delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(3);
/// Default call-start rate.
pub const DEFAULT_RATE_LIMIT_RPS: i64 = 30;

// =============================================================================
// Client Config
// =============================================================================

/// Configuration for [`Client`](crate::Client) and
/// [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bot token, sent verbatim in the `Authorization` header.
    pub token: String,
    /// API base URL, e.g. `https://botapi.example`.
    pub base_url: String,
    /// Retries after the first attempt (`0` = single attempt).
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt. Zero selects the default.
    pub initial_backoff: Duration,
    /// Upper bound of the computed retry delay. Zero selects the default.
    pub max_backoff: Duration,
    /// Call starts per second; zero or negative disables rate limiting.
    pub rate_limit_rps: i64,
    /// Per-request timeout of the default HTTP client.
    pub timeout: Duration,
    /// Pre-built HTTP client; overrides `timeout` when set.
    pub http_client: Option<reqwest::Client>,
}

impl ClientConfig {
    /// Creates a config with the given credentials and default tuning.
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
            max_retries: 0,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            rate_limit_rps: DEFAULT_RATE_LIMIT_RPS,
            timeout: DEFAULT_TIMEOUT,
            http_client: None,
        }
    }

    /// Sets the number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial and maximum retry delay.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Sets the call-start rate; non-positive disables rate limiting.
    pub fn with_rate_limit(mut self, rate_per_second: i64) -> Self {
        self.rate_limit_rps = rate_per_second;
        self
    }

    /// Disables rate limiting.
    pub fn without_rate_limit(self) -> Self {
        self.with_rate_limit(0)
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses a pre-built HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Attempt budget and exponential backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Upper bound of the computed delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Builds the policy from a client config, substituting defaults for zero delays.
    pub fn from_config(config: &ClientConfig) -> Self {
        let or_default = |d: Duration, default: Duration| if d.is_zero() { default } else { d };
        Self {
            max_retries: config.max_retries,
            initial_backoff: or_default(config.initial_backoff, DEFAULT_INITIAL_BACKOFF),
            max_backoff: or_default(config.max_backoff, DEFAULT_MAX_BACKOFF),
        }
    }

    /// Total number of physical attempts.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay between attempt `attempt` (0-indexed) and the next one:
    /// `min(initial * 2^attempt, max)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.initial_backoff.checked_mul(factor))
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }
}
