//! Retrying, rate-limited HTTP transport.
//!
//! Every physical attempt first passes the [`RateLimiter`]. Transport-level
//! failures and retryable statuses (429, 408, 5xx) are retried with
//! exponential backoff until the attempt budget is spent; a server-provided
//! `Retry-After` replaces the computed delay.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use reqwest::Method;

use maxbot_core::{ClientError, ClientResult};

use crate::classify::classify;
use crate::config::{ClientConfig, DEFAULT_TIMEOUT, RetryPolicy};
use crate::rate_limit::RateLimiter;
use crate::wait::sleep_or_cancel;

// =============================================================================
// Request Descriptor
// =============================================================================

/// Payload of an [`ApiRequest`].
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Raw bytes sent with the given `Content-Type`.
    Bytes { content_type: String, data: Vec<u8> },
    /// A single-file `multipart/form-data` upload. The form is rebuilt for
    /// every attempt.
    Multipart {
        field: String,
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

/// One logical API call, replayed verbatim on every attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, including any query string.
    pub path: String,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    /// A request without a body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// A request carrying `payload` encoded as JSON.
    pub fn json<T: Serialize>(
        method: Method,
        path: impl Into<String>,
        payload: &T,
    ) -> ClientResult<Self> {
        let body = serde_json::to_vec(payload).map_err(|e| ClientError::Encode(e.to_string()))?;
        Ok(Self::new(method, path).with_body(body, "application/json"))
    }

    /// Attaches a raw body and its content type.
    pub fn with_body(mut self, data: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Bytes {
            content_type: content_type.into(),
            data,
        });
        self
    }

    /// Attaches `data` as the file part `field` of a multipart form.
    pub fn with_file(
        mut self,
        field: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.body = Some(RequestBody::Multipart {
            field: field.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        });
        self
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Outcome of a single failed attempt.
enum AttemptError {
    /// Worth another attempt, optionally after a server-mandated delay.
    Retry {
        error: ClientError,
        retry_after: Option<Duration>,
    },
    /// Returned to the caller as is.
    Stop(ClientError),
}

/// HTTP transport shared by every operation of a [`Client`](crate::Client).
#[derive(Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    authorization: HeaderValue,
    policy: RetryPolicy,
    limiter: RateLimiter,
}

impl HttpTransport {
    /// Builds a transport from `config`.
    ///
    /// The token and base URL are trimmed and must not be empty; trailing
    /// slashes are stripped from the base URL.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let token = config.token.trim();
        if token.is_empty() {
            return Err(ClientError::MissingConfig { field: "token" });
        }
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ClientError::MissingConfig { field: "base_url" });
        }

        let mut authorization = HeaderValue::from_str(token).map_err(|_| {
            ClientError::InvalidRequest("token contains characters not allowed in a header".into())
        })?;
        authorization.set_sensitive(true);

        let http = match config.http_client.clone() {
            Some(client) => client,
            None => {
                let timeout = if config.timeout.is_zero() {
                    DEFAULT_TIMEOUT
                } else {
                    config.timeout
                };
                reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| ClientError::Transport(e.to_string()))?
            }
        };

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            authorization,
            policy: RetryPolicy::from_config(&config),
            limiter: RateLimiter::new(config.rate_limit_rps),
        })
    }

    /// Normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Effective retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Executes `request`, returning the raw body of the first response
    /// below 400.
    ///
    /// Cancellation is honoured while rate limited, while the request is in
    /// flight and between attempts.
    pub async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<u8>> {
        let url = format!("{}{}", self.base_url, request.path);
        let attempts = self.policy.attempts();
        let mut attempt: u32 = 0;

        loop {
            self.limiter.acquire(cancel).await?;
            debug!(
                method = %request.method,
                path = %request.path,
                attempt = attempt + 1,
                attempts,
                "Sending API request"
            );

            let (error, retry_after) = match self.attempt(request, &url, cancel).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::Stop(error)) => {
                    if !error.is_cancelled() {
                        warn!(method = %request.method, path = %request.path, error = %error, "API request failed");
                    }
                    return Err(error);
                }
                Err(AttemptError::Retry { error, retry_after }) => (error, retry_after),
            };

            if attempt + 1 >= attempts {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    attempts,
                    error = %error,
                    "API request failed after exhausting retries"
                );
                return Err(error);
            }

            let delay = retry_after.unwrap_or_else(|| self.policy.backoff(attempt));
            debug!(
                method = %request.method,
                path = %request.path,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying API request"
            );
            sleep_or_cancel(delay, cancel).await?;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, AttemptError> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(AUTHORIZATION, self.authorization.clone())
            .header(ACCEPT, "application/json");
        match &request.body {
            None => {}
            Some(RequestBody::Bytes { content_type, data }) => {
                if !content_type.trim().is_empty() {
                    builder = builder.header(CONTENT_TYPE, content_type.as_str());
                }
                builder = builder.body(data.clone());
            }
            Some(RequestBody::Multipart {
                field,
                filename,
                content_type,
                data,
            }) => {
                let part = Part::bytes(data.clone())
                    .file_name(filename.clone())
                    .mime_str(content_type)
                    .map_err(|e| {
                        AttemptError::Stop(ClientError::InvalidRequest(format!(
                            "invalid upload content type {content_type:?}: {e}"
                        )))
                    })?;
                builder = builder.multipart(Form::new().part(field.clone(), part));
            }
        }

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AttemptError::Stop(ClientError::Cancelled)),
            sent = builder.send() => sent,
        };
        let response = match sent {
            Ok(response) => response,
            Err(_) if cancel.is_cancelled() => {
                return Err(AttemptError::Stop(ClientError::Cancelled));
            }
            Err(e) => {
                return Err(AttemptError::Retry {
                    error: ClientError::Transport(e.to_string()),
                    retry_after: None,
                });
            }
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AttemptError::Stop(ClientError::Cancelled)),
            body = response.bytes() => body.map_err(|e| {
                AttemptError::Stop(ClientError::Transport(format!("read response: {e}")))
            })?,
        };

        if status < 400 {
            return Ok(body.to_vec());
        }

        let error = classify(status, retry_after.as_deref(), &body);
        if error.is_retryable() {
            Err(AttemptError::Retry {
                retry_after: error.retry_after,
                error: ClientError::Api(error),
            })
        } else {
            Err(AttemptError::Stop(ClientError::Api(error)))
        }
    }
}
