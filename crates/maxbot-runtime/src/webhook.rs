//! Webhook update acquisition over axum.
//!
//! The endpoint accepts `POST` requests carrying one JSON update each and
//! dispatches it before responding:
//!
//! | Outcome                               | Status |
//! |---------------------------------------|--------|
//! | not `POST`                            | 405    |
//! | unreadable, oversized or invalid body | 400    |
//! | handler error                         | 500    |
//! | dispatched, or no handler matched     | 200 `{"ok":true}` |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use maxbot_core::{SharedLogger, Update};
use maxbot_framework::Router;
use maxbot_transport::Client;

use crate::bot::Bot;
use crate::error::{RuntimeError, RuntimeResult};

pub const DEFAULT_WEBHOOK_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_BODY_BYTES: usize = 1 << 20;

/// Webhook server settings. Empty or zero fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOptions {
    /// Listen address, `host:port`.
    pub addr: String,
    /// Route path; a leading `/` is added when missing.
    pub path: String,
    /// Grace period for in-flight requests once shutdown starts.
    pub shutdown_timeout: Duration,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for WebhookOptions {
    fn default() -> Self {
        Self {
            addr: DEFAULT_WEBHOOK_ADDR.to_string(),
            path: DEFAULT_WEBHOOK_PATH.to_string(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl WebhookOptions {
    pub fn new(addr: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Fills empty fields with defaults and normalizes the path.
    pub fn normalized(mut self) -> Self {
        if self.addr.trim().is_empty() {
            self.addr = DEFAULT_WEBHOOK_ADDR.to_string();
        }
        self.path = normalize_path(&self.path);
        if self.shutdown_timeout.is_zero() {
            self.shutdown_timeout = DEFAULT_SHUTDOWN_TIMEOUT;
        }
        if self.max_body_bytes == 0 {
            self.max_body_bytes = DEFAULT_MAX_BODY_BYTES;
        }
        self
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        DEFAULT_WEBHOOK_PATH.to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

struct WebhookState {
    router: Arc<Router>,
    client: Client,
    logger: SharedLogger,
    max_body_bytes: usize,
    cancel: CancellationToken,
}

impl Bot {
    /// Builds the webhook endpoint at `path` for embedding in another axum
    /// application. Requests are dispatched under a token that never fires.
    pub fn webhook_router(&self, path: &str) -> axum::Router {
        self.webhook_router_with(
            &WebhookOptions {
                path: path.to_string(),
                ..Default::default()
            },
            CancellationToken::new(),
        )
    }

    /// Builds the webhook endpoint described by `options`. Handlers see a
    /// child of `cancel` for each request.
    pub fn webhook_router_with(
        &self,
        options: &WebhookOptions,
        cancel: CancellationToken,
    ) -> axum::Router {
        let options = options.clone().normalized();
        let state = Arc::new(WebhookState {
            router: Arc::clone(&self.router),
            client: self.client.clone(),
            logger: Arc::clone(&self.logger),
            max_body_bytes: options.max_body_bytes,
            cancel,
        });
        axum::Router::new()
            .route(&options.path, any(handle_update))
            .with_state(state)
    }

    /// Serves the webhook endpoint until `cancel` fires.
    ///
    /// On cancellation the listener stops accepting connections and
    /// in-flight requests get `shutdown_timeout` to finish; after that the
    /// server is dropped. Returns `Ok` on shutdown and
    /// [`RuntimeError::Server`] when binding or serving fails.
    pub async fn run_webhook(
        &self,
        options: WebhookOptions,
        cancel: &CancellationToken,
    ) -> RuntimeResult<()> {
        let options = options.normalized();
        let listener = TcpListener::bind(&options.addr).await.map_err(|e| {
            self.logger.error(format_args!("webhook server failed: {e}"));
            RuntimeError::Server(format!("bind {}: {e}", options.addr))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| RuntimeError::Server(e.to_string()))?;
        self.serve_webhook(listener, local_addr, &options, cancel)
            .await
    }

    async fn serve_webhook(
        &self,
        listener: TcpListener,
        local_addr: SocketAddr,
        options: &WebhookOptions,
        cancel: &CancellationToken,
    ) -> RuntimeResult<()> {
        let app = self.webhook_router_with(options, cancel.child_token());
        self.logger.info(format_args!(
            "webhook server listening on {local_addr}{}",
            options.path
        ));

        let shutdown = cancel.clone();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {}
            result = &mut server => {
                return match result {
                    Ok(()) => {
                        self.logger.info(format_args!("webhook server stopped"));
                        Ok(())
                    }
                    Err(e) => {
                        self.logger.error(format_args!("webhook server failed: {e}"));
                        Err(RuntimeError::Server(e.to_string()))
                    }
                };
            }
        }

        self.logger.info(format_args!("webhook shutdown started"));
        match tokio::time::timeout(options.shutdown_timeout, server).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.logger.error(format_args!("webhook server failed: {e}"));
                return Err(RuntimeError::Server(e.to_string()));
            }
            Err(_) => warn!(
                timeout_ms = options.shutdown_timeout.as_millis() as u64,
                "Webhook grace period elapsed, dropping in-flight requests"
            ),
        }
        self.logger.info(format_args!("webhook server stopped"));
        Ok(())
    }
}

async fn handle_update(
    State(state): State<Arc<WebhookState>>,
    method: Method,
    body: Body,
) -> Response {
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into_response();
    }

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            state
                .logger
                .error(format_args!("webhook invalid payload: {e}"));
            return (StatusCode::BAD_REQUEST, "invalid update payload").into_response();
        }
    };
    let update: Update = match serde_json::from_slice(&bytes) {
        Ok(update) => update,
        Err(e) => {
            state
                .logger
                .error(format_args!("webhook invalid payload: {e}"));
            return (StatusCode::BAD_REQUEST, "invalid update payload").into_response();
        }
    };

    let update_id = update.update_id;
    let cancel = state.cancel.child_token();
    if let Err(e) = state.router.dispatch(update, &state.client, &cancel).await {
        state
            .logger
            .error(format_args!("webhook dispatch failed: {e}"));
        return (StatusCode::INTERNAL_SERVER_ERROR, "failed to dispatch update").into_response();
    }

    debug!(update_id, "Webhook update dispatched");
    Json(json!({ "ok": true })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::{Request, header};
    use tower::ServiceExt;

    use crate::bot::tests::{Recorder, client};

    fn bot() -> Bot {
        Bot::new(client("http://127.0.0.1:9"))
    }

    async fn send(
        app: axum::Router,
        method: Method,
        body: &str,
    ) -> (StatusCode, String, Option<String>) {
        let request = Request::builder()
            .method(method)
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), content_type)
    }

    #[test]
    fn test_options_normalization() {
        let options = WebhookOptions {
            addr: " ".into(),
            path: "hook".into(),
            shutdown_timeout: Duration::ZERO,
            max_body_bytes: 0,
        }
        .normalized();
        assert_eq!(options.addr, "0.0.0.0:8080");
        assert_eq!(options.path, "/hook");
        assert_eq!(options, WebhookOptions::new("", "/hook").normalized());

        assert_eq!(WebhookOptions::new("", "").normalized().path, "/webhook");
    }

    #[tokio::test]
    async fn test_non_post_is_405() {
        let (status, body, _) = send(bot().webhook_router("/webhook"), Method::GET, "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, "method not allowed");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_400() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let recorder = Arc::new(Recorder::default());
        let mut bot = bot().with_logger(recorder.clone());
        bot.on_text(move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let app = bot.webhook_router("webhook");
        let (status, body, _) = send(app, Method::POST, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "invalid update payload");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(recorder.lines()[0].starts_with("ERROR webhook invalid payload: "));
    }

    #[tokio::test]
    async fn test_oversized_body_is_400() {
        let app = bot().webhook_router_with(
            &WebhookOptions {
                max_body_bytes: 16,
                ..Default::default()
            },
            CancellationToken::new(),
        );
        let payload = format!(r#"{{"update_id":1,"message":{{"text":"{}"}}}}"#, "x".repeat(64));
        let (status, _, _) = send(app, Method::POST, &payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_handler_error_is_500() {
        let mut bot = bot();
        bot.on_command("fail", |_| async { Err("nope".into()) });

        let payload = r#"{"update_id":3,"message":{"chat":{"chat_id":1},"text":"/fail"}}"#;
        let (status, body, _) = send(bot.webhook_router("/webhook"), Method::POST, payload).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "failed to dispatch update");
    }

    #[tokio::test]
    async fn test_dispatch_success_and_unhandled_are_200() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut bot = bot();
        bot.on_callback(move |ctx| {
            let counter = Arc::clone(&counter);
            async move {
                assert_eq!(ctx.callback_data(), "yes");
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let app = bot.webhook_router("/webhook");

        let callback = r#"{"update_id":4,"callback_query":{"callback_id":"c1","data":"yes"}}"#;
        let (status, body, content_type) = send(app.clone(), Method::POST, callback).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let text = r#"{"update_id":5,"message":{"text":"nobody listens"}}"#;
        let (status, body, _) = send(app, Method::POST, text).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_run_webhook_shuts_down_on_cancel() {
        let recorder = Arc::new(Recorder::default());
        let bot = bot().with_logger(recorder.clone());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let options = WebhookOptions {
            shutdown_timeout: Duration::from_secs(1),
            ..WebhookOptions::new("127.0.0.1:0", "/hook")
        };
        bot.run_webhook(options, &cancel).await.unwrap();

        let lines = recorder.lines();
        assert!(lines[0].starts_with("INFO webhook server listening on 127.0.0.1:"));
        assert!(lines[0].ends_with("/hook"));
        assert_eq!(lines[1], "INFO webhook shutdown started");
        assert_eq!(lines[2], "INFO webhook server stopped");
    }

    #[tokio::test]
    async fn test_grace_period_bounds_in_flight_requests() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;

        let entered = CancellationToken::new();
        let signal = entered.clone();
        let recorder = Arc::new(Recorder::default());
        let mut bot = bot().with_logger(recorder.clone());
        bot.on_text(move |_| {
            let signal = signal.clone();
            async move {
                signal.cancel();
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let options = WebhookOptions {
            shutdown_timeout: Duration::from_millis(300),
            ..WebhookOptions::new(addr.to_string(), "/hook")
        }
        .normalized();

        let in_flight = tokio::spawn(async move {
            let body = r#"{"update_id":1,"message":{"chat":{"chat_id":1},"text":"slow"}}"#;
            let request = format!(
                "POST /hook HTTP/1.1\r\nhost: {addr}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
                body.len()
            );
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(request.as_bytes()).await.unwrap();
            let mut response = Vec::new();
            let _ = stream.read_to_end(&mut response).await;
        });

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let handler_entered = entered.clone();
        tokio::spawn(async move {
            handler_entered.cancelled().await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            bot.serve_webhook(listener, addr, &options, &cancel),
        )
        .await
        .expect("server outlived its grace period");
        assert!(result.is_ok());
        assert!(entered.is_cancelled());
        in_flight.abort();

        let lines = recorder.lines();
        assert!(lines.contains(&"INFO webhook shutdown started".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("INFO webhook server stopped"));
    }

    #[tokio::test]
    async fn test_run_webhook_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let err = bot()
            .run_webhook(WebhookOptions::new(addr, "/"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Server(_)));
    }
}
