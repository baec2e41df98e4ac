//! The bot: a client, a router and the long polling loop.
//!
//! Webhook serving lives in [`crate::webhook`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use maxbot_core::logger::{self, SharedLogger};
use maxbot_framework::{Context, HandlerResult, Middleware, Router};
use maxbot_transport::{Client, GetUpdatesOptions, sleep_or_cancel};

use crate::error::{RuntimeError, RuntimeResult};

pub const DEFAULT_POLL_LIMIT: i64 = 100;
pub const DEFAULT_POLL_TIMEOUT_SECS: i64 = 25;
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_millis(400);

/// Long polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingOptions {
    /// First offset to request.
    pub offset: i64,
    /// Maximum updates per request.
    pub limit: i64,
    /// Server-side long poll timeout in seconds.
    pub timeout_secs: i64,
    /// Pause after an empty batch.
    pub idle_delay: Duration,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_POLL_LIMIT,
            timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            idle_delay: DEFAULT_IDLE_DELAY,
        }
    }
}

/// A bot ready to acquire updates by long polling or webhook.
///
/// Register handlers first, then run one acquisition mode:
///
/// ```rust,ignore
/// let client = Client::new(ClientConfig::new(token, "https://platform-api.max.ru"))?;
/// let mut bot = Bot::new(client).with_logger(Arc::new(TracingLogger));
/// bot.on_command("start", |ctx| async move {
///     ctx.reply("hello").await?;
///     Ok(())
/// });
/// bot.run_polling(&cancel).await?;
/// ```
#[derive(Clone)]
pub struct Bot {
    pub(crate) client: Client,
    pub(crate) router: Arc<Router>,
    pub(crate) logger: SharedLogger,
    polling: PollingOptions,
}

impl Bot {
    /// Creates a bot with an empty router, default polling options and a
    /// logger that discards everything.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            router: Arc::new(Router::new()),
            logger: logger::nop(),
            polling: PollingOptions::default(),
        }
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Replaces the routing table.
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = Arc::new(router);
        self
    }

    /// Overrides the polling options. Only a non-negative offset and
    /// positive limit, timeout and idle delay replace the current values.
    pub fn with_polling(mut self, options: PollingOptions) -> Self {
        if options.offset >= 0 {
            self.polling.offset = options.offset;
        }
        if options.limit > 0 {
            self.polling.limit = options.limit;
        }
        if options.timeout_secs > 0 {
            self.polling.timeout_secs = options.timeout_secs;
        }
        if !options.idle_delay.is_zero() {
            self.polling.idle_delay = options.idle_delay;
        }
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Mutable access to the routing table.
    ///
    /// Clones the table if a running server still shares it; changes then
    /// apply to the next run only.
    pub fn router_mut(&mut self) -> &mut Router {
        Arc::make_mut(&mut self.router)
    }

    pub fn polling_options(&self) -> PollingOptions {
        self.polling
    }

    pub fn middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.router_mut().middleware(middleware);
        self
    }

    pub fn on_command<F, Fut>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.router_mut().on_command(name, handler);
        self
    }

    pub fn on_text<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.router_mut().on_text(handler);
        self
    }

    pub fn on_callback<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.router_mut().on_callback(handler);
        self
    }

    /// Fetches and dispatches updates until `cancel` fires or an error
    /// occurs.
    ///
    /// Updates of a batch are dispatched in order, one at a time. The offset
    /// only moves forward: it becomes `update_id + 1` (saturating) for every
    /// update whose id is at least the current offset. A failed fetch or a failed
    /// dispatch ends the loop with that error; cancellation ends it with
    /// [`RuntimeError::Cancelled`].
    pub async fn run_polling(&self, cancel: &CancellationToken) -> RuntimeResult<()> {
        let mut options = GetUpdatesOptions {
            offset: self.polling.offset,
            limit: self.polling.limit,
            timeout_secs: self.polling.timeout_secs,
        };
        self.logger.info(format_args!("long polling started"));

        loop {
            if cancel.is_cancelled() {
                self.logger
                    .info(format_args!("long polling stopped: context done"));
                return Err(RuntimeError::Cancelled);
            }

            let updates = match self.client.get_updates(&options, cancel).await {
                Ok(updates) => updates,
                Err(e) if e.is_cancelled() => {
                    self.logger
                        .info(format_args!("long polling stopped: context done"));
                    return Err(RuntimeError::Cancelled);
                }
                Err(e) => {
                    self.logger
                        .error(format_args!("long polling get updates failed: {e}"));
                    return Err(e.into());
                }
            };

            if updates.is_empty() {
                if sleep_or_cancel(self.polling.idle_delay, cancel).await.is_err() {
                    self.logger
                        .info(format_args!("long polling stopped: context done"));
                    return Err(RuntimeError::Cancelled);
                }
                continue;
            }

            self.logger.debug(format_args!(
                "long polling received {} updates",
                updates.len()
            ));
            for update in updates {
                if update.update_id >= options.offset {
                    options.offset = update.update_id.saturating_add(1);
                }
                if let Err(e) = self.router.dispatch(update, &self.client, cancel).await {
                    self.logger
                        .error(format_args!("long polling dispatch failed: {e}"));
                    return Err(RuntimeError::Dispatch(e));
                }
            }
        }
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("client", &self.client)
            .field("router", &self.router)
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use maxbot_core::Logger;
    use maxbot_transport::ClientConfig;
    use parking_lot::Mutex;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    pub(crate) struct Recorder(Mutex<Vec<String>>);

    impl Recorder {
        pub(crate) fn lines(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    impl Logger for Recorder {
        fn debug(&self, args: fmt::Arguments<'_>) {
            self.0.lock().push(format!("DEBUG {args}"));
        }
        fn info(&self, args: fmt::Arguments<'_>) {
            self.0.lock().push(format!("INFO {args}"));
        }
        fn error(&self, args: fmt::Arguments<'_>) {
            self.0.lock().push(format!("ERROR {args}"));
        }
    }

    pub(crate) fn client(base_url: &str) -> Client {
        Client::new(ClientConfig::new("token", base_url).without_rate_limit()).unwrap()
    }

    fn batch(ids: &[i64]) -> ResponseTemplate {
        let updates: Vec<_> = ids
            .iter()
            .map(|id| json!({"update_id": id, "message": {"chat": {"chat_id": 1}, "text": "hi"}}))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "updates": updates }))
    }

    fn query_of(request: &wiremock::Request) -> String {
        request.url.query().unwrap_or_default().to_string()
    }

    #[test]
    fn test_polling_overrides_only_positive_values() {
        let bot = Bot::new(client("http://127.0.0.1:9"));
        assert_eq!(bot.polling_options(), PollingOptions::default());

        let bot = bot.with_polling(PollingOptions {
            offset: -1,
            limit: 0,
            timeout_secs: 5,
            idle_delay: Duration::ZERO,
        });
        assert_eq!(
            bot.polling_options(),
            PollingOptions {
                offset: 0,
                limit: 100,
                timeout_secs: 5,
                idle_delay: Duration::from_millis(400),
            }
        );
    }

    #[tokio::test]
    async fn test_offset_advances_monotonically() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(batch(&[5, 3, 7]))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(ResponseTemplate::new(400).set_body_string("stop"))
            .mount(&server)
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bot = Bot::new(client(&server.uri()));
        let log = Arc::clone(&seen);
        bot.on_text(move |ctx| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(ctx.update().update_id);
                Ok(())
            }
        });

        let err = bot.run_polling(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Client(_)));
        assert_eq!(*seen.lock(), vec![5, 3, 7]);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(query_of(&requests[0]), "limit=100&timeout=25");
        assert_eq!(query_of(&requests[1]), "offset=8&limit=100&timeout=25");
    }

    #[tokio::test]
    async fn test_offset_saturates_at_max_update_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(batch(&[i64::MAX]))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(ResponseTemplate::new(400).set_body_string("stop"))
            .mount(&server)
            .await;

        let bot = Bot::new(client(&server.uri()));
        let err = bot.run_polling(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Client(_)));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            query_of(&requests[1]),
            format!("offset={}&limit=100&timeout=25", i64::MAX)
        );
    }

    #[tokio::test]
    async fn test_fetch_error_is_fatal_and_logged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad token"})))
            .expect(1)
            .mount(&server)
            .await;

        let recorder = Arc::new(Recorder::default());
        let bot = Bot::new(client(&server.uri())).with_logger(recorder.clone());

        let err = bot.run_polling(&CancellationToken::new()).await.unwrap_err();
        match err {
            RuntimeError::Client(e) => assert_eq!(e.as_api().map(|a| a.status), Some(401)),
            other => panic!("unexpected error: {other:?}"),
        }

        let lines = recorder.lines();
        assert_eq!(lines[0], "INFO long polling started");
        assert!(lines[1].starts_with("ERROR long polling get updates failed: "));
    }

    #[tokio::test]
    async fn test_dispatch_error_aborts_batch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(batch(&[1, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let recorder = Arc::new(Recorder::default());
        let mut bot = Bot::new(client(&server.uri())).with_logger(recorder.clone());
        bot.on_text(move |ctx| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if ctx.update().update_id == 2 {
                    return Err("handler failed".into());
                }
                Ok(())
            }
        });

        let err = bot.run_polling(&CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "dispatch failed: handler failed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(
            recorder
                .lines()
                .contains(&"ERROR long polling dispatch failed: handler failed".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let server = MockServer::start().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let recorder = Arc::new(Recorder::default());
        let bot = Bot::new(client(&server.uri())).with_logger(recorder.clone());
        let err = bot.run_polling(&cancel).await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(server.received_requests().await.unwrap().is_empty());
        assert_eq!(
            recorder.lines(),
            vec![
                "INFO long polling started",
                "INFO long polling stopped: context done"
            ]
        );
    }

    #[tokio::test]
    async fn test_idle_sleep_is_cancellable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(batch(&[]))
            .mount(&server)
            .await;

        let bot = Bot::new(client(&server.uri())).with_polling(PollingOptions {
            idle_delay: Duration::from_secs(30),
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = bot.run_polling(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_handler_can_stop_the_loop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updates"))
            .respond_with(batch(&[10]))
            .mount(&server)
            .await;

        let mut bot = Bot::new(client(&server.uri()));
        bot.on_text(|ctx| async move {
            ctx.cancellation().cancel();
            Ok(())
        });

        let err = bot.run_polling(&CancellationToken::new()).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
