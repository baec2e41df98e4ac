//! Per-key fixed-window throttling.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::context::Context;
use crate::error::{FrameworkError, FrameworkResult};
use crate::handler::{Handler, HandlerResult, Middleware};

/// Expired buckets are swept once the table grows past this size.
const SWEEP_THRESHOLD: usize = 1024;

type KeyFn = Arc<dyn Fn(&Context) -> String + Send + Sync>;
type LimitedFn = Arc<dyn Fn(Context, Duration) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Configuration of [`throttle_with`].
#[derive(Clone)]
pub struct ThrottleOptions {
    /// Updates allowed per key within one window.
    pub limit: u32,
    /// Window length.
    pub interval: Duration,
    key: Option<KeyFn>,
    on_limited: Option<LimitedFn>,
}

impl ThrottleOptions {
    pub fn new(limit: u32, interval: Duration) -> Self {
        Self {
            limit,
            interval,
            key: None,
            on_limited: None,
        }
    }

    /// Buckets updates by a custom key instead of the chat id.
    pub fn key<F>(mut self, key: F) -> Self
    where
        F: Fn(&Context) -> String + Send + Sync + 'static,
    {
        self.key = Some(Arc::new(key));
        self
    }

    /// Runs `f` for each dropped update with the time left in the window.
    pub fn on_limited<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context, Duration) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on_limited = Some(Arc::new(move |ctx, retry_in| f(ctx, retry_in).boxed()));
        self
    }
}

impl std::fmt::Debug for ThrottleOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottleOptions")
            .field("limit", &self.limit)
            .field("interval", &self.interval)
            .field("custom_key", &self.key.is_some())
            .field("on_limited", &self.on_limited.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

/// Allows at most `limit` updates per chat within each `interval` window and
/// silently drops the rest.
///
/// Updates without a known chat share the `"global"` bucket.
pub fn throttle(limit: u32, interval: Duration) -> FrameworkResult<Middleware> {
    throttle_with(ThrottleOptions::new(limit, interval))
}

/// [`throttle`] with a custom key and drop callback.
pub fn throttle_with(options: ThrottleOptions) -> FrameworkResult<Middleware> {
    if options.limit == 0 {
        return Err(FrameworkError::InvalidThrottle("limit must be > 0"));
    }
    if options.interval.is_zero() {
        return Err(FrameworkError::InvalidThrottle("interval must be > 0"));
    }

    let key: KeyFn = options.key.clone().unwrap_or_else(|| {
        Arc::new(|ctx: &Context| {
            let chat = ctx.chat_id();
            if chat.is_empty() {
                "global".to_string()
            } else {
                chat.into_inner()
            }
        })
    });
    let buckets: Arc<Mutex<HashMap<String, Bucket>>> = Arc::default();
    let limit = options.limit;
    let interval = options.interval;
    let on_limited = options.on_limited;

    Ok(Arc::new(move |next: Handler| -> Handler {
        let key = Arc::clone(&key);
        let buckets = Arc::clone(&buckets);
        let on_limited = on_limited.clone();
        Arc::new(move |ctx: Context| {
            let bucket_key = key(&ctx);
            let admitted = admit(&buckets, &bucket_key, limit, interval);
            match admitted {
                Ok(()) => next(ctx),
                Err(retry_in) => {
                    debug!(
                        key = %bucket_key,
                        retry_in_ms = retry_in.as_millis() as u64,
                        "Throttled update dropped"
                    );
                    match &on_limited {
                        Some(callback) => callback(ctx, retry_in),
                        None => futures::future::ready(Ok(())).boxed(),
                    }
                }
            }
        })
    }))
}

/// Counts one update against `key`, or returns the time left in the window
/// when the bucket is full.
fn admit(
    buckets: &Mutex<HashMap<String, Bucket>>,
    key: &str,
    limit: u32,
    interval: Duration,
) -> Result<(), Duration> {
    let now = Instant::now();
    let mut buckets = buckets.lock();

    if let Some(bucket) = buckets.get_mut(key)
        && bucket.reset_at > now
    {
        if bucket.count < limit {
            bucket.count += 1;
            return Ok(());
        }
        return Err(bucket.reset_at - now);
    }

    if buckets.len() >= SWEEP_THRESHOLD {
        buckets.retain(|_, bucket| bucket.reset_at > now);
    }
    buckets.insert(
        key.to_string(),
        Bucket {
            count: 1,
            reset_at: now + interval,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use maxbot_core::{Message, Update};
    use maxbot_transport::{Client, ClientConfig};
    use tokio_util::sync::CancellationToken;

    use crate::handler::{chain, handler_fn};

    fn context(chat: &str) -> Context {
        let client = Client::new(ClientConfig::new("t", "http://127.0.0.1:9")).unwrap();
        let update = Update::message(1, Message::text(chat, "hi"));
        Context::new(update, client, CancellationToken::new())
    }

    fn counted(middleware: Middleware, counter: &Arc<AtomicUsize>) -> Handler {
        let counter = Arc::clone(counter);
        let handler = handler_fn(move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        chain(&[middleware], Some(handler))
    }

    #[test]
    fn test_rejects_non_positive_settings() {
        assert!(throttle(0, Duration::from_secs(1)).is_err());
        assert!(throttle(1, Duration::ZERO).is_err());
        assert!(throttle(1, Duration::from_millis(1)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drops_updates_over_limit_per_chat() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = counted(throttle(2, Duration::from_secs(1)).unwrap(), &counter);

        for _ in 0..5 {
            handler(context("a")).await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        handler(context("b")).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        tokio::time::advance(Duration::from_secs(1)).await;
        handler(context("a")).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_key_and_limited_callback() {
        let counter = Arc::new(AtomicUsize::new(0));
        let limited = Arc::new(AtomicUsize::new(0));
        let limited_hits = Arc::clone(&limited);

        let options = ThrottleOptions::new(1, Duration::from_secs(10))
            .key(|_| "everyone".to_string())
            .on_limited(move |_, retry_in| {
                let limited = Arc::clone(&limited_hits);
                async move {
                    assert!(retry_in <= Duration::from_secs(10));
                    limited.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        let handler = counted(throttle_with(options).unwrap(), &counter);

        handler(context("a")).await.unwrap();
        handler(context("b")).await.unwrap();
        handler(context("c")).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(limited.load(Ordering::SeqCst), 2);
    }
}
