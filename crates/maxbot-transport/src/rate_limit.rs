//! Minimum-interval pacing of outbound calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use maxbot_core::ClientResult;

use crate::wait::sleep_or_cancel;

/// Enforces a fixed minimum interval between the starts of successive calls.
///
/// One instance is shared by every caller of a client. The wait happens
/// while holding the lock, so concurrent callers are serialized; lock
/// acquisition order is not guaranteed to be fair.
#[derive(Debug)]
pub struct RateLimiter {
    /// `None` when the limiter is disabled.
    interval: Option<Duration>,
    /// Start time of the most recent call.
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `rate_per_second` call starts per second.
    ///
    /// A non-positive rate disables the limiter.
    pub fn new(rate_per_second: i64) -> Self {
        let rate = u32::try_from(rate_per_second.max(0)).unwrap_or(u32::MAX);
        let interval = (rate > 0)
            .then(|| (Duration::from_secs(1) / rate).max(Duration::from_nanos(1)));
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Creates a pass-through limiter.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Returns the enforced interval, or `None` when disabled.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Waits until the next call may start.
    ///
    /// The first call proceeds immediately. Returns
    /// [`ClientError::Cancelled`](maxbot_core::ClientError::Cancelled) if
    /// `cancel` fires while waiting.
    pub async fn acquire(&self, cancel: &CancellationToken) -> ClientResult<()> {
        let Some(interval) = self.interval else {
            return Ok(());
        };

        let mut last = self.last.lock().await;
        let now = Instant::now();
        let Some(previous) = *last else {
            *last = Some(now);
            return Ok(());
        };

        let earliest = previous + interval;
        if earliest <= now {
            *last = Some(now);
            return Ok(());
        }

        let wait = earliest - now;
        trace!(wait_ms = wait.as_millis() as u64, "Rate limiter waiting");
        sleep_or_cancel(wait, cancel).await?;
        *last = Some(Instant::now());
        Ok(())
    }
}
