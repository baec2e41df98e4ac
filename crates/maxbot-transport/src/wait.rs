//! Cancellable waiting.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use maxbot_core::{ClientError, ClientResult};

/// Sleeps for `duration` unless `cancel` fires first.
///
/// A zero duration returns immediately without checking the token.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> ClientResult<()> {
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ClientError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}
