//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, ThinkcapError};

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(duration: Duration, future: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ThinkcapError::Timeout(duration.as_millis() as u64)),
    }
}

/// Apply [`with_timeout`] only when a duration is configured.
pub async fn maybe_timeout<T>(
    duration: Option<Duration>,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match duration {
        Some(duration) => with_timeout(duration, future).await,
        None => future.await,
    }
}
