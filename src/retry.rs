//! Exponential backoff for fallible async calls

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry schedule: `max_retries` extra attempts, the delay doubling after each one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    #[must_use]
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Delay before retry number `retry` (0-based)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Run `operation` until it succeeds or the retries are exhausted.
/// The last error is returned unchanged.
pub async fn with_backoff<T, E, F, Fut>(backoff: Backoff, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_backoff_when(backoff, operation, |_| true).await
}

/// Like [`with_backoff`], but only errors accepted by `retryable` are retried
pub async fn with_backoff_when<T, E, F, Fut, P>(
    backoff: Backoff,
    mut operation: F,
    retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retry < backoff.max_retries && retryable(&err) => {
                let delay = backoff.delay_for(retry);
                warn!(
                    "Retry {}/{} in {:.1}s: {}",
                    retry + 1,
                    backoff.max_retries,
                    delay.as_secs_f64(),
                    err
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
