//! Bounded retry with exponential backoff for read paths.

use std::future::Future;
use std::time::Duration;

use common::RemoteError;

/// Hard cap on the number of attempts any policy makes.
pub const MAX_ATTEMPTS: u32 = 3;

/// Retry policy for idempotent reads.
///
/// Only [`RemoteError::Transient`] failures are retried. Mutations never go
/// through a policy inside the engine; callers that want to repeat a failed
/// mutation wrap the engine call themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_retry()
    }
}

impl RetryPolicy {
    /// Creates a policy making at most `max_attempts` attempts, clamped to
    /// `1..=MAX_ATTEMPTS`.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS),
            base_delay,
        }
    }

    /// One attempt, no retry.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// One retry after a short pause. Used for cart fetches.
    pub fn single_retry() -> Self {
        Self::new(2, Duration::from_millis(200))
    }

    /// Returns the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the pause before attempt `attempt + 1` (1-based): the base
    /// delay doubled for every earlier retry.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(attempt, ?delay, error = %e, "retrying remote call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
