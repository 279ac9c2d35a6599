//! Bounded retry with full jitter for transient ClickUp failures.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::warn;

use crate::error::{ClickUpError, ClickUpResult};

/// Retry policy for outbound ClickUp calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff ceiling for the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff ceiling before retry number `attempt` (1-based), exponential and capped.
    #[must_use]
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Full-jitter delay: uniform in `[0, ceiling]`.
    fn jittered(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        if ceiling.is_zero() {
            return ceiling;
        }
        let millis = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// A `RateLimited` error waits at least the server-provided interval
    /// (capped by `max_delay`).
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> ClickUpResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClickUpResult<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_transient() => {
                    let mut delay = self.jittered(attempt);
                    if let ClickUpError::RateLimited { retry_after_secs } = &e {
                        let server_hint = Duration::from_secs(*retry_after_secs);
                        delay = delay.max(server_hint.min(self.max_delay));
                    }
                    warn!(
                        operation,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Transient ClickUp failure, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
