//! Bounded retry with exponential backoff.
//!
//! Any collaborator call that can fail transiently goes through
//! [`RetryPolicy::run`]. The policy only retries errors the caller marks as
//! transient; everything else is returned on the first failure.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    multiplier: u32,
}

impl RetryPolicy {
    /// `max_attempts` total tries; the wait after attempt `n` is
    /// `initial_delay * multiplier^(n-1)`.
    pub fn exponential(max_attempts: u32, initial_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            multiplier: multiplier.max(1),
        }
    }

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self::exponential(1, Duration::ZERO, 1)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(self.multiplier.saturating_pow(exp))
    }

    /// Run `op` until it succeeds, returns a non-transient error, or the
    /// attempt budget is spent. The last error is returned on exhaustion.
    pub async fn run<T, E, F, Fut, P>(&self, label: &str, is_transient: P, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= self.max_attempts || !is_transient(&e) {
                        tracing::warn!(
                            call = label,
                            attempt = attempt,
                            max_attempts = self.max_attempts,
                            error = %e,
                            "Giving up"
                        );
                        return Err(e);
                    }
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        call = label,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_secs(2), 2)
    }
}
