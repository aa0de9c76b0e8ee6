//! Retry with exponential backoff around a fallible async call.
//!
//! Mirrors the teacher's callback delivery loop (`daemon/src/rpc/callback.rs`):
//! attempt, and on a retryable failure sleep for `base * 2^attempt` before the
//! next attempt, up to a fixed attempt budget.

use std::time::Duration;

use log::{debug, warn};

/// Decides whether a failure of type `E` is worth retrying.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(multiplier)
    }

    /// Runs `op` up to `max_attempts` times, sleeping with exponential backoff
    /// between attempts, and returning as soon as the underlying call succeeds
    /// or a non-retryable error is returned.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 >= self.max_attempts || !err.is_retryable() => {
                    return Err(err);
                }
                Err(_) => {
                    let delay = self.delay_for(attempt);
                    if log::log_enabled!(log::Level::Debug) {
                        debug!(
                            "{label}: attempt {} failed, retrying in {:?}",
                            attempt + 1,
                            delay
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Logs a final retry exhaustion at warn level; kept as a free function so
/// callers that build their own loop (e.g. around the circuit breaker) can
/// still use the teacher's logging idiom without duplicating the format string.
pub fn warn_exhausted(label: &str, attempts: u32) {
    warn!("{label}: retry budget exhausted after {attempts} attempts");
}
