pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use retry::{RetryPolicy, Retryable};

use std::time::Duration;

use thiserror::Error;

/// Raised by [`ResilienceWrapper::call`] itself (as opposed to the wrapped
/// operation's own error type) when the deadline or breaker trips.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WrapperError {
    #[error("CIRCUIT_OPEN")]
    CircuitOpen,
    #[error("call exceeded the total deadline")]
    DeadlineExceeded,
}

/// Combines a total deadline, retry-with-backoff, and a circuit breaker around
/// a single upstream dependency, per `spec.md` §4.5.
pub struct ResilienceWrapper {
    pub deadline: Duration,
    pub retry: RetryPolicy,
    pub breaker: CircuitBreaker,
}

impl ResilienceWrapper {
    pub fn new(deadline: Duration, retry: RetryPolicy, breaker_config: CircuitBreakerConfig) -> Self {
        ResilienceWrapper {
            deadline,
            retry,
            breaker: CircuitBreaker::new(breaker_config),
        }
    }

    /// Runs `op`, short-circuiting immediately if the breaker is open, applying
    /// the retry policy on retryable failures, and bounding the whole attempt
    /// sequence by `self.deadline`. Records each individual attempt's outcome
    /// against the breaker.
    pub async fn call<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, Outcome<E>>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if !self.breaker.allow().await {
            return Err(Outcome::Wrapper(WrapperError::CircuitOpen));
        }

        let attempt_sequence = self.retry.run(label, || {
            let breaker = &self.breaker;
            let fut = op();
            async move {
                match fut.await {
                    Ok(value) => {
                        breaker.record_success().await;
                        Ok(value)
                    }
                    Err(err) => {
                        breaker.record_failure().await;
                        Err(err)
                    }
                }
            }
        });

        match tokio::time::timeout(self.deadline, attempt_sequence).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Outcome::Upstream(err)),
            Err(_) => Err(Outcome::Wrapper(WrapperError::DeadlineExceeded)),
        }
    }
}

/// Either the wrapper itself gave up (deadline/breaker) or the wrapped
/// operation's own error surfaced after the retry budget was exhausted.
#[derive(Debug)]
pub enum Outcome<E> {
    Wrapper(WrapperError),
    Upstream(E),
}
