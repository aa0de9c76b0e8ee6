//! Sliding-window circuit breaker.
//!
//! Tracks the outcome of the last `window` calls. Once the failure rate over
//! that window reaches `failure_rate_threshold`, the breaker opens and fails
//! every call immediately (`CircuitOpen`) without attempting the call, for
//! `open_dwell`. After the dwell it moves to half-open and lets `half_open_probe`
//! calls through; if those probes mostly succeed the breaker closes, otherwise
//! it reopens.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub window: usize,
    pub failure_rate_threshold: f64,
    pub open_dwell: Duration,
    pub half_open_probe: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerConfig {
            window: 10,
            failure_rate_threshold: 0.5,
            open_dwell: Duration::from_secs(30),
            half_open_probe: 3,
        }
    }
}

struct Inner {
    state: State,
    outcomes: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_remaining: usize,
    half_open_failures: usize,
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        CircuitBreaker {
            config,
            inner: Mutex::new(Inner {
                state: State::Closed,
                outcomes: VecDeque::with_capacity(config.window),
                opened_at: None,
                half_open_remaining: 0,
                half_open_failures: 0,
            }),
        }
    }

    /// Returns true if a call may proceed; false if the breaker is open and
    /// the call should fail fast with `CircuitOpen`.
    pub async fn allow(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.state {
            State::Closed => true,
            State::Open => {
                let dwell_elapsed = inner
                    .opened_at
                    .map(|t| t.elapsed() >= self.config.open_dwell)
                    .unwrap_or(true);
                if dwell_elapsed {
                    inner.state = State::HalfOpen;
                    inner.half_open_remaining = self.config.half_open_probe;
                    inner.half_open_failures = 0;
                    true
                } else {
                    false
                }
            }
            State::HalfOpen => inner.half_open_remaining > 0,
        }
    }

    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            State::HalfOpen => {
                inner.half_open_remaining = inner.half_open_remaining.saturating_sub(1);
                if inner.half_open_remaining == 0 {
                    inner.state = State::Closed;
                    inner.outcomes.clear();
                }
            }
            State::Closed => {
                push_outcome(&mut inner.outcomes, self.config.window, true);
            }
            State::Open => {}
        }
    }

    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            State::HalfOpen => {
                inner.half_open_failures += 1;
                inner.half_open_remaining = inner.half_open_remaining.saturating_sub(1);
                self.open(&mut inner);
            }
            State::Closed => {
                push_outcome(&mut inner.outcomes, self.config.window, false);
                if should_open(&inner.outcomes, self.config.failure_rate_threshold) {
                    self.open(&mut inner);
                }
            }
            State::Open => {}
        }
    }

    fn open(&self, inner: &mut Inner) {
        inner.state = State::Open;
        inner.opened_at = Some(Instant::now());
        inner.outcomes.clear();
    }
}

fn push_outcome(outcomes: &mut VecDeque<bool>, window: usize, success: bool) {
    if outcomes.len() >= window {
        outcomes.pop_front();
    }
    outcomes.push_back(success);
}

fn should_open(outcomes: &VecDeque<bool>, threshold: f64) -> bool {
    if outcomes.is_empty() {
        return false;
    }
    let failures = outcomes.iter().filter(|ok| !**ok).count();
    (failures as f64) / (outcomes.len() as f64) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_failure_rate_exceeded() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            window: 4,
            failure_rate_threshold: 0.5,
            open_dwell: Duration::from_secs(60),
            half_open_probe: 1,
        });

        assert!(breaker.allow().await);
        breaker.record_failure().await;
        assert!(breaker.allow().await);
        breaker.record_failure().await;
        // 2/2 failures >= 50% threshold: breaker opens.
        assert!(!breaker.allow().await);
    }

    #[tokio::test]
    async fn half_open_closes_on_successful_probes() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            window: 2,
            failure_rate_threshold: 0.5,
            open_dwell: Duration::from_millis(1),
            half_open_probe: 2,
        });
        breaker.record_failure().await;
        breaker.record_failure().await;
        assert!(!breaker.allow().await);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(breaker.allow().await); // half-open probe 1
        breaker.record_success().await;
        assert!(breaker.allow().await); // half-open probe 2
        breaker.record_success().await;
        // breaker closed again
        assert!(breaker.allow().await);
    }
}
