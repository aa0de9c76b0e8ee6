//! Shared configuration keys from `spec.md` §6, loaded from an optional TOML
//! file and overridden by `LEDGERFLOW_*` environment variables.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in seconds, used only by test/seed tooling that issues
    /// tokens locally (`spec.md` treats credential exchange as out of scope).
    pub exp_seconds: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        JwtConfig {
            secret: "change-me-in-production".to_string(),
            exp_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub retry_max_attempts: u32,
    pub retry_base_wait_ms: u64,
    pub breaker_failure_rate_threshold: f64,
    pub breaker_open_dwell_secs: u64,
    pub breaker_window: usize,
    pub call_deadline_secs: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        ResilienceConfig {
            retry_max_attempts: 3,
            retry_base_wait_ms: 1000,
            breaker_failure_rate_threshold: 0.5,
            breaker_open_dwell_secs: 30,
            breaker_window: 10,
            call_deadline_secs: 5,
        }
    }
}

impl ResilienceConfig {
    pub fn retry_base_wait(&self) -> Duration {
        Duration::from_millis(self.retry_base_wait_ms)
    }

    pub fn breaker_open_dwell(&self) -> Duration {
        Duration::from_secs(self.breaker_open_dwell_secs)
    }

    pub fn call_deadline(&self) -> Duration {
        Duration::from_secs(self.call_deadline_secs)
    }
}

/// `limits.cache-ttl` from `spec.md` §6 — how long the Limit Store's
/// in-memory cache trusts a previously-read `TransactionLimit` before
/// re-checking the backing store for edits/deactivation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub cache_ttl_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig { cache_ttl_secs: 60 }
    }
}

impl LimitsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Overrides any field present as an environment variable `LEDGERFLOW_<FIELD>`.
/// Kept as a small explicit list (rather than a generic reflection pass) since
/// the recognized option set is fixed by `spec.md` §6.
pub fn apply_env_overrides(jwt: &mut JwtConfig, resilience: &mut ResilienceConfig) {
    if let Ok(secret) = std::env::var("LEDGERFLOW_JWT_SECRET") {
        jwt.secret = secret;
    }
    if let Ok(exp) = std::env::var("LEDGERFLOW_JWT_EXP") {
        if let Ok(exp) = exp.parse() {
            jwt.exp_seconds = exp;
        }
    }
    if let Ok(v) = std::env::var("LEDGERFLOW_RESILIENCE_RETRY_MAX_ATTEMPTS") {
        if let Ok(v) = v.parse() {
            resilience.retry_max_attempts = v;
        }
    }
    if let Ok(v) = std::env::var("LEDGERFLOW_RESILIENCE_RETRY_WAIT_MS") {
        if let Ok(v) = v.parse() {
            resilience.retry_base_wait_ms = v;
        }
    }
    if let Ok(v) = std::env::var("LEDGERFLOW_RESILIENCE_BREAKER_FAILURE_RATE_THRESHOLD") {
        if let Ok(v) = v.parse() {
            resilience.breaker_failure_rate_threshold = v;
        }
    }
    if let Ok(v) = std::env::var("LEDGERFLOW_RESILIENCE_BREAKER_OPEN_DWELL_SECS") {
        if let Ok(v) = v.parse() {
            resilience.breaker_open_dwell_secs = v;
        }
    }
    if let Ok(v) = std::env::var("LEDGERFLOW_RESILIENCE_BREAKER_WINDOW") {
        if let Ok(v) = v.parse() {
            resilience.breaker_window = v;
        }
    }
}

/// Overrides `LimitsConfig` from `LEDGERFLOW_LIMITS_CACHE_TTL_SECS`. Kept as
/// its own function rather than folded into `apply_env_overrides` since only
/// the Transaction Service carries a `LimitsConfig`.
pub fn apply_limits_env_overrides(limits: &mut LimitsConfig) {
    if let Ok(v) = std::env::var("LEDGERFLOW_LIMITS_CACHE_TTL_SECS") {
        if let Ok(v) = v.parse() {
            limits.cache_ttl_secs = v;
        }
    }
}
