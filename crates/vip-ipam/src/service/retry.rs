//! Retry policy for optimistic writes.
//!
//! Defaults follow the usual conflict-retry budget of an object-store client:
//! five attempts, 10 ms apart, with 10% jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bounded retry with (optionally exponential) backoff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total write attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Growth factor applied per retry (1.0 = constant).
    pub multiplier: f64,
    /// Upper bound on a single delay, before jitter.
    pub max_backoff_ms: u64,
    /// Extra random delay as a fraction of the base delay.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 10,
            multiplier: 1.0,
            max_backoff_ms: 1_000,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately, mainly for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            multiplier: 1.0,
            max_backoff_ms: 0,
            jitter: 0.0,
        }
    }

    /// Delay before retry number `retry` (0 = first retry), without jitter.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        let millis = (self.initial_backoff_ms as f64 * factor).min(self.max_backoff_ms as f64);
        Duration::from_millis(millis.max(0.0).round() as u64)
    }

    /// Delay before retry number `retry`, jitter included.
    pub fn delay(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0.0..=self.jitter);
        base + base.mul_f64(extra)
    }
}
