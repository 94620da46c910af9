use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How many times a read-modify-write cycle is re-run after losing a
/// compare-and-swap race, and how long to wait between runs.
///
/// The delay before retry `n` (0-based) is drawn uniformly from
/// `[d/2, d]` where `d = min(backoff_base_ms * 2^n, backoff_max_ms)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 25,
            backoff_max_ms: 400,
        }
    }
}

impl RetryPolicy {
    /// Retry without sleeping. Used by tests and single-process tools.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
        }
    }

    /// Total attempts including the first.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay(&self, retry: u32) -> Duration {
        let ceiling = self
            .backoff_base_ms
            .saturating_mul(1u64 << retry.min(16))
            .min(self.backoff_max_ms);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(ceiling / 2..=ceiling);
        Duration::from_millis(ms)
    }

    /// Sleep before retry `retry`.
    pub async fn pause(&self, retry: u32) {
        let delay = self.delay(retry);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let p = RetryPolicy::default();
        assert_eq!(p.attempts(), 4);
    }

    #[test]
    fn delay_is_bounded() {
        let p = RetryPolicy::default();
        for retry in 0..10 {
            let d = p.delay(retry);
            assert!(d <= Duration::from_millis(p.backoff_max_ms));
        }
        let first = p.delay(0);
        assert!(first >= Duration::from_millis(12) && first <= Duration::from_millis(25));
    }

    #[test]
    fn immediate_never_sleeps() {
        assert_eq!(RetryPolicy::immediate(5).delay(3), Duration::ZERO);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let p: RetryPolicy = serde_json::from_str(r#"{"max_retries": 7}"#).unwrap();
        assert_eq!(p.max_retries, 7);
        assert_eq!(p.backoff_base_ms, 25);
    }
}
