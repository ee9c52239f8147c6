//! Reconnection backoff policy

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reconnection policy configuration
///
/// The first reopen after an interruption happens immediately, following
/// attempts wait `initial_delay * backoff_multiplier ^ n`, capped at
/// `max_delay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Maximum reopen attempts per interruption (0 means unlimited)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Backoff multiplier for exponential delay
    pub backoff_multiplier: f64,
    /// Whether to add ±25% jitter to delays
    pub jitter: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl ReconnectPolicy {
    /// Create from configuration values
    pub fn from_config(
        max_attempts: u32,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
            backoff_multiplier,
            jitter: true,
        }
    }

    /// Whether another attempt is allowed after `attempts` failed ones
    pub fn allows_attempt(&self, attempts: u32) -> bool {
        self.max_attempts == 0 || attempts < self.max_attempts
    }

    /// Delay before attempt number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let exponent = (attempt - 2).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let max_ms = self.max_delay.as_millis() as f64;
        let mut delay_ms = (self.initial_delay.as_millis() as f64 * factor).min(max_ms);

        if self.jitter && delay_ms > 0.0 {
            let jitter_range = delay_ms * 0.25;
            delay_ms += rand::thread_rng().gen_range(-jitter_range..jitter_range);
        }

        Duration::from_millis(delay_ms.clamp(0.0, max_ms) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_without_jitter() -> ReconnectPolicy {
        ReconnectPolicy {
            jitter: false,
            ..ReconnectPolicy::from_config(0, 100, 1000, 2.0)
        }
    }

    #[test]
    fn test_first_attempt_is_immediate() {
        assert_eq!(ReconnectPolicy::default().delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy = policy_without_jitter();
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(6), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(60), Duration::from_millis(1000));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = ReconnectPolicy::from_config(0, 1000, 60_000, 2.0);
        for _ in 0..100 {
            let delay = policy.delay_for_attempt(2);
            assert!(delay >= Duration::from_millis(750));
            assert!(delay <= Duration::from_millis(1250));
        }
    }

    #[test]
    fn test_attempt_limit() {
        let unlimited = ReconnectPolicy::default();
        assert!(unlimited.allows_attempt(1_000_000));

        let limited = ReconnectPolicy::from_config(3, 0, 0, 1.0);
        assert!(limited.allows_attempt(2));
        assert!(!limited.allows_attempt(3));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let policy: ReconnectPolicy =
            serde_json::from_str(r#"{"max_attempts": 5, "jitter": false}"#).unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert!(!policy.jitter);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
    }
}
