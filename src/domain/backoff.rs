//! Reconnect Backoff
//!
//! Exponential delay with random jitter between reconnect attempts:
//! `min(max_delay, base_delay * 1.5^attempt + uniform(0, jitter))`.

use std::time::Duration;

use rand::Rng;

/// Default base delay between reconnects
pub const DEFAULT_BASE_DELAY_MS: u64 = 5_000;
/// Upper bound for any reconnect delay
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Upper bound of the random jitter added to each delay
pub const DEFAULT_JITTER_MS: u64 = 1_000;
/// Reconnects allowed before giving up
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;
/// Growth factor per attempt
pub const BACKOFF_MULTIPLIER: f64 = 1.5;

/// Reconnect schedule and retry ceiling
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            max_jitter: Duration::from_millis(DEFAULT_JITTER_MS),
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay for `attempt` with an explicit jitter value
    pub fn delay_with_jitter(&self, attempt: u32, jitter: Duration) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exponential = base_ms * BACKOFF_MULTIPLIER.powi(attempt as i32);
        let total = exponential + jitter.as_millis() as f64;
        let capped = total.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped.floor() as u64)
    }

    /// Delay for `attempt` with jitter drawn uniformly from `0..=max_jitter`
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let max_jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter_ms = if max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=max_jitter_ms)
        };
        self.delay_with_jitter(attempt, Duration::from_millis(jitter_ms))
    }

    /// Mean delay for `attempt` (jitter averaged out)
    pub fn expected_delay(&self, attempt: u32) -> Duration {
        self.delay_with_jitter(attempt, self.max_jitter / 2)
    }

    /// True once `attempts` is past the retry ceiling
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts > self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.base_delay, Duration::from_millis(5000));
        assert_eq!(policy.max_delay, Duration::from_millis(30000));
        assert_eq!(policy.max_attempts, 10);
    }

    #[test]
    fn test_formula_without_jitter() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_with_jitter(0, Duration::ZERO), Duration::from_millis(5000));
        assert_eq!(policy.delay_with_jitter(1, Duration::ZERO), Duration::from_millis(7500));
        assert_eq!(policy.delay_with_jitter(2, Duration::ZERO), Duration::from_millis(11250));
    }

    #[test]
    fn test_capped_at_max_delay() {
        let policy = ReconnectPolicy::default();
        assert_eq!(
            policy.delay_with_jitter(10, Duration::from_millis(999)),
            Duration::from_millis(30000)
        );
    }

    #[test]
    fn test_expected_delay_monotonic() {
        let policy = ReconnectPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 0..=10 {
            let delay = policy.expected_delay(attempt);
            assert!(delay >= previous, "attempt {} went down", attempt);
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
    }

    #[test]
    fn test_random_delay_within_bounds() {
        let policy = ReconnectPolicy::default();
        for attempt in 0..=10 {
            let low = policy.delay_with_jitter(attempt, Duration::ZERO);
            let high = policy.delay_with_jitter(attempt, policy.max_jitter);
            for _ in 0..20 {
                let delay = policy.next_delay(attempt);
                assert!(delay >= low && delay <= high);
            }
        }
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let policy = ReconnectPolicy {
            max_jitter: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(policy.next_delay(3), policy.next_delay(3));
    }

    #[test]
    fn test_exhaustion_threshold() {
        let policy = ReconnectPolicy::default();
        assert!(!policy.is_exhausted(10));
        assert!(policy.is_exhausted(11));
    }
}
