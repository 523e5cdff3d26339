//! Backoff for optimistic-concurrency retries.

use std::time::Duration;

use time::ext::NumericalStdDuration as _;

/// Bounded exponential backoff, the shape of client-go's `DefaultBackoff`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total number of write attempts, including the first one.
    pub steps: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            steps: 4,
            initial_delay: 10.std_milliseconds(),
            factor: 5.0,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-indexed).
    ///
    /// `initial_delay * factor^(attempt - 1)`, so with the defaults: 10ms, 50ms, 250ms.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.factor.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Whether another attempt is allowed after `attempt` attempts have failed.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.steps, 4);
        assert_eq!(policy.initial_delay, Duration::from_millis(10));
        assert_eq!(policy.factor, 5.0);
    }

    #[test]
    fn exponential_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.next_delay(0), Duration::from_millis(10));
        assert_eq!(policy.next_delay(1), Duration::from_millis(10));
        assert_eq!(policy.next_delay(2), Duration::from_millis(50));
        assert_eq!(policy.next_delay(3), Duration::from_millis(250));
    }

    #[test]
    fn constant_backoff() {
        let policy = RetryPolicy {
            factor: 1.0,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.next_delay(1), policy.next_delay(3));
    }

    #[test]
    fn huge_delay_saturates() {
        let policy = RetryPolicy {
            factor: 1e300,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.next_delay(10), Duration::MAX);
    }

    #[test]
    fn bounded_attempts() {
        let policy = RetryPolicy::default();

        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(3));
        assert!(!policy.allows_retry(4));
    }
}
