//! Conflict retry policy: bounds the attempts and decides backoff delays.

use std::time::Duration;

/// Upper bound for a single backoff sleep.
pub const MAX_CONFLICT_BACKOFF: Duration = Duration::from_secs(1);

/// Retry policy for write conflicts.
///
/// The attempt count is a hard bound: once it is reached the conflict is
/// surfaced to the caller instead of looping.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictRetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_attempts: u32,

    /// Delay after the first conflict.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,
}

impl ConflictRetryPolicy {
    /// Retries without sleeping in between.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before the next attempt, after `attempts` attempts have conflicted.
    ///
    /// delay = base_delay * multiplier^(attempts - 1), capped at
    /// [`MAX_CONFLICT_BACKOFF`]
    pub fn next_delay(&self, attempts: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempts.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay_secs)
            .map_or(MAX_CONFLICT_BACKOFF, |delay| delay.min(MAX_CONFLICT_BACKOFF))
    }
}

impl Default for ConflictRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_increases() {
        let policy = ConflictRetryPolicy::default();

        assert_eq!(policy.next_delay(1), Duration::from_millis(10));
        assert_eq!(policy.next_delay(2), Duration::from_millis(20));
        assert_eq!(policy.next_delay(3), Duration::from_millis(40));
    }

    #[test]
    fn immediate_policy_never_sleeps() {
        let policy = ConflictRetryPolicy::immediate(3);
        assert_eq!(policy.next_delay(1), Duration::ZERO);
        assert_eq!(policy.next_delay(7), Duration::ZERO);
    }

    #[test]
    fn backoff_is_capped_for_long_retry_chains() {
        let policy = ConflictRetryPolicy {
            max_attempts: 200,
            ..ConflictRetryPolicy::default()
        };
        assert!(policy.next_delay(7) < MAX_CONFLICT_BACKOFF);
        assert_eq!(policy.next_delay(100), MAX_CONFLICT_BACKOFF);
        assert_eq!(policy.next_delay(u32::MAX), MAX_CONFLICT_BACKOFF);
    }

    #[test]
    fn huge_multiplier_does_not_overflow() {
        let policy = ConflictRetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            multiplier: 1e300,
        };
        assert_eq!(policy.next_delay(1), Duration::from_millis(10));
        assert_eq!(policy.next_delay(2), MAX_CONFLICT_BACKOFF);
        assert_eq!(policy.next_delay(3), MAX_CONFLICT_BACKOFF);

        let immediate = ConflictRetryPolicy {
            base_delay: Duration::ZERO,
            ..policy
        };
        assert_eq!(immediate.next_delay(3), Duration::ZERO);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(ConflictRetryPolicy::immediate(0).attempts(), 1);
    }
}
