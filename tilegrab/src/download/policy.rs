//! Retry policy for tile fetches.

use std::time::Duration;

/// Default maximum delay for exponential backoff (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// How a tile fetch handles transient failures.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// Fixed number of attempts with constant delay between them.
    Fixed {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay between attempts.
        delay: Duration,
    },

    /// Exponential backoff: the delay grows by `multiplier` after each
    /// failure, up to `max_delay`.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay after the first failure.
        initial_delay: Duration,
        /// Maximum delay cap.
        max_delay: Duration,
        /// Multiplier applied after each failure (typically 2.0).
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts,
            delay,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Returns `None` once `attempt` reaches the attempt limit, meaning the
    /// failure is final.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::Fixed {
                max_attempts,
                delay,
            } => (attempt < *max_attempts).then_some(*delay),
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let nanos = initial_delay.as_nanos() as f64 * factor;
                let delay = Duration::from_nanos(nanos.min(max_delay.as_nanos() as f64) as u64);
                Some(delay.min(*max_delay))
            }
        }
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::Fixed { max_attempts, .. } => *max_attempts,
            Self::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_attempt_never_waits() {
        let policy = RetryPolicy::fixed(1, Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_for_attempt(1), None);
    }

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(250)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(250)));
        assert_eq!(policy.delay_for_attempt(3), None);
    }

    #[test]
    fn test_exponential_doubles_from_one_second() {
        let policy = RetryPolicy::ExponentialBackoff {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        };
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for_attempt(4), None);
    }

    #[test]
    fn test_exponential_is_capped() {
        let policy = RetryPolicy::ExponentialBackoff {
            max_attempts: 20,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        };
        assert_eq!(policy.delay_for_attempt(5), Some(Duration::from_secs(10)));
        assert_eq!(policy.delay_for_attempt(19), Some(Duration::from_secs(10)));
    }
}
