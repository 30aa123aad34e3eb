//! Retry/backoff policy for the job engine (spec.md §4.4).

use chrono::Duration as ChronoDuration;
use rand::Rng;
use std::time::Duration;

/// Retry policy applied when a handler or dispatch attempt fails.
///
/// A handler may override `max_attempts`; everything else is fixed per
/// spec.md §4.4 ("adopt the policy... uniformly unless a handler overrides").
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: i32,
    base: Duration,
    cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
            cap: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: i32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn should_retry(&self, attempts: i32) -> bool {
        attempts < self.max_attempts
    }

    /// Exponential backoff with base 1s, cap 30s, full jitter (spec.md §4.4).
    ///
    /// `attempt` is 1-based (the attempt number that just failed).
    pub fn backoff(&self, attempt: i32) -> ChronoDuration {
        let exp = self.base.as_millis().saturating_mul(1u128 << attempt.max(0).min(20) as u32);
        let capped = exp.min(self.cap.as_millis());
        let jittered = rand::thread_rng().gen_range(0..=capped.max(1)) as i64;
        ChronoDuration::milliseconds(jittered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_three_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn backoff_never_exceeds_cap() {
        let policy = RetryPolicy::default();
        for attempt in 0..10 {
            let delay = policy.backoff(attempt);
            assert!(delay.num_milliseconds() <= 30_000);
            assert!(delay.num_milliseconds() >= 0);
        }
    }

    #[test]
    fn handler_override_changes_max_attempts() {
        let policy = RetryPolicy::with_max_attempts(5);
        assert!(policy.should_retry(4));
        assert!(!policy.should_retry(5));
    }
}
