//! Retry policy: bounded attempts with exponential backoff.
//!
//! This is just the policy object; the store and API adapters own the
//! actual retry loops because error classification is theirs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Same policy with a different attempt cap. Non-idempotent operations
    /// use this to retry at most twice.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay to sleep after a failed attempt (0-based). `None` once the
    /// attempt budget is spent.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        let ms = self.base_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        Some(Duration::from_millis(ms as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(0), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(200)));
        // Third attempt is the last; no further delay.
        assert_eq!(policy.delay_after(2), None);
    }

    #[test]
    fn test_single_attempt_never_sleeps() {
        let policy = RetryPolicy::default().with_max_attempts(1);
        assert_eq!(policy.delay_after(0), None);
    }
}
