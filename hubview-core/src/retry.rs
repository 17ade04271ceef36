// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Constant-delay retry schedule for a fetch cycle.
///
/// `max_attempts: None` retries until the cycle succeeds or is superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Whether another attempt is allowed after `attempt` failed (1-based).
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_policy_always_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert!(policy.allows_retry_after(1));
        assert!(policy.allows_retry_after(u32::MAX - 1));
    }

    #[test]
    fn capped_policy_stops_at_the_last_attempt() {
        let policy = RetryPolicy::fixed(Duration::from_millis(250)).with_max_attempts(3);
        assert!(policy.allows_retry_after(1));
        assert!(policy.allows_retry_after(2));
        assert!(!policy.allows_retry_after(3));
    }

    #[test]
    fn zero_cap_still_allows_one_attempt() {
        let policy = RetryPolicy::default().with_max_attempts(0);
        assert_eq!(policy.max_attempts, Some(1));
        assert!(!policy.allows_retry_after(1));
    }
}
