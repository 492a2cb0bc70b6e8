use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the dispatcher re-establishes a session the server closed.
///
/// Attempts are counted from the last successful connect. The delay before
/// attempt `n` is `initial_delay * 2^(n-1)`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(10),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Reconnect at once, every time, with no cap.
    pub fn immediate() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Never reconnect automatically.
    pub fn disabled() -> Self {
        Self {
            max_attempts: Some(0),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before the given 1-based attempt, or `None` once the cap is hit.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 {
            return Some(Duration::ZERO);
        }
        if let Some(max) = self.max_attempts
            && attempt > max
        {
            return None;
        }

        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        Some(self.initial_delay.saturating_mul(factor).min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_doubles_until_cap() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(7), Some(Duration::from_secs(30)));
        assert_eq!(policy.delay_for(10), Some(Duration::from_secs(30)));
        assert_eq!(policy.delay_for(11), None);
    }

    #[test]
    fn test_immediate_is_unbounded() {
        let policy = ReconnectPolicy::immediate();
        assert_eq!(policy.delay_for(1), Some(Duration::ZERO));
        assert_eq!(policy.delay_for(1_000), Some(Duration::ZERO));
        assert_eq!(policy.delay_for(u32::MAX), Some(Duration::ZERO));
    }

    #[test]
    fn test_disabled_never_reconnects() {
        assert_eq!(ReconnectPolicy::disabled().delay_for(1), None);
    }

    #[test]
    fn test_large_attempt_does_not_overflow() {
        let policy = ReconnectPolicy::default().with_max_attempts(None);
        assert_eq!(policy.delay_for(64), Some(Duration::from_secs(30)));
    }
}
