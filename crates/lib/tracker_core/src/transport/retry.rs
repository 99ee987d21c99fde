//! Linear retry policy.

use std::time::Duration;

use super::{AttemptState, TransportError};
use crate::config::ClientConfig;

/// Retry budget: at most `max_retries` retries, waiting `base_delay * N`
/// before retry N. Only network failures and timeouts qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay)
    }

    /// Decide whether `error` gets another attempt.
    ///
    /// On `Some(delay)` the attempt state has already been advanced.
    pub fn next_delay(&self, state: &mut AttemptState, error: &TransportError) -> Option<Duration> {
        if !error.is_retryable() || state.retries >= self.max_retries {
            return None;
        }
        state.retries += 1;
        Some(self.base_delay * state.retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> TransportError {
        TransportError::Network("connection refused".into())
    }

    #[test]
    fn delays_grow_linearly_until_budget_is_spent() {
        let policy = RetryPolicy::new(2, Duration::from_millis(800));
        let mut state = AttemptState::default();
        assert_eq!(
            policy.next_delay(&mut state, &network()),
            Some(Duration::from_millis(800))
        );
        assert_eq!(
            policy.next_delay(&mut state, &network()),
            Some(Duration::from_millis(1600))
        );
        assert_eq!(policy.next_delay(&mut state, &network()), None);
        assert_eq!(state.retries, 2);
    }

    #[test]
    fn received_status_is_never_retried() {
        let policy = RetryPolicy::new(2, Duration::from_millis(800));
        let mut state = AttemptState::default();
        let err = TransportError::Http {
            status: 500,
            body: String::new(),
        };
        assert_eq!(policy.next_delay(&mut state, &err), None);
        assert_eq!(state.retries, 0);
    }

    #[test]
    fn cancellation_does_not_touch_counter() {
        let policy = RetryPolicy::new(2, Duration::from_millis(800));
        let mut state = AttemptState::default();
        assert_eq!(policy.next_delay(&mut state, &TransportError::Canceled), None);
        assert_eq!(state, AttemptState::default());
    }

    #[test]
    fn timeout_uses_same_budget_as_network() {
        let policy = RetryPolicy::new(1, Duration::from_millis(100));
        let mut state = AttemptState::default();
        let timeout = TransportError::Timeout(Duration::from_secs(20));
        assert_eq!(
            policy.next_delay(&mut state, &timeout),
            Some(Duration::from_millis(100))
        );
        assert_eq!(policy.next_delay(&mut state, &network()), None);
    }
}
