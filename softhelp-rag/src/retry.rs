//! Bounded retry with exponential backoff for hosted-service calls.

use std::time::Duration;

/// Retry policy for outbound service requests.
///
/// Only transient failures (transport errors, HTTP 429 and 5xx) are worth
/// retrying; callers classify the failure before consulting the policy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 1, base_delay: Duration::from_millis(500) }
    }
}

impl RetryPolicy {
    /// Backoff delay before retry number `attempt` (zero-based).
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}
