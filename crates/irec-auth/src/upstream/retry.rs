//! Bounded retry with exponential backoff for outbound calls.

use std::time::Duration;

use crate::config::RetryConfig;

/// Retry policy shared by the provider and backend clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Builds a policy from configuration.
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.backoff,
        }
    }

    /// Returns `true` if another attempt may follow attempt number `attempt` (0-based).
    #[must_use]
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before the retry that follows attempt number `attempt`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Sleeps for the backoff of `attempt`.
    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Transport failures worth retrying: the request timed out or never
    /// reached the peer.
    #[must_use]
    pub fn is_transport_failure(err: &reqwest::Error) -> bool {
        err.is_connect() || err.is_timeout()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
