//! Store configuration.

use crate::retry::RetryConfig;
use std::time::Duration;

/// Configuration for a [`MemoryStore`](crate::MemoryStore).
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Simulated round-trip time added to every statement.
    pub statement_latency: Duration,

    /// Simulated round-trip time added to every commit.
    pub commit_latency: Duration,

    /// Retry policy for read-write transactions.
    pub retry: RetryConfig,
}

impl StoreConfig {
    /// Creates a configuration with no simulated latency and default retries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the simulated statement latency.
    #[must_use]
    pub fn statement_latency(mut self, latency: Duration) -> Self {
        self.statement_latency = latency;
        self
    }

    /// Sets the simulated commit latency.
    #[must_use]
    pub fn commit_latency(mut self, latency: Duration) -> Self {
        self.commit_latency = latency;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.statement_latency, Duration::ZERO);
        assert_eq!(config.commit_latency, Duration::ZERO);
        assert_eq!(config.retry.max_attempts, 10);
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new()
            .statement_latency(Duration::from_millis(2))
            .commit_latency(Duration::from_millis(5))
            .retry(RetryConfig::no_retry());

        assert_eq!(config.statement_latency, Duration::from_millis(2));
        assert_eq!(config.commit_latency, Duration::from_millis(5));
        assert_eq!(config.retry.max_attempts, 1);
    }
}
