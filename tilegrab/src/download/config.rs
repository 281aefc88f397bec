//! Download tuning.

use std::time::Duration;

use super::policy::{RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_MAX_DELAY_SECS};
use crate::provider::DEFAULT_REQUEST_TIMEOUT;

/// Default number of concurrent fetch workers.
pub const DEFAULT_WORKERS: usize = 10;

/// Default tile release rate (tiles per second).
pub const DEFAULT_RATE_PER_SECOND: u32 = 50;

/// Default number of fetch attempts per tile.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for the retry backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Default capacity of the outbound event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Configuration for a [`super::TileDownloader`].
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadConfig {
    /// Concurrent fetch workers.
    pub workers: usize,
    /// Tiles released to the workers per second.
    pub rate_per_second: u32,
    /// Attempts per tile, including the first.
    pub max_retries: u32,
    /// Delay after the first failed attempt; doubles per attempt.
    pub backoff_base: Duration,
    /// Upper bound for a single backoff delay.
    pub max_backoff: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Capacity of the event channel handed to transports.
    pub event_buffer: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            rate_per_second: DEFAULT_RATE_PER_SECOND,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            max_backoff: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_rate_per_second(mut self, rate: u32) -> Self {
        self.rate_per_second = rate;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_event_buffer(mut self, buffer: usize) -> Self {
        self.event_buffer = buffer;
        self
    }

    /// Interval between two tile releases.
    ///
    /// A rate of zero is treated as one tile per second.
    pub fn release_interval(&self) -> Duration {
        Duration::from_secs(1) / self.rate_per_second.max(1)
    }

    /// Retry policy derived from the attempt count and backoff settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::ExponentialBackoff {
            max_attempts: self.max_retries.max(1),
            initial_delay: self.backoff_base,
            max_delay: self.max_backoff,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DownloadConfig::default();
        assert_eq!(config.workers, 10);
        assert_eq!(config.rate_per_second, 50);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.release_interval(), Duration::from_millis(20));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let config = DownloadConfig::new()
            .with_workers(2)
            .with_rate_per_second(4)
            .with_max_retries(5)
            .with_backoff_base(Duration::from_millis(10))
            .with_max_backoff(Duration::from_millis(50))
            .with_event_buffer(8);

        assert_eq!(config.workers, 2);
        assert_eq!(config.release_interval(), Duration::from_millis(250));
        assert_eq!(config.event_buffer, 8);

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(10)));
        assert_eq!(policy.delay_for_attempt(4), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_zero_rate_and_retries_are_floored() {
        let config = DownloadConfig::new()
            .with_rate_per_second(0)
            .with_max_retries(0);
        assert_eq!(config.release_interval(), Duration::from_secs(1));
        assert_eq!(config.retry_policy().max_attempts(), 1);
    }
}
