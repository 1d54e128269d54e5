// Batcher configuration with builder-style setters and validation

use std::time::Duration;
use url::Url;

use crate::error::{ConfigurationError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_EVENTS_PATH: &str = "/analytics/events";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration for an [`EventBatcher`](crate::EventBatcher)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatcherConfig {
    /// Base address of the destination, e.g. "https://api.example.com"
    pub destination: String,
    /// Queue length that triggers an immediate flush
    pub batch_size: usize,
    /// Period of the recurring flush timer
    pub flush_interval: Duration,
    /// Whether `dispose` delivers what is still queued
    pub flush_on_dispose: bool,
    /// Path appended to the destination for deliveries
    pub events_path: String,
    pub request_timeout: Duration,
}

impl BatcherConfig {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            flush_on_dispose: false,
            events_path: DEFAULT_EVENTS_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn flush_interval_ms(self, ms: u64) -> Self {
        self.flush_interval(Duration::from_millis(ms))
    }

    pub fn flush_on_dispose(mut self, enabled: bool) -> Self {
        self.flush_on_dispose = enabled;
        self
    }

    pub fn events_path(mut self, path: impl Into<String>) -> Self {
        self.events_path = path.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check every constraint the batcher relies on
    pub fn validate(&self) -> Result<()> {
        if self.batch_size < 1 {
            return Err(ConfigurationError::InvalidBatchSize(self.batch_size));
        }
        if self.flush_interval.is_zero() {
            return Err(ConfigurationError::InvalidFlushInterval(
                self.flush_interval.as_millis(),
            ));
        }
        self.endpoint().map(|_| ())
    }

    /// Full delivery URL: destination joined with the events path
    pub fn endpoint(&self) -> Result<Url> {
        let base = self.destination.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ConfigurationError::InvalidDestination(
                "destination is empty".to_string(),
            ));
        }

        let path = self.events_path.trim_start_matches('/');
        let raw = format!("{}/{}", base, path);
        let url = Url::parse(&raw)
            .map_err(|e| ConfigurationError::InvalidDestination(format!("{}: {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigurationError::InvalidDestination(format!(
                "unsupported scheme '{}' in {}",
                other, raw
            ))),
        }
    }
}
