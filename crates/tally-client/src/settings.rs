use config::{Config as ConfigLoader, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::batcher::EventBatcher;
use crate::config::{
    BatcherConfig, DEFAULT_BATCH_SIZE, DEFAULT_EVENTS_PATH, DEFAULT_FLUSH_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::Result;

/// Tracker settings as read from files and the environment
///
/// Tracking is off unless `enabled` is set explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub destination: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default)]
    pub flush_on_dispose: bool,
    #[serde(default = "default_events_path")]
    pub events_path: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

fn default_events_path() -> String {
    DEFAULT_EVENTS_PATH.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS * 1_000
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            destination: String::new(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            flush_on_dispose: false,
            events_path: default_events_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl TrackerSettings {
    /// Load settings from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/tracker.toml
    /// 2. config/tracker.{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with TALLY_ (e.g. TALLY_ENABLED, TALLY_BATCH_SIZE)
    pub fn load() -> Result<Self> {
        Self::load_with_env(Environment::with_prefix("TALLY").try_parsing(true))
    }

    fn load_with_env(env_source: Environment) -> Result<Self> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let settings = ConfigLoader::builder()
            .add_source(File::with_name("config/tracker").required(false))
            .add_source(File::with_name(&format!("config/tracker.{}", env)).required(false))
            .add_source(env_source)
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load settings from a specific file (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse settings from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings = ConfigLoader::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn to_batcher_config(&self) -> BatcherConfig {
        BatcherConfig::new(self.destination.clone())
            .batch_size(self.batch_size)
            .flush_interval_ms(self.flush_interval_ms)
            .flush_on_dispose(self.flush_on_dispose)
            .events_path(self.events_path.clone())
            .request_timeout(Duration::from_millis(self.request_timeout_ms))
    }
}

/// Start event tracking if the settings enable it
///
/// This is the only way tracking gets switched on: nothing starts on load.
/// Returns `Ok(None)` when tracking is disabled.
pub fn init(settings: &TrackerSettings) -> Result<Option<EventBatcher>> {
    if !settings.enabled {
        tracing::debug!("Event tracking disabled");
        return Ok(None);
    }

    EventBatcher::new(settings.to_batcher_config()).map(Some)
}
