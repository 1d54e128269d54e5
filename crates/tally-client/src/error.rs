use thiserror::Error;

/// Invalid construction parameters. Fatal: fix the configuration and retry.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid batch size: {0} (must be at least 1)")]
    InvalidBatchSize(usize),

    #[error("Invalid flush interval: {0}ms (must be greater than 0)")]
    InvalidFlushInterval(u128),

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("Failed to load tracker settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("EventBatcher must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A failed delivery attempt. Recovered inside the batcher, never surfaced to `track` callers.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Destination rejected batch: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
