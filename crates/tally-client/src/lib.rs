//! # Tally client
//!
//! Batched delivery of analytics events. Application code reports events with
//! [`EventBatcher::track`]; the batcher stamps them, queues them in memory, and
//! posts them to the destination in batches, either once `batch_size` events
//! are queued or every `flush_interval`, whichever comes first.
//!
//! ```rust,no_run
//! use tally_client::{BatcherConfig, EventBatcher, TrackEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let batcher = EventBatcher::new(
//!         BatcherConfig::new("https://api.example.com").batch_size(20),
//!     )?;
//!
//!     batcher.track(TrackEvent::new("form_view", "form-42", "session-7"));
//!
//!     batcher.dispose().await;
//!     Ok(())
//! }
//! ```

pub mod batcher;
pub mod config;
pub mod error;
pub mod http;
pub mod settings;
pub mod transport;

pub use batcher::{BatcherState, EventBatcher, FlushOutcome};
pub use config::BatcherConfig;
pub use error::{ConfigurationError, DeliveryError};
pub use http::HttpTransport;
pub use settings::{init, TrackerSettings};
pub use transport::Transport;

// Re-export the event model so callers need a single dependency
pub use tally_types::{Event, EventBatch, EventData, TrackEvent};
