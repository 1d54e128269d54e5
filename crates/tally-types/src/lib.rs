pub mod batch;
pub mod event;

pub use batch::EventBatch;
pub use event::{now_millis, Event, EventData, TrackEvent};
