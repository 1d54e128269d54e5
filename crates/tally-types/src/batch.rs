use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Delivery payload: one batch per request, events in enqueue order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<Event>,
}

impl EventBatch {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl From<Vec<Event>> for EventBatch {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackEvent;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let batch = EventBatch::from(vec![
            TrackEvent::new("form_view", "f1", "s1").stamp(1),
            TrackEvent::new("form_submit", "f1", "s1").stamp(2),
        ]);

        let value = serde_json::to_value(&batch).unwrap();
        let events = value["events"].as_array().unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["name"], json!("form_view"));
        assert_eq!(events[1]["name"], json!("form_submit"));
    }

    #[test]
    fn test_empty_batch() {
        let batch = EventBatch::default();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }
}
