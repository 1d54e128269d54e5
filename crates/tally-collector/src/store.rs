use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tally_types::Event;
use uuid::Uuid;

/// An event as held by the collector, tagged with the batch it arrived in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub batch_id: Uuid,
    pub received_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub event: Event,
}

/// Listing filter, all fields optional
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub subject_id: Option<String>,
    pub session_id: Option<String>,
    pub limit: usize,
}

impl EventFilter {
    fn matches(&self, stored: &StoredEvent) -> bool {
        let subject_ok = self
            .subject_id
            .as_deref()
            .map_or(true, |id| stored.event.subject_id == id);
        let session_ok = self
            .session_id
            .as_deref()
            .map_or(true, |id| stored.event.session_id == id);
        subject_ok && session_ok
    }
}

/// Bounded in-memory event log, oldest first
#[derive(Debug)]
pub struct EventStore {
    events: VecDeque<StoredEvent>,
    capacity: usize,
    evicted: u64,
}

impl EventStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    /// Append a batch in order, evicting the oldest events past capacity
    pub fn append(&mut self, batch_id: Uuid, events: Vec<Event>) -> usize {
        let received_at = chrono::Utc::now();
        let count = events.len();

        for event in events {
            self.events.push_back(StoredEvent {
                batch_id,
                received_at,
                event,
            });
        }

        while self.events.len() > self.capacity {
            self.events.pop_front();
            self.evicted += 1;
        }

        count
    }

    /// Most recent matching events, returned oldest first
    pub fn list(&self, filter: &EventFilter) -> Vec<StoredEvent> {
        let mut matched: Vec<StoredEvent> = self
            .events
            .iter()
            .rev()
            .filter(|stored| filter.matches(stored))
            .take(filter.limit)
            .cloned()
            .collect();
        matched.reverse();
        matched
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}
