use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form context attached to an event
pub type EventData = HashMap<String, serde_json::Value>;

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An event as it travels on the wire
///
/// Events are immutable once created. The `timestamp` is assigned when the
/// event is enqueued, never by the code that reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event kind, e.g. "form_view" or "form_submit"
    pub name: String,

    /// Entity the event pertains to (usually a form)
    pub subject_id: String,

    /// Session the event originated from
    pub session_id: String,

    /// Milliseconds since epoch, stamped at enqueue time
    pub timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
}

impl Event {
    /// Timestamp as a UTC datetime, if it is in range
    pub fn recorded_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// An event reported by application code, before it is timestamped
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEvent {
    pub name: String,
    pub subject_id: String,
    pub session_id: String,
    pub data: Option<EventData>,
}

impl TrackEvent {
    pub fn new(
        name: impl Into<String>,
        subject_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            subject_id: subject_id.into(),
            session_id: session_id.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = Some(data);
        self
    }

    /// Add a single context field, creating the data map if needed
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Turn this into a wire event stamped with `timestamp`
    pub fn stamp(self, timestamp: i64) -> Event {
        Event {
            name: self.name,
            subject_id: self.subject_id,
            session_id: self.session_id,
            timestamp,
            data: self.data,
        }
    }
}
