use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tally_types::EventBatch;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    store::{EventFilter, StoredEvent},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub batch_id: Uuid,
    pub accepted: usize,
}

/// Receipt attached to ingest responses for the request log
#[derive(Debug, Clone, Copy)]
pub struct IngestedBatch {
    pub batch_id: Uuid,
    pub accepted: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub subject_id: Option<String>,
    pub session_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListEventsResponse {
    pub events: Vec<StoredEvent>,
    pub count: usize,
}

/// Accept a batch of events
///
/// Events are stored in the order they appear in the batch.
pub async fn ingest_events(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<EventBatch>,
) -> ApiResult<(StatusCode, Extension<IngestedBatch>, Json<IngestResponse>)> {
    if batch.is_empty() {
        return Err(ApiError::BadRequest("batch contains no events".to_string()));
    }

    if let Some(position) = batch.events.iter().position(|e| e.name.trim().is_empty()) {
        return Err(ApiError::BadRequest(format!(
            "event at position {} has an empty name",
            position
        )));
    }

    let batch_id = Uuid::new_v4();
    let accepted = state.store.write().await.append(batch_id, batch.into_events());

    Ok((
        StatusCode::ACCEPTED,
        Extension(IngestedBatch { batch_id, accepted }),
        Json(IngestResponse { batch_id, accepted }),
    ))
}

/// List stored events, most recent `limit`, oldest first
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEventsQuery>,
) -> Json<ListEventsResponse> {
    let filter = EventFilter {
        subject_id: query.subject_id,
        session_id: query.session_id,
        limit: query.limit,
    };

    let events = state.store.read().await.list(&filter);

    Json(ListEventsResponse {
        count: events.len(),
        events,
    })
}
