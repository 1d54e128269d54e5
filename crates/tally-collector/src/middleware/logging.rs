use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::routes::events::IngestedBatch;

/// Log every request; stored batches also log their id and event count
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match response.extensions().get::<IngestedBatch>() {
        Some(batch) => tracing::info!(
            %method,
            %path,
            %status,
            elapsed_ms,
            batch_id = %batch.batch_id,
            accepted = batch.accepted,
            "Event batch stored"
        ),
        None if status.is_client_error() || status.is_server_error() => tracing::warn!(
            %method,
            %path,
            %status,
            elapsed_ms,
            "Request rejected"
        ),
        None => tracing::info!(%method, %path, %status, elapsed_ms, "Request processed"),
    }

    response
}
