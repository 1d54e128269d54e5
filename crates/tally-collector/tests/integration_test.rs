use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use tally_collector::{
    build_router, config::Config, routes::events::IngestedBatch, state::AppState,
};

fn app_with_capacity(max_events: usize) -> Router {
    let mut config = Config::default();
    config.storage.max_events = max_events;
    build_router(Arc::new(AppState::new(config)))
}

fn post_events(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/analytics/events")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn event(name: &str, subject: &str, session: &str, timestamp: i64) -> Value {
    json!({
        "name": name,
        "subjectId": subject,
        "sessionId": session,
        "timestamp": timestamp
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with_capacity(10);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["stored_events"], 0);
}

#[tokio::test]
async fn test_ingest_then_list_in_order() {
    let app = app_with_capacity(100);

    let response = app
        .clone()
        .oneshot(post_events(json!({
            "events": [
                event("form_view", "f1", "s1", 1),
                event("form_submit", "f1", "s1", 2)
            ]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let receipt = json_body(response).await;
    assert_eq!(receipt["accepted"], 2);
    assert!(receipt["batch_id"].is_string());

    let response = app.oneshot(get("/analytics/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listing = json_body(response).await;
    assert_eq!(listing["count"], 2);
    assert_eq!(listing["events"][0]["name"], "form_view");
    assert_eq!(listing["events"][1]["name"], "form_submit");
    assert_eq!(listing["events"][0]["batchId"], receipt["batch_id"]);
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let app = app_with_capacity(10);

    let response = app.oneshot(post_events(json!({ "events": [] }))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("no events"));
}

#[tokio::test]
async fn test_blank_event_name_rejected() {
    let app = app_with_capacity(10);

    let response = app
        .oneshot(post_events(json!({
            "events": [event("form_view", "f1", "s1", 1), event(" ", "f1", "s1", 2)]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_payload_rejected() {
    let app = app_with_capacity(10);

    let response = app
        .oneshot(post_events(json!({ "events": [{ "name": "missing fields" }] })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_list_filters_and_limit() {
    let app = app_with_capacity(100);

    app.clone()
        .oneshot(post_events(json!({
            "events": [
                event("a", "f1", "s1", 1),
                event("b", "f2", "s1", 2),
                event("c", "f1", "s2", 3),
                event("d", "f1", "s2", 4)
            ]
        })))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/analytics/events?subject_id=f1"))
        .await
        .unwrap();
    let listing = json_body(response).await;
    let names: Vec<&str> = listing["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "c", "d"]);

    let response = app
        .oneshot(get("/analytics/events?session_id=s2&limit=1"))
        .await
        .unwrap();
    let listing = json_body(response).await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["events"][0]["name"], "d");
}

#[tokio::test]
async fn test_store_evicts_oldest() {
    let app = app_with_capacity(2);

    app.clone()
        .oneshot(post_events(json!({
            "events": [event("a", "f1", "s1", 1), event("b", "f1", "s1", 2), event("c", "f1", "s1", 3)]
        })))
        .await
        .unwrap();

    let listing = json_body(app.clone().oneshot(get("/analytics/events")).await.unwrap()).await;
    assert_eq!(listing["count"], 2);
    assert_eq!(listing["events"][0]["name"], "b");

    let health = json_body(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["evicted_events"], 1);
}

#[tokio::test]
async fn test_ingest_response_carries_batch_receipt() {
    let app = app_with_capacity(10);

    let response = app
        .clone()
        .oneshot(post_events(json!({
            "events": [event("form_view", "f1", "s1", 1), event("form_submit", "f1", "s1", 2)]
        })))
        .await
        .unwrap();

    let receipt = *response.extensions().get::<IngestedBatch>().unwrap();
    assert_eq!(receipt.accepted, 2);

    let body = json_body(response).await;
    assert_eq!(body["batch_id"], receipt.batch_id.to_string());

    let response = app.oneshot(get("/analytics/events")).await.unwrap();
    assert!(response.extensions().get::<IngestedBatch>().is_none());
}
