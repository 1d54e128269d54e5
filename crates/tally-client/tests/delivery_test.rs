use std::time::Duration;

use mockito::{Matcher, Mock};
use tally_client::{BatcherConfig, EventBatcher, FlushOutcome, TrackEvent};

fn event(name: &str) -> TrackEvent {
    TrackEvent::new(name, "f1", "s1")
}

/// Wait until the mock has seen its expected requests, giving up after two seconds
async fn wait_until_matched(mock: &Mock) -> bool {
    for _ in 0..200 {
        if mock.matched_async().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_size_triggered_delivery_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/analytics/events")
        .match_body(Matcher::Regex(r#""name":"view".*"name":"submit""#.to_string()))
        .with_status(202)
        .expect(1)
        .create_async()
        .await;

    let batcher = EventBatcher::new(BatcherConfig::new(server.url()).batch_size(2)).unwrap();
    batcher.track(event("view"));
    batcher.track(event("submit"));

    assert!(wait_until_matched(&mock).await);
    mock.assert_async().await;
    batcher.dispose().await;
}

#[tokio::test]
async fn test_failed_batch_is_resent_ahead_of_new_events() {
    let mut server = mockito::Server::new_async().await;
    let failing = server
        .mock("POST", "/analytics/events")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let batcher = EventBatcher::new(BatcherConfig::new(server.url()).batch_size(10)).unwrap();
    batcher.track(event("view"));
    batcher.track(event("submit"));

    assert_eq!(batcher.flush().await, FlushOutcome::Requeued(2));
    assert_eq!(batcher.len(), 2);
    failing.assert_async().await;
    failing.remove_async().await;

    let accepting = server
        .mock("POST", "/analytics/events")
        .match_body(Matcher::Regex(
            r#""name":"view".*"name":"submit".*"name":"retry""#.to_string(),
        ))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    batcher.track(event("retry"));
    assert_eq!(batcher.flush().await, FlushOutcome::Delivered(3));
    assert!(batcher.is_empty());
    accepting.assert_async().await;

    batcher.dispose().await;
}

#[tokio::test]
async fn test_dispose_flushes_when_configured() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/analytics/events")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = BatcherConfig::new(server.url())
        .batch_size(10)
        .flush_on_dispose(true);
    let batcher = EventBatcher::new(config).unwrap();

    batcher.track(event("abandon"));
    batcher.dispose().await;

    assert!(batcher.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_timer_delivers_partial_batch() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/analytics/events")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let config = BatcherConfig::new(server.url())
        .batch_size(100)
        .flush_interval_ms(50);
    let batcher = EventBatcher::new(config).unwrap();

    batcher.track(event("view"));

    assert!(wait_until_matched(&mock).await);
    batcher.dispose().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_timed_out_delivery_is_requeued() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = BatcherConfig::new(format!("http://{}", addr))
        .batch_size(50)
        .request_timeout(Duration::from_millis(200));
    let batcher = EventBatcher::new(config).unwrap();

    batcher.track(event("form_view"));
    batcher.track(event("form_submit"));

    assert_eq!(batcher.flush().await, FlushOutcome::Requeued(2));
    assert_eq!(batcher.len(), 2);

    batcher.dispose().await;
}
