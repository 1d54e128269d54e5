use std::time::Duration;

use tally_client::{init, FlushOutcome, TrackEvent, TrackerSettings};

/// Reports a short form session to a running collector.
///
/// Start the collector first (`cargo run -p tally-collector`), then:
/// TALLY_ENABLED=true TALLY_DESTINATION=http://127.0.0.1:8080 cargo run -p tally-client --example track_events
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let settings = TrackerSettings::load()?;
    let Some(batcher) = init(&settings)? else {
        println!("Tracking is disabled, set TALLY_ENABLED=true to send events");
        return Ok(());
    };

    let session_id = format!("session-{}", std::process::id());

    batcher.track(TrackEvent::new("form_view", "contact-form", &session_id));
    for field in ["name", "email", "message"] {
        batcher.track(
            TrackEvent::new("field_change", "contact-form", &session_id).with_field("field", field),
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    batcher.track(
        TrackEvent::new("form_submit", "contact-form", &session_id).with_field("duration_ms", 600),
    );

    match batcher.flush().await {
        FlushOutcome::Delivered(n) => println!("Delivered {} events", n),
        FlushOutcome::Requeued(n) => println!("Collector unreachable, {} events still queued", n),
        other => println!("Flush: {:?}", other),
    }

    batcher.dispose().await;
    Ok(())
}
