//! Session lifecycle against a recording sink: handshake order,
//! keep-alive cadence, and idempotent teardown.

use std::sync::Arc;
use std::time::Duration;

use gitvitae::mcp::bridge::EventSink;
use gitvitae::mcp::envelope::{RequestId, ResponseEnvelope};
use gitvitae::mcp::session::SessionManager;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::test_helpers::RecordingSink;

fn manager(keep_alive: Duration) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(keep_alive))
}

fn ping_count(sink: &RecordingSink) -> usize {
    sink.frames()
        .iter()
        .filter(|frame| frame.starts_with("event: ping\n"))
        .count()
}

#[tokio::test]
async fn open_emits_endpoint_then_connected() {
    let manager = manager(Duration::from_secs(60));
    let sink = RecordingSink::new();

    let session = manager
        .open(Arc::clone(&sink) as _, CancellationToken::new())
        .await
        .unwrap();

    let frames = sink.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(
        frames[0],
        format!("event: endpoint\ndata: /message?sessionId={}\n\n", session.id)
    );
    assert!(frames[1].starts_with("event: connected\n"));
    assert!(frames[1].contains(&format!("\"sessionId\":\"{}\"", session.id)));
}

#[tokio::test]
async fn open_registers_the_session_under_a_fresh_id() {
    let manager = manager(Duration::from_secs(60));

    let first = manager
        .open(RecordingSink::new() as _, CancellationToken::new())
        .await
        .unwrap();
    let second = manager
        .open(RecordingSink::new() as _, CancellationToken::new())
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(manager.count().await, 2);
    assert!(manager.get(&first.id).await.is_some());
    assert!(manager.get("not-a-session").await.is_none());
}

#[tokio::test]
async fn failed_handshake_leaves_no_registration_behind() {
    let manager = manager(Duration::from_secs(60));
    let sink = RecordingSink::failing();

    let result = manager
        .open(Arc::clone(&sink) as _, CancellationToken::new())
        .await;

    assert!(result.is_err());
    assert_eq!(manager.count().await, 0);
    assert!(sink.is_closed());
}

#[tokio::test]
async fn close_is_idempotent_and_ends_the_sink() {
    let manager = manager(Duration::from_secs(60));
    let sink = RecordingSink::new();
    let cancel = CancellationToken::new();
    let session = manager
        .open(Arc::clone(&sink) as _, cancel.clone())
        .await
        .unwrap();

    assert!(manager.close(&session.id).await);
    assert!(!manager.close(&session.id).await);
    assert!(manager.get(&session.id).await.is_none());
    assert!(cancel.is_cancelled());
    assert!(sink.is_closed());
}

#[tokio::test]
async fn deliver_writes_a_message_event() {
    let manager = manager(Duration::from_secs(60));
    let sink = RecordingSink::new();
    let session = manager
        .open(Arc::clone(&sink) as _, CancellationToken::new())
        .await
        .unwrap();

    let response = ResponseEnvelope::success(RequestId::Number(3), json!({"ok": true}));
    session.deliver(&response).unwrap();

    let frames = sink.frames();
    let message = frames.last().unwrap();
    assert!(message.starts_with("event: message\n"));
    assert!(message.contains(r#""jsonrpc":"2.0""#));
    assert!(message.contains(r#""id":3"#));
}

#[tokio::test]
async fn keep_alive_pings_flow_until_close() {
    let manager = manager(Duration::from_millis(40));
    let sink = RecordingSink::new();
    let session = manager
        .open(Arc::clone(&sink) as _, CancellationToken::new())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let pings = ping_count(&sink);
    assert!(pings >= 2, "expected at least two pings, saw {pings}");

    manager.close(&session.id).await;
    let at_close = ping_count(&sink);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(ping_count(&sink), at_close);
    assert_eq!(manager.count().await, 0);
}

#[tokio::test]
async fn failed_ping_tears_the_session_down() {
    let manager = manager(Duration::from_millis(30));
    let sink = RecordingSink::new();
    let session = manager
        .open(Arc::clone(&sink) as _, CancellationToken::new())
        .await
        .unwrap();

    sink.set_failing(true);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(manager.get(&session.id).await.is_none());
    assert_eq!(manager.count().await, 0);
}

#[tokio::test]
async fn cancelling_the_token_tears_the_session_down() {
    let manager = manager(Duration::from_secs(60));
    let sink = RecordingSink::new();
    let cancel = CancellationToken::new();
    let session = manager
        .open(Arc::clone(&sink) as _, cancel.clone())
        .await
        .unwrap();

    cancel.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(manager.get(&session.id).await.is_none());
    assert!(sink.is_closed());
}
