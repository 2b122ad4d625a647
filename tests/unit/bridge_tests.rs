//! Stream bridge: ordered delivery, end semantics, disconnect guard.

use bytes::Bytes;
use futures_util::StreamExt;
use gitvitae::mcp::bridge::{EventSink, StreamBridge};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn frames_arrive_in_write_order() {
    let cancel = CancellationToken::new();
    let (bridge, mut body) = StreamBridge::channel(&cancel);

    bridge.write(Bytes::from_static(b"one")).unwrap();
    bridge.write(Bytes::from_static(b"two")).unwrap();
    bridge.end();

    let first = body.next().await.unwrap().unwrap();
    let second = body.next().await.unwrap().unwrap();
    assert_eq!(first.as_ref(), b"one");
    assert_eq!(second.as_ref(), b"two");
    assert!(body.next().await.is_none());
}

#[tokio::test]
async fn end_terminates_the_body_stream() {
    let cancel = CancellationToken::new();
    let (bridge, mut body) = StreamBridge::channel(&cancel);

    bridge.end();
    assert!(body.next().await.is_none());
}

#[tokio::test]
async fn write_after_end_is_a_transport_error() {
    let cancel = CancellationToken::new();
    let (bridge, _body) = StreamBridge::channel(&cancel);

    bridge.end();
    bridge.end();

    let err = bridge.write(Bytes::from_static(b"late")).unwrap_err();
    assert_eq!(err.to_string(), "transport: stream already ended");
    assert!(bridge.is_closed());
}

#[tokio::test]
async fn committed_flips_on_first_accepted_frame() {
    let cancel = CancellationToken::new();
    let (bridge, _body) = StreamBridge::channel(&cancel);

    assert!(!bridge.committed());
    bridge.write(Bytes::from_static(b"first")).unwrap();
    assert!(bridge.committed());
}

#[tokio::test]
async fn dropping_the_body_fires_the_disconnect_token() {
    let cancel = CancellationToken::new();
    let (bridge, body) = StreamBridge::channel(&cancel);

    assert!(!cancel.is_cancelled());
    drop(body);
    assert!(cancel.is_cancelled());

    let err = bridge.write(Bytes::from_static(b"late")).unwrap_err();
    assert_eq!(err.to_string(), "transport: client disconnected");
    assert!(bridge.is_closed());
}

#[tokio::test]
async fn open_bridge_reports_not_closed() {
    let cancel = CancellationToken::new();
    let (bridge, _body) = StreamBridge::channel(&cancel);
    assert!(!bridge.is_closed());
}
