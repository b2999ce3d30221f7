//! Integration tests for the HTTP SSE transport.

use std::time::Duration;

use futures::StreamExt;

use stockpulse_core::error::ErrorKind;
use stockpulse_realtime::{SseTransport, Transport};

use crate::helpers::{self, TestServer};

#[tokio::test]
async fn test_transport_receives_named_events() {
    let server = TestServer::start().await;
    let transport = SseTransport::new(None).unwrap();

    let mut stream = transport.connect(&server.stream_url()).await.unwrap();
    assert_eq!(server.push("notification", &helpers::stock_alert(7, 1, 5)), 1);

    let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("No event received")
        .expect("Stream ended")
        .unwrap();
    assert_eq!(message.event, "notification");
    assert_eq!(message.data, helpers::stock_alert(7, 1, 5));
}

#[tokio::test]
async fn test_transport_joins_multiline_data() {
    let server = TestServer::start().await;
    let transport = SseTransport::new(None).unwrap();

    let mut stream = transport.connect(&server.stream_url()).await.unwrap();
    server.push("notice", "first line\nsecond line");

    let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(message.event, "notice");
    assert_eq!(message.data, "first line\nsecond line");
}

#[tokio::test]
async fn test_transport_sends_bearer_token() {
    let server = TestServer::start().await;
    let transport = SseTransport::new(Some("secret-token".to_string())).unwrap();

    let _stream = transport.connect(&server.stream_url()).await.unwrap();
    assert_eq!(
        server.last_authorization().as_deref(),
        Some("Bearer secret-token")
    );
}

#[tokio::test]
async fn test_transport_rejects_error_status() {
    let server = TestServer::start().await;
    server.set_unavailable(true);
    let transport = SseTransport::new(None).unwrap();

    let error = transport
        .connect(&server.stream_url())
        .await
        .err()
        .expect("Connect should fail");
    assert_eq!(error.kind, ErrorKind::Transport);
    assert!(error.message.contains("503"));
}

#[tokio::test]
async fn test_transport_reports_unreachable_server() {
    let server = TestServer::start().await;
    let url = server.stream_url();
    drop(server);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let transport = SseTransport::new(None).unwrap();
    let error = transport
        .connect(&url)
        .await
        .err()
        .expect("Connect should fail");
    assert_eq!(error.kind, ErrorKind::Transport);
}

#[tokio::test]
async fn test_stream_ends_when_server_closes_it() {
    let server = TestServer::start().await;
    let transport = SseTransport::new(None).unwrap();

    let mut stream = transport.connect(&server.stream_url()).await.unwrap();
    server.drop_streams();

    let end = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("Stream did not end");
    assert!(matches!(end, None | Some(Err(_))));
}
