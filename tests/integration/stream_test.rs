//! End-to-end tests of the notification stream client over HTTP.

use std::time::Duration;

use stockpulse_realtime::{
    ConnectionState, EnvironmentTriggers, NotificationStreamClient, SseTransport,
};

use crate::helpers::{self, TestServer};

fn spawn_client(server: &TestServer, max_attempts: u32) -> NotificationStreamClient {
    NotificationStreamClient::spawn(
        helpers::client_settings(server, max_attempts),
        SseTransport::new(None).unwrap(),
        EnvironmentTriggers::new(Duration::from_secs(3600)),
    )
}

#[tokio::test]
async fn test_client_merges_repeated_alerts() {
    let server = TestServer::start().await;
    let client = spawn_client(&server, 10);
    let mut rx = client.subscribe();

    client.start();
    helpers::wait_for(&mut rx, |s| s.is_connected).await;

    server.push("notification", &helpers::stock_alert(1, 3, 5));
    let first = helpers::wait_for(&mut rx, |s| s.notifications.len() == 1).await;
    assert_eq!(first.unread_count, 1);
    assert_eq!(first.notifications[0].items[0].price, 12.5);

    client.mark_all_as_read();
    helpers::wait_for(&mut rx, |s| s.unread_count == 0).await;

    server.push("notification", &helpers::stock_alert(1, 1, 5));
    let merged = helpers::wait_for(&mut rx, |s| {
        s.notifications
            .first()
            .is_some_and(|n| n.items[0].stock == 1.0)
    })
    .await;
    assert_eq!(merged.notifications.len(), 1);
    assert_eq!(merged.notifications[0].id, first.notifications[0].id);
    assert_eq!(merged.unread_count, 1);

    server.push("notification", &helpers::stock_alert(2, 0, 4));
    let two = helpers::wait_for(&mut rx, |s| s.notifications.len() == 2).await;
    assert_eq!(two.notifications[0].items[0].id, 2);
    assert_eq!(two.alert_items.len(), 2);

    client.shutdown().await;
}

#[tokio::test]
async fn test_client_ignores_other_events() {
    let server = TestServer::start().await;
    let client = spawn_client(&server, 10);
    let mut rx = client.subscribe();

    client.start();
    helpers::wait_for(&mut rx, |s| s.is_connected).await;

    server.push("heartbeat", "ping");
    server.push("notification", "{not json");
    server.push(
        "notification",
        r#"{"body": {"event": "price-change", "response": {}}}"#,
    );
    server.push("notification", &helpers::stock_alert(9, 2, 3));

    let snapshot = helpers::wait_for(&mut rx, |s| !s.notifications.is_empty()).await;
    assert_eq!(snapshot.notifications.len(), 1);
    assert_eq!(snapshot.notifications[0].items[0].id, 9);
    assert!(snapshot.is_connected);
    assert_eq!(server.request_count(), 1);

    client.shutdown().await;
}

#[tokio::test]
async fn test_client_reconnects_after_server_closes_stream() {
    let server = TestServer::start().await;
    let client = spawn_client(&server, 10);
    let mut rx = client.subscribe();

    client.start();
    helpers::wait_for(&mut rx, |s| s.is_connected).await;

    server.drop_streams();
    server.wait_for_requests(2).await;
    let snapshot = helpers::wait_for(&mut rx, |s| s.is_connected).await;
    assert_eq!(snapshot.retry_attempt, 0);
    assert!(snapshot.last_error.is_none());

    let query = server.last_query().unwrap_or_default();
    assert!(query.starts_with("t="), "unexpected query '{query}'");

    client.shutdown().await;
}

#[tokio::test]
async fn test_client_gives_up_then_reconnects_on_demand() {
    let server = TestServer::start().await;
    server.set_unavailable(true);
    let client = spawn_client(&server, 3);
    let mut rx = client.subscribe();

    client.start();
    let exhausted =
        helpers::wait_for(&mut rx, |s| s.state == ConnectionState::ClosedExhausted).await;
    assert_eq!(exhausted.retry_attempt, 3);
    assert!(exhausted.last_error.is_some());
    assert_eq!(server.request_count(), 3);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.request_count(), 3);

    server.set_unavailable(false);
    client.reconnect_now();
    let open = helpers::wait_for(&mut rx, |s| s.is_connected).await;
    assert_eq!(open.retry_attempt, 0);
    assert_eq!(server.request_count(), 4);

    client.shutdown().await;
}

#[tokio::test]
async fn test_stop_prevents_reconnects() {
    let server = TestServer::start().await;
    let client = spawn_client(&server, 10);
    let mut rx = client.subscribe();

    client.start();
    helpers::wait_for(&mut rx, |s| s.is_connected).await;

    client.stop();
    helpers::wait_for(&mut rx, |s| s.state == ConnectionState::Idle).await;
    server.drop_streams();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.request_count(), 1);

    client.start();
    helpers::wait_for(&mut rx, |s| s.is_connected).await;
    assert_eq!(server.request_count(), 2);

    client.shutdown().await;
}
