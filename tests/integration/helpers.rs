//! Shared test helpers for integration tests.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use stockpulse_core::config::stream::{ReconnectConfig, StreamConfig};
use stockpulse_realtime::{ClientSettings, StreamSnapshot};

/// Route served by [`TestServer`], relative to its base URL.
pub const STREAM_PATH: &str = "/notifications/stream";

#[derive(Debug, Default)]
struct Inner {
    requests: AtomicUsize,
    unavailable: AtomicBool,
    queries: Mutex<Vec<Option<String>>>,
    authorizations: Mutex<Vec<Option<String>>>,
    streams: Mutex<Vec<mpsc::UnboundedSender<Event>>>,
}

/// Local SSE server whose streams are fed by the test
pub struct TestServer {
    /// Base URL to configure clients with, e.g. `http://127.0.0.1:4321/api`
    pub base_url: String,
    inner: Arc<Inner>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind to an ephemeral port and start serving
    pub async fn start() -> Self {
        let inner = Arc::new(Inner::default());
        let app = Router::new()
            .route(&format!("/api{STREAM_PATH}"), get(stream_handler))
            .with_state(Arc::clone(&inner));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}/api"),
            inner,
            handle,
        }
    }

    /// Full stream URL, without a cache-busting parameter
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, STREAM_PATH)
    }

    /// Answer new requests with 503 while `true`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stream requests received, refused ones included
    pub fn request_count(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    /// Query string of the most recent request
    pub fn last_query(&self) -> Option<String> {
        self.inner.queries.lock().unwrap().last().cloned().flatten()
    }

    /// `Authorization` header of the most recent request
    pub fn last_authorization(&self) -> Option<String> {
        self.inner
            .authorizations
            .lock()
            .unwrap()
            .last()
            .cloned()
            .flatten()
    }

    /// Send an event to every open stream; returns how many received it
    pub fn push(&self, event: &str, data: &str) -> usize {
        let mut streams = self.inner.streams.lock().unwrap();
        streams.retain(|tx| {
            tx.send(Event::default().event(event).data(data)).is_ok()
        });
        streams.len()
    }

    /// End every open stream from the server side
    pub fn drop_streams(&self) {
        self.inner.streams.lock().unwrap().clear();
    }

    /// Wait until at least `count` requests arrived
    pub async fn wait_for_requests(&self, count: usize) {
        let wait = async {
            while self.request_count() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .unwrap_or_else(|_| {
                panic!(
                    "Expected {} requests, got {}",
                    count,
                    self.request_count()
                )
            });
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn stream_handler(
    State(inner): State<Arc<Inner>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    inner.requests.fetch_add(1, Ordering::SeqCst);
    inner
        .queries
        .lock()
        .unwrap()
        .push(uri.query().map(str::to_string));
    inner.authorizations.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    if inner.unavailable.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    inner.streams.lock().unwrap().push(tx);

    let events = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok::<_, Infallible>(event), rx))
    });
    Sse::new(events).into_response()
}

/// Stock alert payload for one product
pub fn stock_alert(product_id: i64, stock: u32, min_amount: u32) -> String {
    json!({
        "message": "Products below minimum stock",
        "body": {
            "event": "stock-alert",
            "response": {
                "products": [{
                    "id": product_id,
                    "code": format!("P{product_id}"),
                    "name": format!("Product {product_id}"),
                    "price": "12.50",
                    "stock": stock,
                    "min_amount": min_amount
                }],
                "datetime": "2024-05-01 10:00:00"
            }
        }
    })
    .to_string()
}

/// Client settings pointing at `server` with a fast reconnect policy
pub fn client_settings(server: &TestServer, max_attempts: u32) -> ClientSettings {
    let config = StreamConfig {
        base_url: server.base_url.clone(),
        open_timeout_seconds: 2,
        reconnect: ReconnectConfig {
            base_delay_ms: 20,
            factor: 1.5,
            max_delay_ms: 100,
            max_attempts,
        },
        ..StreamConfig::default()
    };
    ClientSettings::from_config(&config).expect("Invalid test settings")
}

/// Wait up to five seconds for a snapshot matching `predicate`
pub async fn wait_for(
    rx: &mut watch::Receiver<StreamSnapshot>,
    predicate: impl FnMut(&StreamSnapshot) -> bool,
) -> StreamSnapshot {
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("Timed out waiting for snapshot")
        .expect("Stream client stopped")
        .clone();
    snapshot
}
