//! HTTP Server-Sent-Events transport built on `reqwest`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing;

use stockpulse_core::error::{AppError, ErrorKind};
use stockpulse_core::result::AppResult;

use crate::message::sse::decode_stream;

use super::transport::{EventStream, Transport};

/// Opens SSE connections with a shared `reqwest` client.
///
/// No request timeout is set on the client: the stream is long-lived and
/// the open deadline is enforced by the stream client.
#[derive(Clone)]
pub struct SseTransport {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl std::fmt::Debug for SseTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseTransport")
            .field("authenticated", &self.auth_token.is_some())
            .finish()
    }
}

impl SseTransport {
    /// Create a transport, optionally sending a bearer token.
    pub fn new(auth_token: Option<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stockpulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Internal,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;
        Ok(Self::with_client(client, auth_token))
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: reqwest::Client, auth_token: Option<String>) -> Self {
        Self {
            client,
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn connect(&self, url: &str) -> AppResult<EventStream> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Transport,
                format!("Failed to reach notification stream: {e}"),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transport(format!(
                "Notification stream responded with HTTP {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("text/event-stream") {
            tracing::warn!(
                "Notification stream content type is '{}', expected text/event-stream",
                content_type
            );
        }

        tracing::debug!("Notification stream opened ({})", status);
        Ok(decode_stream(response.bytes_stream()))
    }
}
