//! Conversion of raw SSE messages into candidate notifications.

use chrono::{DateTime, NaiveDateTime, Utc};

use stockpulse_core::config::stream::StreamConfig;
use stockpulse_core::result::AppResult;

use crate::message::sse::SseMessage;
use crate::message::types::{AlertEnvelope, AlertResponse};

use super::model::Notification;

/// Naive timestamp layouts accepted when the server omits an offset.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses stock alerts from the subscribed SSE event type.
#[derive(Debug, Clone)]
pub struct AlertParser {
    /// SSE event name to accept.
    event_name: String,
    /// `body.event` tag that marks a stock alert.
    alert_event: String,
}

impl AlertParser {
    /// Create a parser for the given SSE event name and alert tag.
    pub fn new(event_name: impl Into<String>, alert_event: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            alert_event: alert_event.into(),
        }
    }

    /// Create a parser from stream configuration.
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(&config.event_name, &config.alert_event)
    }

    /// Parse one SSE message.
    ///
    /// Returns `Ok(None)` for other event types and non-alert bodies, and an
    /// error when the payload is not valid alert JSON.
    pub fn parse(
        &self,
        message: &SseMessage,
        received_at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        if message.event != self.event_name {
            return Ok(None);
        }
        self.parse_payload(&message.data, received_at)
    }

    /// Parse a JSON payload regardless of its SSE framing.
    pub fn parse_payload(
        &self,
        data: &str,
        received_at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        let envelope: AlertEnvelope = serde_json::from_str(data)?;
        if envelope.body.event != self.alert_event {
            return Ok(None);
        }

        let response: AlertResponse = serde_json::from_value(envelope.body.response)?;
        let occurred_at = response
            .datetime
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(received_at);

        let message = envelope
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| summary(response.products.len()));

        Ok(Some(Notification::new(
            envelope.body.event,
            message,
            response.products,
            occurred_at,
        )))
    }
}

fn summary(count: usize) -> String {
    if count == 1 {
        "1 product below minimum stock".to_string()
    } else {
        format!("{count} products below minimum stock")
    }
}

/// Parse an RFC 3339 timestamp, or a naive one interpreted as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
