//! Read-only view of the client state published to consumers.

use std::time::Duration;

use serde::Serialize;

use crate::connection::state::ConnectionState;
use crate::notification::model::{AlertItem, Notification};

/// Snapshot of the stream client, replaced after every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSnapshot {
    /// Notifications, most recently updated first.
    pub notifications: Vec<Notification>,
    /// Number of unread notifications.
    pub unread_count: usize,
    /// Products across all notifications, in list order.
    pub alert_items: Vec<AlertItem>,
    /// Whether the connection is open.
    pub is_connected: bool,
    /// Connection lifecycle state.
    pub state: ConnectionState,
    /// Most recent connection error, cleared once a connection opens.
    pub last_error: Option<String>,
    /// Consecutive failed connection attempts.
    pub retry_attempt: u32,
    /// Failures after which automatic retries stop.
    pub max_attempts: u32,
    /// Delay of the scheduled retry.
    pub retry_delay: Duration,
}

impl Default for StreamSnapshot {
    fn default() -> Self {
        Self {
            notifications: Vec::new(),
            unread_count: 0,
            alert_items: Vec::new(),
            is_connected: false,
            state: ConnectionState::Idle,
            last_error: None,
            retry_attempt: 0,
            max_attempts: 0,
            retry_delay: Duration::ZERO,
        }
    }
}

impl StreamSnapshot {
    /// Human-readable connection status.
    pub fn status_message(&self) -> String {
        match self.state {
            ConnectionState::Idle => "Disconnected".to_string(),
            ConnectionState::Connecting if self.retry_attempt > 0 => format!(
                "Connecting (attempt {}/{})",
                self.retry_attempt + 1,
                self.max_attempts
            ),
            ConnectionState::Connecting => "Connecting".to_string(),
            ConnectionState::Open => "Connected".to_string(),
            ConnectionState::ClosedRetrying => format!(
                "Reconnecting in {} (attempt {}/{})",
                format_delay(self.retry_delay),
                self.retry_attempt,
                self.max_attempts
            ),
            ConnectionState::ClosedExhausted => format!(
                "Connection failed after {} attempts; reconnect manually",
                self.retry_attempt
            ),
        }
    }
}

fn format_delay(delay: Duration) -> String {
    if delay.subsec_millis() == 0 {
        format!("{}s", delay.as_secs())
    } else {
        format!("{:.1}s", delay.as_secs_f64())
    }
}
