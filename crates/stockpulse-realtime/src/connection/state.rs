//! Connection lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime state of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not started, stopped, or disabled.
    Idle,
    /// Waiting for the transport to open.
    Connecting,
    /// Receiving events.
    Open,
    /// Closed after a failure; a retry is scheduled.
    ClosedRetrying,
    /// Closed after the maximum number of failures; waiting for a manual reconnect.
    ClosedExhausted,
}

impl ConnectionState {
    /// Whether events are flowing.
    pub fn is_connected(self) -> bool {
        self == Self::Open
    }

    /// Whether a connection is open or being opened.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    /// Short lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::ClosedRetrying => "retrying",
            Self::ClosedExhausted => "exhausted",
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
