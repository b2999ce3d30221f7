//! Notification and payload item types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::types::lenient_f64;

use super::fingerprint::Fingerprint;

/// Client-generated notification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A product attached to a stock alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertItem {
    /// Product identifier.
    pub id: i64,
    /// Product code (barcode / SKU).
    #[serde(default)]
    pub code: Option<String>,
    /// Display name.
    pub name: String,
    /// Unit price.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,
    /// Current stock level.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub stock: f64,
    /// Minimum stock threshold that triggered the alert.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_amount: f64,
}

/// A single alert delivered by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Client-side identifier, assigned at receipt.
    pub id: NotificationId,
    /// Category tag, e.g. `"stock-alert"`.
    pub kind: String,
    /// Human-readable text.
    pub message: String,
    /// Attached products, in server order.
    pub items: Vec<AlertItem>,
    /// Server timestamp, or receipt time when the server sent none.
    pub occurred_at: DateTime<Utc>,
    /// Whether the user has seen this notification.
    pub read: bool,
    /// Dedup key derived from kind, message, and items.
    pub fingerprint: Fingerprint,
}

impl Notification {
    /// Create an unread notification with a fresh identifier.
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        items: Vec<AlertItem>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let kind = kind.into();
        let message = message.into();
        let fingerprint = Fingerprint::of(&kind, &message, &items);
        Self {
            id: NotificationId::new(),
            kind,
            message,
            items,
            occurred_at,
            read: false,
            fingerprint,
        }
    }
}
