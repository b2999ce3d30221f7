//! Alert payload shapes carried in SSE `data:` fields.
//!
//! ```json
//! {
//!   "message": "Low stock",
//!   "body": {
//!     "event": "stock-alert",
//!     "response": {
//!       "products": [{"id": 1, "code": "A1", "name": "Water", "price": 1.5, "stock": 3, "min_amount": 5}],
//!       "datetime": "2024-05-01T10:00:00Z"
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::notification::model::AlertItem;

/// Outer envelope of every pushed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEnvelope {
    /// Optional human-readable text.
    #[serde(default)]
    pub message: Option<String>,
    /// Event body; `response` is decoded only for alert events.
    pub body: EventBody,
}

/// Body of a pushed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBody {
    /// Event tag, e.g. `"stock-alert"`.
    pub event: String,
    /// Event-specific response, kept raw until the tag is known.
    #[serde(default)]
    pub response: serde_json::Value,
}

/// Response of a stock alert event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    /// Products at or below their minimum stock.
    #[serde(default)]
    pub products: Vec<AlertItem>,
    /// Server timestamp of the alert.
    #[serde(default)]
    pub datetime: Option<String>,
}

/// Accept a JSON number, a numeric string, or `null` (as `0`).
///
/// Decimal columns are commonly serialized as strings by the backend.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Number(f64),
        Text(String),
        Null,
    }

    match Numeric::deserialize(deserializer)? {
        Numeric::Number(n) => Ok(n),
        Numeric::Null => Ok(0.0),
        Numeric::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number '{s}': {e}"))),
    }
}
