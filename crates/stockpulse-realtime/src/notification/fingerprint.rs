//! Content fingerprints used to merge repeated alerts.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::AlertItem;

/// Dedup key computed from a notification's kind, message, and products.
///
/// Products contribute their identifier and minimum-stock threshold, sorted,
/// so ordering differences do not defeat deduplication. The live stock level
/// is excluded: a repeated alert whose only change is the current stock
/// updates the existing entry instead of adding a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for the given content.
    pub fn of(kind: &str, message: &str, items: &[AlertItem]) -> Self {
        let mut keys: Vec<(i64, f64)> = items.iter().map(|i| (i.id, i.min_amount)).collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let products = keys
            .iter()
            .map(|(id, min)| format!("{id}@{min}"))
            .collect::<Vec<_>>()
            .join(",");

        Self(format!("{kind}|{message}|{products}"))
    }

    /// The raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
