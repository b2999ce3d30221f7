//! Notification model, fingerprinting, parsing, and the deduplicating store.

pub mod fingerprint;
pub mod model;
pub mod parser;
pub mod store;

pub use fingerprint::Fingerprint;
pub use model::{AlertItem, Notification, NotificationId};
pub use parser::AlertParser;
pub use store::{IngestOutcome, NotificationStore};
