//! Wire formats: SSE framing and the alert payload envelope.

pub mod sse;
pub mod types;

pub use sse::{SseDecoder, SseMessage};
pub use types::AlertEnvelope;
