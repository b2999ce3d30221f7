//! Transport abstraction for server-push connections.

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;

use stockpulse_core::result::AppResult;

use crate::message::sse::SseMessage;

/// An open push connection. Dropping it releases the underlying resource.
///
/// An `Err` item or the end of the stream means the connection was lost.
pub type EventStream = BoxStream<'static, AppResult<SseMessage>>;

/// Opens push connections.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug + 'static {
    /// Open a connection to `url`. Resolves once the server has accepted it.
    async fn connect(&self, url: &str) -> AppResult<EventStream>;
}
