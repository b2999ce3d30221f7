//! Runtime settings of the stream client.

use std::time::Duration;

use stockpulse_core::config::stream::StreamConfig;
use stockpulse_core::result::AppResult;

use crate::connection::backoff::ReconnectPolicy;
use crate::connection::endpoint::StreamEndpoint;
use crate::notification::parser::AlertParser;

/// Everything the client needs besides its transport and triggers.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Whether `start()` may open a connection.
    pub enabled: bool,
    /// Where to connect.
    pub endpoint: StreamEndpoint,
    /// How to read alerts.
    pub parser: AlertParser,
    /// Maximum retained notifications.
    pub capacity: usize,
    /// Deadline for a connection to open.
    pub open_timeout: Duration,
    /// Reconnect backoff.
    pub policy: ReconnectPolicy,
}

impl ClientSettings {
    /// Build settings from validated stream configuration.
    pub fn from_config(config: &StreamConfig) -> AppResult<Self> {
        // Fail fast on an unusable URL; attempts rebuild it with a fresh stamp.
        let endpoint = StreamEndpoint::from_config(config);
        endpoint.url()?;

        Ok(Self {
            enabled: config.enabled,
            endpoint,
            parser: AlertParser::from_config(config),
            capacity: config.capacity,
            open_timeout: config.open_timeout(),
            policy: ReconnectPolicy::from(&config.reconnect),
        })
    }
}
