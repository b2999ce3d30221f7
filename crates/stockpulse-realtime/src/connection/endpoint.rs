//! Stream endpoint URL construction.

use chrono::Utc;
use reqwest::Url;

use stockpulse_core::config::stream::StreamConfig;
use stockpulse_core::error::{AppError, ErrorKind};
use stockpulse_core::result::AppResult;

/// Query parameter used to defeat intermediary caches.
const CACHE_BUST_PARAM: &str = "t";

/// Base URL plus path of the SSE endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    base_url: String,
    path: String,
}

impl StreamEndpoint {
    /// Create an endpoint from a base URL and a path.
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
        }
    }

    /// Create an endpoint from stream configuration.
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(&config.base_url, &config.path)
    }

    /// URL for a new connection attempt, stamped with the current time.
    pub fn url(&self) -> AppResult<String> {
        self.url_at(Utc::now().timestamp_millis())
    }

    /// URL stamped with the given Unix time in milliseconds.
    pub fn url_at(&self, millis: i64) -> AppResult<String> {
        let base = self.base_url.trim().trim_end_matches('/');
        let path = self.path.trim();
        let joined = match path {
            "" => base.to_string(),
            p if p.starts_with('/') => format!("{base}{p}"),
            p => format!("{base}/{p}"),
        };

        let mut url = Url::parse(&joined).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid notification stream URL '{joined}': {e}"),
                e,
            )
        })?;
        url.query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &millis.to_string());
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_base_and_path() {
        let endpoint = StreamEndpoint::new("https://pos.example.com/api/", "/notifications/stream");
        assert_eq!(
            endpoint.url_at(1700000000000).unwrap(),
            "https://pos.example.com/api/notifications/stream?t=1700000000000"
        );
    }

    #[test]
    fn test_path_without_slash() {
        let endpoint = StreamEndpoint::new("http://localhost:8000", "events");
        assert_eq!(endpoint.url_at(5).unwrap(), "http://localhost:8000/events?t=5");
    }

    #[test]
    fn test_keeps_existing_query() {
        let endpoint = StreamEndpoint::new("http://localhost:8000/sse?store=3", "");
        assert_eq!(
            endpoint.url_at(9).unwrap(),
            "http://localhost:8000/sse?store=3&t=9"
        );
    }

    #[test]
    fn test_each_attempt_gets_fresh_stamp() {
        let endpoint = StreamEndpoint::new("http://localhost", "/s");
        assert_ne!(endpoint.url_at(1).unwrap(), endpoint.url_at(2).unwrap());
    }

    #[test]
    fn test_invalid_base_is_configuration_error() {
        let err = StreamEndpoint::new("not a url", "/s").url().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
