//! Notification stream client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Server-push notification stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Whether the client should connect at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Backend base URL, e.g. `https://pos.example.com/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the SSE endpoint, appended to `base_url`.
    #[serde(default = "default_path")]
    pub path: String,
    /// SSE event name the client subscribes to.
    #[serde(default = "default_event_name")]
    pub event_name: String,
    /// Value of `body.event` that marks a stock alert.
    #[serde(default = "default_alert_event")]
    pub alert_event: String,
    /// Optional bearer token sent with the stream request.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Maximum retained notifications.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Seconds a connection may take to open before it counts as failed.
    #[serde(default = "default_open_timeout")]
    pub open_timeout_seconds: u64,
    /// Seconds between passive health checks.
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_seconds: u64,
    /// Reconnect backoff settings.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Exponential backoff settings for reconnecting after transport failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay after each failure.
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// Upper bound for a single delay, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Consecutive failures after which automatic retries stop.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            path: default_path(),
            event_name: default_event_name(),
            alert_event: default_alert_event(),
            auth_token: None,
            capacity: default_capacity(),
            open_timeout_seconds: default_open_timeout(),
            health_check_interval_seconds: default_health_check_interval(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay(),
            factor: default_factor(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl StreamConfig {
    /// Connection-open deadline.
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_seconds)
    }

    /// Passive health-check period.
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_seconds)
    }

    pub(crate) fn validate(&self) -> Result<(), AppError> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::validation("stream.base_url must not be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AppError::validation(format!(
                "stream.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.event_name.trim().is_empty() {
            return Err(AppError::validation("stream.event_name must not be empty"));
        }
        if self.capacity == 0 {
            return Err(AppError::validation("stream.capacity must be at least 1"));
        }
        if self.open_timeout_seconds == 0 || self.health_check_interval_seconds == 0 {
            return Err(AppError::validation(
                "stream.open_timeout_seconds and stream.health_check_interval_seconds must be positive",
            ));
        }
        self.reconnect.validate()
    }
}

impl ReconnectConfig {
    /// Delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Upper bound for a single delay.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(AppError::validation(
                "stream.reconnect.factor must be a finite number >= 1.0",
            ));
        }
        if self.max_attempts == 0 {
            return Err(AppError::validation(
                "stream.reconnect.max_attempts must be at least 1",
            ));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(AppError::validation(
                "stream.reconnect.base_delay_ms must not exceed max_delay_ms",
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}

fn default_path() -> String {
    "/notifications/stream".to_string()
}

fn default_event_name() -> String {
    "notification".to_string()
}

fn default_alert_event() -> String {
    "stock-alert".to_string()
}

fn default_capacity() -> usize {
    50
}

fn default_open_timeout() -> u64 {
    10
}

fn default_health_check_interval() -> u64 {
    30
}

fn default_base_delay() -> u64 {
    1000
}

fn default_factor() -> f64 {
    1.5
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.open_timeout(), Duration::from_secs(10));
        assert_eq!(config.health_check_interval(), Duration::from_secs(30));
        assert_eq!(config.reconnect.base_delay(), Duration::from_secs(1));
        assert_eq!(config.reconnect.max_delay(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = StreamConfig {
            base_url: "ftp://pos".to_string(),
            ..StreamConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_shrinking_factor() {
        let mut config = StreamConfig::default();
        config.reconnect.factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_delays() {
        let mut config = StreamConfig::default();
        config.reconnect.base_delay_ms = 60_000;
        assert!(config.validate().is_err());
    }
}
