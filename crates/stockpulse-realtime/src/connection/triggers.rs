//! Environment trigger sources for passive health checks.
//!
//! The client re-checks its connection on a fixed interval and whenever the
//! host reports that it became active again (a window regained focus, a
//! process received a wake-up signal). Only the narrow "became active"
//! notification crosses this boundary, so the client makes no assumption
//! about what the host is.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing;

/// Default period between passive health checks.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Trigger sources consumed by the stream client.
#[derive(Debug)]
pub struct EnvironmentTriggers {
    /// Period between passive health checks.
    pub health_check_interval: Duration,
    /// Receives one message each time the host became active.
    pub became_active: Option<mpsc::UnboundedReceiver<()>>,
}

impl Default for EnvironmentTriggers {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH_CHECK_INTERVAL)
    }
}

impl EnvironmentTriggers {
    /// Interval checks only.
    pub fn new(health_check_interval: Duration) -> Self {
        Self {
            health_check_interval,
            became_active: None,
        }
    }

    /// Interval checks plus a notifier the host calls when it becomes active.
    pub fn with_activity(health_check_interval: Duration) -> (Self, ActivityNotifier) {
        let (tx, rx) = mpsc::unbounded_channel();
        let triggers = Self {
            health_check_interval,
            became_active: Some(rx),
        };
        (triggers, ActivityNotifier { sender: tx })
    }
}

/// Host-side handle signalling that the environment became active again.
#[derive(Debug, Clone)]
pub struct ActivityNotifier {
    sender: mpsc::UnboundedSender<()>,
}

impl ActivityNotifier {
    /// Report that the host became active.
    ///
    /// Returns `false` once the client has shut down.
    pub fn became_active(&self) -> bool {
        if self.sender.send(()).is_err() {
            tracing::debug!("Activity signal dropped: stream client is gone");
            return false;
        }
        true
    }
}
