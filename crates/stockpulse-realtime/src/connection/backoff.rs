//! Capped exponential backoff for reconnect attempts.

use std::time::Duration;

use stockpulse_core::config::stream::ReconnectConfig;

/// Reconnect policy: multiplicative growth from a base delay, capped per
/// attempt, with a limit on consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor applied per failure.
    pub factor: f64,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Consecutive failures after which retries stop.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            factor: 1.5,
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            factor: config.factor,
            max_delay: config.max_delay(),
            max_attempts: config.max_attempts,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (1-based):
    /// `min(base * factor^(attempt - 1), max)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = if self.factor.is_finite() {
            self.factor.max(1.0)
        } else {
            1.0
        };
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max = self.max_delay.as_secs_f64();
        let secs = (self.base_delay.as_secs_f64() * factor.powi(exponent)).min(max);
        Duration::from_secs_f64(secs)
    }
}

/// What to do after a failed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule retry number `attempt` after `delay`.
    Retry {
        /// Consecutive failures so far.
        attempt: u32,
        /// Wait before the next connection attempt.
        delay: Duration,
    },
    /// Stop retrying automatically.
    Exhausted {
        /// Consecutive failures so far.
        attempts: u32,
    },
}

/// Tracks consecutive failures against a [`ReconnectPolicy`].
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempt: u32,
    delay: Duration,
}

impl Backoff {
    /// Start with zero failures and the base delay.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            delay: policy.base_delay,
            policy,
            attempt: 0,
        }
    }

    /// Record a failure and decide whether to retry.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.attempt = self.attempt.saturating_add(1);
        if self.attempt >= self.policy.max_attempts {
            return RetryDecision::Exhausted {
                attempts: self.attempt,
            };
        }
        self.delay = self.policy.delay_for_attempt(self.attempt);
        RetryDecision::Retry {
            attempt: self.attempt,
            delay: self.delay,
        }
    }

    /// Back to zero failures and the base delay.
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.delay = self.policy.base_delay;
    }

    /// Consecutive failures recorded since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay of the most recently scheduled retry, or the base delay.
    pub fn current_delay(&self) -> Duration {
        self.delay
    }

    /// The policy in force.
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }
}
