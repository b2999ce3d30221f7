//! # stockpulse-realtime
//!
//! Real-time stock alert client for StockPulse. Provides:
//!
//! - Server-Sent-Events framing and an HTTP transport built on `reqwest`
//! - Alert parsing into deduplicated, capacity-bounded notifications
//! - Read/unread bookkeeping
//! - A supervised connection with capped exponential backoff, an open
//!   timeout, and passive health checks

pub mod client;
pub mod connection;
pub mod message;
pub mod notification;

pub use client::{ClientSettings, NotificationStreamClient, StreamSnapshot};
pub use connection::http::SseTransport;
pub use connection::state::ConnectionState;
pub use connection::transport::Transport;
pub use connection::triggers::{ActivityNotifier, EnvironmentTriggers};
pub use notification::model::{AlertItem, Notification, NotificationId};
