//! Notification stream client.
//!
//! [`NotificationStreamClient`] is a cheap, cloneable handle to a background
//! task that owns the connection and the notification list. Handles send
//! commands; consumers observe state through a `watch` channel of
//! [`StreamSnapshot`]s.

mod actor;
pub mod settings;
pub mod snapshot;

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing;

use crate::connection::transport::Transport;
use crate::connection::triggers::EnvironmentTriggers;
use crate::notification::model::NotificationId;

use actor::{Command, StreamActor};

pub use settings::ClientSettings;
pub use snapshot::StreamSnapshot;

/// Handle to a running notification stream client.
#[derive(Debug, Clone)]
pub struct NotificationStreamClient {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<StreamSnapshot>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl NotificationStreamClient {
    /// Spawn the client task. The client stays idle until [`start`](Self::start).
    pub fn spawn<T: Transport>(
        settings: ClientSettings,
        transport: T,
        triggers: EnvironmentTriggers,
    ) -> Self {
        Self::spawn_shared(settings, Arc::new(transport), triggers)
    }

    /// Spawn the client task with a shared transport.
    pub fn spawn_shared(
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
        triggers: EnvironmentTriggers,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(StreamSnapshot {
            max_attempts: settings.policy.max_attempts,
            ..StreamSnapshot::default()
        });

        let actor = StreamActor::new(settings, transport, snapshot_tx);
        let task = tokio::spawn(actor.run(command_rx, triggers));

        Self {
            commands: command_tx,
            snapshot: snapshot_rx,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    /// Open the connection if it is not already open or opening.
    ///
    /// Once retries are exhausted only [`reconnect_now`](Self::reconnect_now)
    /// connects again.
    pub fn start(&self) {
        self.send(Command::Start);
    }

    /// Close the connection and cancel any pending retry.
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Reset the retry counter and connect immediately.
    pub fn reconnect_now(&self) {
        self.send(Command::ReconnectNow);
    }

    /// Mark one notification as read. Unknown identifiers are ignored.
    pub fn mark_as_read(&self, id: NotificationId) {
        self.send(Command::MarkAsRead(id));
    }

    /// Mark every notification as read.
    pub fn mark_all_as_read(&self) {
        self.send(Command::MarkAllAsRead);
    }

    /// Remove every notification. The connection is left alone.
    pub fn clear_all(&self) {
        self.send(Command::ClearAll);
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot> {
        self.snapshot.clone()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> StreamSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Whether the connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.snapshot.borrow().is_connected
    }

    /// Number of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.snapshot.borrow().unread_count
    }

    /// Stop the client task and wait for it to release its connection.
    pub async fn shutdown(&self) {
        self.send(Command::Shutdown);
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                tracing::error!("Notification stream task failed: {}", e);
            }
        }
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            tracing::debug!("Stream client is shut down; dropped {:?}", e.0);
        }
    }
}
