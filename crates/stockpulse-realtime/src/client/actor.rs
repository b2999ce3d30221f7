//! Task that exclusively owns the connection, the retry timer, and the
//! notification list.
//!
//! Every transition happens inside [`StreamActor::run`], one event at a
//! time: commands from handles, connection results, inbound messages, the
//! retry timer, and health-check triggers. At most one connect future, one
//! open stream, and one retry timer exist at any moment; each is dropped
//! before a replacement is created.

use std::future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior, Sleep};
use tracing;

use stockpulse_core::error::AppError;
use stockpulse_core::result::AppResult;

use crate::connection::backoff::{Backoff, RetryDecision};
use crate::connection::state::ConnectionState;
use crate::connection::transport::{EventStream, Transport};
use crate::connection::triggers::EnvironmentTriggers;
use crate::message::sse::SseMessage;
use crate::notification::model::NotificationId;
use crate::notification::store::{IngestOutcome, NotificationStore};

use super::settings::ClientSettings;
use super::snapshot::StreamSnapshot;

/// Requests sent from handles to the actor.
#[derive(Debug)]
pub(crate) enum Command {
    Start,
    Stop,
    ReconnectNow,
    MarkAsRead(NotificationId),
    MarkAllAsRead,
    ClearAll,
    Shutdown,
}

type ConnectFuture = BoxFuture<'static, AppResult<EventStream>>;

pub(crate) struct StreamActor {
    settings: ClientSettings,
    transport: Arc<dyn Transport>,
    store: NotificationStore,
    backoff: Backoff,
    state: ConnectionState,
    /// Set by `start`, cleared by `stop`; gates retries and health checks.
    started: bool,
    last_error: Option<String>,
    connecting: Option<ConnectFuture>,
    stream: Option<EventStream>,
    retry_timer: Option<Pin<Box<Sleep>>>,
    snapshot: watch::Sender<StreamSnapshot>,
}

impl StreamActor {
    pub(crate) fn new(
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
        snapshot: watch::Sender<StreamSnapshot>,
    ) -> Self {
        Self {
            store: NotificationStore::new(settings.capacity),
            backoff: Backoff::new(settings.policy),
            settings,
            transport,
            state: ConnectionState::Idle,
            started: false,
            last_error: None,
            connecting: None,
            stream: None,
            retry_timer: None,
            snapshot,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        triggers: EnvironmentTriggers,
    ) {
        let EnvironmentTriggers {
            health_check_interval,
            mut became_active,
        } = triggers;
        let period = health_check_interval.max(Duration::from_millis(1));
        let mut health = time::interval_at(Instant::now() + period, period);
        health.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.publish();
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                result = pending_connect(&mut self.connecting) => self.on_connect_result(result),
                item = next_message(&mut self.stream) => self.on_stream_item(item),
                () = retry_elapsed(&mut self.retry_timer) => self.on_retry_timer(),
                _ = health.tick() => self.health_check("interval"),
                signal = activity_signal(&mut became_active) => match signal {
                    Some(()) => self.health_check("became active"),
                    None => became_active = None,
                },
            }
            self.publish();
        }

        self.stop();
        self.publish();
        tracing::debug!("Notification stream client shut down");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Stop | Command::Shutdown => self.stop(),
            Command::ReconnectNow => self.reconnect_now(),
            Command::MarkAsRead(id) => {
                if !self.store.mark_as_read(id) {
                    tracing::trace!("Notification {} not found or already read", id);
                }
            }
            Command::MarkAllAsRead => {
                let changed = self.store.mark_all_as_read();
                tracing::debug!("Marked {} notifications as read", changed);
            }
            Command::ClearAll => {
                tracing::debug!("Clearing {} notifications", self.store.len());
                self.store.clear_all();
            }
        }
    }

    fn start(&mut self) {
        if !self.settings.enabled {
            tracing::info!("Notification stream is disabled; not connecting");
            return;
        }
        self.started = true;
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                tracing::trace!("Start ignored: connection is {}", self.state);
            }
            ConnectionState::ClosedExhausted => {
                tracing::info!("Retries exhausted; waiting for a manual reconnect");
            }
            ConnectionState::Idle | ConnectionState::ClosedRetrying => self.connect(),
        }
    }

    fn stop(&mut self) {
        self.started = false;
        self.release();
        if self.state != ConnectionState::Idle {
            tracing::info!("Notification stream stopped");
        }
        self.state = ConnectionState::Idle;
    }

    fn reconnect_now(&mut self) {
        tracing::info!("Manual reconnect requested");
        self.backoff.reset();
        self.retry_timer = None;
        if self.state == ConnectionState::ClosedExhausted {
            self.state = ConnectionState::Idle;
        }
        self.start();
    }

    /// Drop the retry timer, the pending connect, and the open stream.
    fn release(&mut self) {
        self.retry_timer = None;
        self.connecting = None;
        self.stream = None;
    }

    fn connect(&mut self) {
        self.release();

        let url = match self.settings.endpoint.url() {
            Ok(url) => url,
            Err(e) => {
                self.on_failure(e);
                return;
            }
        };

        tracing::debug!(
            "Connecting to notification stream at {} (failures so far: {})",
            url,
            self.backoff.attempt()
        );

        let transport = Arc::clone(&self.transport);
        let open_timeout = self.settings.open_timeout;
        self.state = ConnectionState::Connecting;
        self.connecting = Some(Box::pin(async move {
            match time::timeout(open_timeout, transport.connect(&url)).await {
                Ok(result) => result,
                Err(_) => Err(AppError::timeout(format!(
                    "Notification stream did not open within {}s",
                    open_timeout.as_secs()
                ))),
            }
        }));
    }

    fn on_connect_result(&mut self, result: AppResult<EventStream>) {
        self.connecting = None;
        match result {
            Ok(stream) => {
                if self.backoff.attempt() > 0 {
                    tracing::info!(
                        "Notification stream reconnected after {} failed attempts",
                        self.backoff.attempt()
                    );
                } else {
                    tracing::info!("Notification stream connected");
                }
                self.stream = Some(stream);
                self.state = ConnectionState::Open;
                self.backoff.reset();
                self.last_error = None;
            }
            Err(e) => self.on_failure(e),
        }
    }

    fn on_stream_item(&mut self, item: Option<AppResult<SseMessage>>) {
        match item {
            Some(Ok(message)) => self.handle_message(&message),
            Some(Err(e)) => self.on_failure(e),
            None => self.on_failure(AppError::transport("Notification stream closed by server")),
        }
    }

    fn on_failure(&mut self, error: AppError) {
        self.release();

        match self.backoff.record_failure() {
            RetryDecision::Retry { attempt, delay } => {
                tracing::warn!(
                    "Notification stream unavailable ({}); retry {}/{} in {:?}",
                    error.message,
                    attempt,
                    self.backoff.policy().max_attempts,
                    delay
                );
                self.state = ConnectionState::ClosedRetrying;
                self.last_error = Some(error.message);
                self.retry_timer = Some(Box::pin(time::sleep(delay)));
            }
            RetryDecision::Exhausted { attempts } => {
                tracing::error!(
                    "Notification stream gave up after {} failed attempts: {}",
                    attempts,
                    error.message
                );
                self.state = ConnectionState::ClosedExhausted;
                self.last_error = Some(format!(
                    "Gave up after {attempts} failed attempts: {}",
                    error.message
                ));
            }
        }
    }

    fn on_retry_timer(&mut self) {
        self.retry_timer = None;
        if self.started && self.state == ConnectionState::ClosedRetrying {
            self.connect();
        }
    }

    /// Reconnect early while a retry is pending. Does not reset the failure
    /// count, and never leaves `ClosedExhausted`.
    fn health_check(&mut self, reason: &str) {
        if !self.started || self.state != ConnectionState::ClosedRetrying {
            return;
        }
        tracing::info!(
            "Health check ({}): stream is {}, reconnecting",
            reason,
            self.state
        );
        self.connect();
    }

    fn handle_message(&mut self, message: &SseMessage) {
        match self.settings.parser.parse(message, Utc::now()) {
            Ok(Some(notification)) => match self.store.ingest(notification) {
                IngestOutcome::Inserted(id) => {
                    tracing::debug!("New notification {}", id);
                }
                IngestOutcome::Merged(id) => {
                    tracing::debug!("Notification {} refreshed by a repeated alert", id);
                }
                IngestOutcome::InsertedWithEviction { inserted, evicted } => {
                    tracing::debug!("New notification {}, evicted {}", inserted, evicted);
                }
            },
            Ok(None) => tracing::debug!("Ignoring '{}' event", message.event),
            Err(e) => tracing::warn!("Dropping malformed notification event: {}", e),
        }
    }

    fn publish(&self) {
        let next = StreamSnapshot {
            notifications: self.store.to_vec(),
            unread_count: self.store.unread_count(),
            alert_items: self.store.alert_items(),
            is_connected: self.state.is_connected(),
            state: self.state,
            last_error: self.last_error.clone(),
            retry_attempt: self.backoff.attempt(),
            max_attempts: self.backoff.policy().max_attempts,
            retry_delay: match self.state {
                ConnectionState::ClosedRetrying => self.backoff.current_delay(),
                _ => Duration::ZERO,
            },
        };
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn pending_connect(connecting: &mut Option<ConnectFuture>) -> AppResult<EventStream> {
    match connecting {
        Some(fut) => fut.await,
        None => future::pending().await,
    }
}

async fn next_message(stream: &mut Option<EventStream>) -> Option<AppResult<SseMessage>> {
    match stream {
        Some(stream) => stream.next().await,
        None => future::pending().await,
    }
}

async fn retry_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => future::pending().await,
    }
}

async fn activity_signal(rx: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match rx {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}
