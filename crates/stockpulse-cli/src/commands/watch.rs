//! Live view of the notification stream.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Args;
use tracing;

use crate::output::{self, NotificationRow, OutputFormat};
use stockpulse_core::error::AppError;
use stockpulse_realtime::{
    AlertItem, ClientSettings, EnvironmentTriggers, Notification, NotificationId,
    NotificationStreamClient, SseTransport, StreamSnapshot,
};

/// Arguments for the watch command
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many new or updated notifications
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Exit after this many seconds
    #[arg(short, long)]
    pub duration: Option<u64>,
}

/// Execute the watch command
pub async fn execute(
    args: &WatchArgs,
    config_path: &str,
    env: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path, env).await?;
    config.validate()?;

    if !config.stream.enabled {
        output::print_warning("Notification stream is disabled in the configuration.");
        return Ok(());
    }

    let settings = ClientSettings::from_config(&config.stream)?;
    let transport = SseTransport::new(config.stream.auth_token.clone())?;
    let triggers = EnvironmentTriggers::new(config.stream.health_check_interval());
    let client = NotificationStreamClient::spawn(settings, transport, triggers);

    if format == OutputFormat::Table {
        println!(
            "Watching {}{} (Ctrl-C to stop)",
            config.stream.base_url, config.stream.path
        );
    }

    let mut updates = client.subscribe();
    client.start();

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut tracker = ChangeTracker::default();
    let mut last_status = String::new();
    let mut received = 0usize;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();

                let status = snapshot.status_message();
                if status != last_status {
                    tracing::debug!(
                        "Stream state {} (attempt {}/{}, {} unread)",
                        snapshot.state,
                        snapshot.retry_attempt,
                        snapshot.max_attempts,
                        snapshot.unread_count
                    );
                    print_status(&status, &snapshot, format);
                    last_status = status;
                }

                let rows = tracker.changed_rows(&snapshot.notifications);
                if !rows.is_empty() {
                    received += rows.len();
                    output::print_list(&rows, format);
                }

                if args.count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
            _ = &mut deadline => break,
            _ = &mut ctrl_c => break,
        }
    }

    tracing::debug!("Stopping watch after {} notifications", received);
    client.shutdown().await;
    if format == OutputFormat::Table {
        output::print_success(&format!("Received {} notifications", received));
    }
    Ok(())
}

fn print_status(status: &str, snapshot: &StreamSnapshot, format: OutputFormat) {
    // Keep stdout machine-readable in JSON mode.
    if format == OutputFormat::Json {
        eprintln!("{}", status);
        return;
    }
    match &snapshot.last_error {
        Some(error) if !snapshot.is_connected => {
            output::print_kv("Status", &format!("{} ({})", status, error));
        }
        _ => output::print_kv("Status", status),
    }
}

/// Remembers what has been printed so merges show up again.
#[derive(Debug, Default)]
struct ChangeTracker {
    seen: HashMap<NotificationId, (DateTime<Utc>, Vec<AlertItem>)>,
}

impl ChangeTracker {
    fn changed_rows(&mut self, notifications: &[Notification]) -> Vec<NotificationRow> {
        let mut rows = Vec::new();
        for n in notifications {
            let current = (n.occurred_at, n.items.clone());
            if self.seen.get(&n.id) != Some(&current) {
                rows.push(NotificationRow::from(n));
                self.seen.insert(n.id, current);
            }
        }
        self.seen
            .retain(|id, _| notifications.iter().any(|n| n.id == *id));
        rows
    }
}
