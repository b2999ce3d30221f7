//! StockPulse watcher
//!
//! Long-running process that keeps the stock alert stream open and logs
//! every connection change and incoming alert.

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use stockpulse_core::config::AppConfig;
use stockpulse_core::error::AppError;
use stockpulse_realtime::{
    ActivityNotifier, ClientSettings, EnvironmentTriggers, NotificationStreamClient, SseTransport,
    StreamSnapshot,
};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Watcher error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay, and variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("STOCKPULSE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    let env = std::env::var("STOCKPULSE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = AppConfig::load(&config_path, Some(&env))?;
    config.validate()?;
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Main watcher run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting StockPulse watcher v{}", env!("CARGO_PKG_VERSION"));

    if !config.stream.enabled {
        tracing::warn!("Notification stream is disabled; nothing to watch");
        return Ok(());
    }

    let settings = ClientSettings::from_config(&config.stream)?;
    let transport = SseTransport::new(config.stream.auth_token.clone())?;
    let (triggers, notifier) =
        EnvironmentTriggers::with_activity(config.stream.health_check_interval());
    let client = NotificationStreamClient::spawn(settings, transport, triggers);

    listen_for_activity(notifier);
    let reporter = tokio::spawn(report_changes(client.subscribe()));

    tracing::info!(
        "Watching {}{}",
        config.stream.base_url,
        config.stream.path
    );
    client.start();

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {}", e)))?;

    tracing::info!("Shutdown signal received, stopping...");
    client.shutdown().await;
    reporter.abort();
    tracing::info!("StockPulse watcher stopped");

    Ok(())
}

/// Log status transitions and alerts as snapshots change
async fn report_changes(mut updates: watch::Receiver<StreamSnapshot>) {
    let mut last_status = String::new();
    let mut last_head = None;

    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();

        let status = snapshot.status_message();
        if status != last_status {
            match &snapshot.last_error {
                Some(error) if !snapshot.is_connected => {
                    tracing::warn!("Stream status: {} ({})", status, error);
                }
                _ => tracing::info!("Stream status: {}", status),
            }
            last_status = status;
        }

        let head = snapshot.notifications.first().map(|n| (n.id, n.occurred_at));
        if head != last_head {
            if let Some(n) = snapshot.notifications.first() {
                tracing::info!(
                    "Stock alert: {} ({} products, {} unread)",
                    n.message,
                    n.items.len(),
                    snapshot.unread_count
                );
            }
            last_head = head;
        }
    }
}

/// SIGUSR1 tells the client the host became active again
#[cfg(unix)]
fn listen_for_activity(notifier: ActivityNotifier) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut signals = match signal(SignalKind::user_defined1()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("SIGUSR1 unavailable, activity trigger disabled: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        while signals.recv().await.is_some() {
            tracing::debug!("SIGUSR1 received, checking stream connection");
            if !notifier.became_active() {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn listen_for_activity(_notifier: ActivityNotifier) {}
