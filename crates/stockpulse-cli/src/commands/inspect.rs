//! Offline parsing of alert payloads.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;

use crate::output::{self, OutputFormat, ProductRow};
use stockpulse_core::error::AppError;
use stockpulse_realtime::notification::AlertParser;

/// Arguments for the inspect command
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// JSON payload file, as carried in the `data` field of an SSE event
    pub file: PathBuf,

    /// Alert tag to accept instead of the configured one
    #[arg(long)]
    pub alert_event: Option<String>,
}

/// Execute the inspect command
pub async fn execute(
    args: &InspectArgs,
    config_path: &str,
    env: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path, env).await?;

    let contents = tokio::fs::read_to_string(&args.file).await.map_err(|e| {
        AppError::internal(format!("Failed to read '{}': {}", args.file.display(), e))
    })?;

    let parser = match &args.alert_event {
        Some(tag) => AlertParser::new(&config.stream.event_name, tag),
        None => AlertParser::from_config(&config.stream),
    };

    let Some(notification) = parser.parse_payload(&contents, Utc::now())? else {
        output::print_warning("Payload is valid JSON but not a stock alert; the client ignores it.");
        return Ok(());
    };

    match format {
        OutputFormat::Json => output::print_item(&notification, format),
        OutputFormat::Table => {
            output::print_kv("Kind", &notification.kind);
            output::print_kv("Message", &notification.message);
            output::print_kv("Occurred at", &notification.occurred_at.to_rfc3339());
            output::print_kv("Fingerprint", notification.fingerprint.as_str());
            let rows: Vec<ProductRow> = notification.items.iter().map(ProductRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
