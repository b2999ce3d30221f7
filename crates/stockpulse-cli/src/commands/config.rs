//! Configuration management CLI commands.

use std::path::Path;

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use stockpulse_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
        /// Overwrite an existing file without asking
        #[arg(long)]
        force: bool,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    env: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path, env).await?;
            if config.stream.auth_token.is_some() {
                config.stream.auth_token = Some("****".to_string());
            }
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => {
            let config = match super::load_config(config_path, env).await {
                Ok(config) => config,
                Err(e) => {
                    output::print_error(&format!("Configuration invalid: {}", e));
                    return Err(e);
                }
            };
            if let Err(e) = config.validate() {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }

            let stream = &config.stream;
            let reconnect = &stream.reconnect;
            output::print_success(&format!("Configuration '{}' is valid", config_path));
            output::print_kv("Stream", &format!("{}{}", stream.base_url, stream.path));
            output::print_kv("Enabled", &stream.enabled.to_string());
            output::print_kv(
                "Events",
                &format!("{} / {}", stream.event_name, stream.alert_event),
            );
            output::print_kv("Capacity", &stream.capacity.to_string());
            output::print_kv(
                "Reconnect",
                &format!(
                    "{}ms x{} up to {}ms, {} attempts",
                    reconnect.base_delay_ms,
                    reconnect.factor,
                    reconnect.max_delay_ms,
                    reconnect.max_attempts
                ),
            );
            output::print_kv(
                "Logging",
                &format!("{} ({})", config.logging.level, config.logging.format),
            );
        }
        ConfigCommand::Generate {
            output: out_path,
            force,
        } => {
            let default_config = include_str!("../../../../config/default.toml");

            if !force && Path::new(out_path).exists() {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("'{}' already exists. Overwrite?", out_path))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

                if !confirm {
                    output::print_warning("Cancelled.");
                    return Ok(());
                }
            }

            if let Some(parent) = Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::internal(format!("Failed to create dir: {}", e)))?;
            }

            tokio::fs::write(out_path, default_config)
                .await
                .map_err(|e| AppError::internal(format!("Failed to write config: {}", e)))?;

            output::print_success(&format!("Default config written to '{}'", out_path));
        }
    }

    Ok(())
}
