//! CLI command definitions and dispatch.

pub mod config;
pub mod inspect;
pub mod watch;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use stockpulse_core::config::AppConfig;
use stockpulse_core::error::AppError;

/// StockPulse: real-time stock alerts for the point of sale
#[derive(Debug, Parser)]
#[command(name = "stockpulse", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Configuration overlay to apply from `config/<env>.toml`
    #[arg(short, long, env = "STOCKPULSE_ENV")]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Connect to the notification stream and print alerts as they arrive
    Watch(watch::WatchArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Parse an alert payload file and show the resulting notification
    Inspect(inspect::InspectArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let env = self.env.as_deref();
        match &self.command {
            Commands::Watch(args) => watch::execute(args, &self.config, env, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, env, self.format).await,
            Commands::Inspect(args) => inspect::execute(args, &self.config, env, self.format).await,
        }
    }
}

/// Helper: load configuration from file, overlay, and environment
pub async fn load_config(config_path: &str, env: Option<&str>) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path, env)
        .map_err(|e| AppError::configuration(format!("Failed to load config: {}", e)))
}
