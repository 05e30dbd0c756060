//! Calculator configuration.
//!
//! Runtime settings come from `SALON_*` environment variables with fallback
//! to defaults. Business tunables (discounts, installment options) are NOT
//! here; they live in the database.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use salon_core::Tier;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Quiet period before recalculating while a value is being dragged
    pub debounce_ms: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = AppConfig {
            database_path: lookup("SALON_DB_PATH")
                .unwrap_or_else(|| "./salon.db".to_string())
                .into(),

            debounce_ms: lookup("SALON_DEBOUNCE_MS")
                .unwrap_or_else(|| "100".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SALON_DEBOUNCE_MS".to_string()))?,

            run_migrations: lookup("SALON_RUN_MIGRATIONS")
                .unwrap_or_else(|| "true".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SALON_RUN_MIGRATIONS".to_string()))?,
        };

        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("SALON_DB_PATH".to_string()));
        }

        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Salon package calculator.
#[derive(Debug, Parser)]
#[command(
    name = "salon-calc",
    version,
    about = "Salon package calculator",
    after_help = "\
Environment:
  SALON_DB_PATH          database file (default: ./salon.db)
  SALON_DEBOUNCE_MS      watch-mode debounce while dragging (default: 100)
  SALON_RUN_MIGRATIONS   apply migrations on startup (default: true)
  RUST_LOG               log filter (default: info)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Price a quote file and print the result
    Quote {
        /// Quote request JSON file
        request: PathBuf,
    },
    /// Price, select a tier, confirm and record the sale
    Sell {
        /// Quote request JSON file
        request: PathBuf,
        /// Package tier (vip, standard, economy)
        #[arg(short, long)]
        tier: Tier,
        /// Client identifier
        #[arg(short, long = "client")]
        client_id: String,
        /// Master identifier
        #[arg(short, long = "master")]
        master_id: String,
    },
    /// Recalculate {"request": ..., "dragging": bool} lines read from stdin
    Watch,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
