//! # salon-calc
//!
//! Command-line front end for the package calculator.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()          RUST_LOG or "info,salon_*=debug"            │
//! │  2. Cli::parse()            quote | sell | watch                        │
//! │  3. AppConfig::load()       SALON_* environment variables               │
//! │  4. Database::new()         open SQLite, apply migrations               │
//! │  5. Stores::load()          package configs, settings, catalog          │
//! │  6. run the command         JSON on stdout, logs on stderr              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod quote;
mod recalc;
mod watch;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use salon_core::types::SaleParty;
use salon_db::{Database, DbConfig};

use crate::config::{AppConfig, Cli, Command};
use crate::quote::Stores;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load()?;
    info!(
        db = %config.database_path.display(),
        debounce_ms = config.debounce_ms,
        "Starting salon-calc"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).run_migrations(config.run_migrations),
    )
    .await
    .context("opening database")?;
    let stores = Stores::load(&db).await.context("loading pricing rules")?;

    match cli.command {
        Command::Quote { request } => {
            let quote = quote::read_quote(&request)?;
            let result = quote::quote(&stores, &quote)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Sell {
            request,
            tier,
            client_id,
            master_id,
        } => {
            let quote = quote::read_quote(&request)?;
            let party = SaleParty { client_id, master_id };
            let sale = quote::sell(&db, &stores, &quote, tier, party).await?;
            println!("{}", serde_json::to_string_pretty(&sale)?);
        }
        Command::Watch => {
            let stdin = BufReader::new(tokio::io::stdin());
            watch::run(&stores, config.debounce(), stdin, tokio::io::stdout()).await?;
        }
    }

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays
/// machine-readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show all debug logs
/// - `RUST_LOG=salon_core=trace` - Trace the pricing engine only
/// - Default: INFO, DEBUG for salon crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,salon_core=debug,salon_db=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
