//! # Database Handle
//!
//! Opens the SQLite store and hands out repositories.
//!
//! ```text
//! DbConfig::new(path) | DbConfig::in_memory()
//!        │
//!        ▼
//! Database::new(config) ── open pool ── apply migrations (unless disabled)
//!        │
//!        ▼
//! db.package_configs() / settings() / services() / sales()
//! ```
//!
//! `salon-calc` runs one command per process, so the pool stays small. An
//! in-memory store is a single connection: every connection to `:memory:`
//! would otherwise see its own empty database.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::package_config::PackageConfigRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::service::ServiceRepository;
use crate::repository::settings::SettingsRepository;

const IN_MEMORY: &str = ":memory:";
const FILE_POOL_SIZE: u32 = 4;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the store lives and whether to migrate it on open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// SQLite file, created if missing.
    pub database_path: PathBuf,

    /// Apply pending migrations in [`Database::new`]. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            run_migrations: true,
        }
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// A private, migrated store that disappears with the handle. Used by
    /// tests.
    pub fn in_memory() -> Self {
        DbConfig::new(IN_MEMORY)
    }

    fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };
        Ok(options.foreign_keys(true))
    }

    fn pool_size(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            FILE_POOL_SIZE
        }
    }
}

/// Handle to the store. Cheap to clone; repositories hold their own pool
/// handle.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store and, unless disabled, brings its schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let pool_size = config.pool_size();
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .min_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(pool_size, "Database pool created");

        if config.run_migrations {
            migrations::run_migrations(&pool).await?;
        }

        Ok(Database { pool })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Per-tier package rules.
    pub fn package_configs(&self) -> PackageConfigRepository {
        PackageConfigRepository::new(self.pool.clone())
    }

    /// Calculator settings (key/value).
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Service catalog.
    pub fn services(&self) -> ServiceRepository {
        ServiceRepository::new(self.pool.clone())
    }

    /// Append-only sale log.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        debug!("Closing database");
        self.pool.close().await;
    }
}
