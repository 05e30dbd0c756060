//! # salon-db: Database Layer for the Salon Calculator
//!
//! SQLite storage (via sqlx) for the collaborators of the pricing engine:
//! per-tier package rules, calculator settings, the service catalog, and the
//! append-only log of confirmed sales.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Salon Calculator Data Flow                        │
//! │                                                                         │
//! │  salon-calc quote / sell                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     salon-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │◄───│ PackageConfigRepo  │  │            │  │   │
//! │  │   │  SqlitePool   │    │ SettingsRepo       │  │ 001_init   │  │   │
//! │  │   │               │    │ ServiceRepo        │  │            │  │   │
//! │  │   │               │    │ SaleRepo           │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (salon.db)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salon_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("salon.db")).await?;
//!
//! let configs = db.package_configs().load_all().await?;
//! let settings = db.settings().load().await?;
//! let catalog = db.services().catalog().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::package_config::PackageConfigRepository;
pub use repository::sale::SaleRepository;
pub use repository::service::{Service, ServiceRepository};
pub use repository::settings::{SettingsRepository, SettingKey};
