//! # Repository Module
//!
//! Database repository implementations for the salon calculator.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  salon-calc                                                            │
//! │       │                                                                 │
//! │       │  db.package_configs().load_all()                               │
//! │       ▼                                                                 │
//! │  PackageConfigRepository                                               │
//! │  ├── load_all / get / upsert                                           │
//! │       │                                                                 │
//! │       │  SQL Query → *Record (FromRow) → salon-core type               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository converts its row records into `salon-core` types and
//! runs the core validators on the way in and out, so nothing malformed
//! reaches the pricing engine from storage.
//!
//! ## Available Repositories
//!
//! - [`PackageConfigRepository`](package_config::PackageConfigRepository) - One rule set per tier
//! - [`SettingsRepository`](settings::SettingsRepository) - Calculator tunables
//! - [`ServiceRepository`](service::ServiceRepository) - Service catalog
//! - [`SaleRepository`](sale::SaleRepository) - Append-only sale log

pub mod package_config;
pub mod sale;
pub mod service;
pub mod settings;

use salon_core::types::Rate;

use crate::error::{DbError, DbResult};

/// Narrows an INTEGER column to `u32`.
pub(crate) fn column_u32(column: &str, value: i64) -> DbResult<u32> {
    u32::try_from(value)
        .map_err(|_| DbError::InvalidData(format!("{column} out of range: {value}")))
}

/// Reads a basis-point column.
pub(crate) fn column_rate(column: &str, value: i64) -> DbResult<Rate> {
    column_u32(column, value).map(Rate::from_bps)
}
