//! # Package Config Repository
//!
//! One row of package rules per tier. The rate staircase is stored as a
//! JSON column; everything else is a plain INTEGER.
//!
//! A tier without a row is simply absent from [`PackageConfigs`]; the
//! engine reports it as unavailable.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::{column_rate, column_u32};
use salon_core::types::{PackageConfig, PackageConfigs, RateStep, Tier};
use salon_core::validation::validate_package_config;
use salon_core::Money;

/// Row shape of `package_configs`.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PackageConfigRecord {
    tier: Tier,
    discount_rate_bps: i64,
    min_cost_minor: i64,
    min_down_payment_rate_bps: i64,
    min_down_payment_minor: Option<i64>,
    requires_full_payment: bool,
    gift_session_count: i64,
    bonus_account_rate_bps: i64,
    dynamic_rates: String,
}

impl PackageConfigRecord {
    fn into_config(self) -> DbResult<(Tier, PackageConfig)> {
        let dynamic_rates: Vec<RateStep> = serde_json::from_str(&self.dynamic_rates)?;
        let config = PackageConfig {
            discount_rate: column_rate("discount_rate_bps", self.discount_rate_bps)?,
            min_cost: Money::from_minor(self.min_cost_minor),
            min_down_payment_rate: column_rate(
                "min_down_payment_rate_bps",
                self.min_down_payment_rate_bps,
            )?,
            min_down_payment: self.min_down_payment_minor.map(Money::from_minor),
            requires_full_payment: self.requires_full_payment,
            gift_session_count: column_u32("gift_session_count", self.gift_session_count)?,
            bonus_account_rate: column_rate("bonus_account_rate_bps", self.bonus_account_rate_bps)?,
            dynamic_rates,
        };
        validate_package_config(&config)?;
        Ok((self.tier, config))
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        tier,
        discount_rate_bps,
        min_cost_minor,
        min_down_payment_rate_bps,
        min_down_payment_minor,
        requires_full_payment,
        gift_session_count,
        bonus_account_rate_bps,
        dynamic_rates
    FROM package_configs
"#;

/// Repository for per-tier package rules.
#[derive(Debug, Clone)]
pub struct PackageConfigRepository {
    pool: SqlitePool,
}

impl PackageConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PackageConfigRepository { pool }
    }

    /// Loads every configured tier.
    pub async fn load_all(&self) -> DbResult<PackageConfigs> {
        let records = sqlx::query_as::<_, PackageConfigRecord>(SELECT_COLUMNS)
            .fetch_all(&self.pool)
            .await?;

        let configs = records
            .into_iter()
            .map(PackageConfigRecord::into_config)
            .collect::<DbResult<PackageConfigs>>()?;

        debug!(tiers = configs.len(), "Loaded package configs");
        Ok(configs)
    }

    /// Gets one tier's rules, if configured.
    pub async fn get(&self, tier: Tier) -> DbResult<Option<PackageConfig>> {
        let sql = format!("{SELECT_COLUMNS} WHERE tier = ?1");
        let record = sqlx::query_as::<_, PackageConfigRecord>(&sql)
            .bind(tier)
            .fetch_optional(&self.pool)
            .await?;

        record
            .map(|r| r.into_config().map(|(_, config)| config))
            .transpose()
    }

    /// Inserts or replaces a tier's rules.
    pub async fn upsert(&self, tier: Tier, config: &PackageConfig) -> DbResult<()> {
        validate_package_config(config)?;
        let dynamic_rates = serde_json::to_string(&config.dynamic_rates)?;

        info!(%tier, discount_bps = config.discount_rate.bps(), "Saving package config");

        sqlx::query(
            r#"
            INSERT INTO package_configs (
                tier, discount_rate_bps, min_cost_minor,
                min_down_payment_rate_bps, min_down_payment_minor,
                requires_full_payment, gift_session_count,
                bonus_account_rate_bps, dynamic_rates, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (tier) DO UPDATE SET
                discount_rate_bps = excluded.discount_rate_bps,
                min_cost_minor = excluded.min_cost_minor,
                min_down_payment_rate_bps = excluded.min_down_payment_rate_bps,
                min_down_payment_minor = excluded.min_down_payment_minor,
                requires_full_payment = excluded.requires_full_payment,
                gift_session_count = excluded.gift_session_count,
                bonus_account_rate_bps = excluded.bonus_account_rate_bps,
                dynamic_rates = excluded.dynamic_rates,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(tier)
        .bind(i64::from(config.discount_rate.bps()))
        .bind(config.min_cost.minor())
        .bind(i64::from(config.min_down_payment_rate.bps()))
        .bind(config.min_down_payment.map(|m| m.minor()))
        .bind(config.requires_full_payment)
        .bind(i64::from(config.gift_session_count))
        .bind(i64::from(config.bonus_account_rate.bps()))
        .bind(dynamic_rates)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
