//! # Settings Repository
//!
//! Calculator tunables stored as key/value text rows.
//!
//! ```text
//! key                       value        meaning
//! ───────────────────────── ──────────── ─────────────────────────────
//! minimum_down_payment      500000       kopecks
//! bulk_discount_threshold   15           procedures
//! bulk_discount_rate        250          basis points
//! certificate_discount      300000       kopecks
//! certificate_min_course    2500000      kopecks
//! installment_months        3,6,10,12    comma-separated months
//! ```
//!
//! Missing keys fall back to [`CalculatorSettings::default`]. Unknown keys
//! are ignored. A value that does not parse is an error, never a silent
//! default.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use salon_core::types::{CalculatorSettings, Rate};
use salon_core::validation::validate_settings;
use salon_core::Money;

/// Known settings keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    MinimumDownPayment,
    BulkDiscountThreshold,
    BulkDiscountRate,
    CertificateDiscount,
    CertificateMinCourse,
    InstallmentMonths,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::MinimumDownPayment,
        SettingKey::BulkDiscountThreshold,
        SettingKey::BulkDiscountRate,
        SettingKey::CertificateDiscount,
        SettingKey::CertificateMinCourse,
        SettingKey::InstallmentMonths,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            SettingKey::MinimumDownPayment => "minimum_down_payment",
            SettingKey::BulkDiscountThreshold => "bulk_discount_threshold",
            SettingKey::BulkDiscountRate => "bulk_discount_rate",
            SettingKey::CertificateDiscount => "certificate_discount",
            SettingKey::CertificateMinCourse => "certificate_min_course",
            SettingKey::InstallmentMonths => "installment_months",
        }
    }

    /// Parses `value` and writes it into `settings`.
    fn apply(&self, value: &str, settings: &mut CalculatorSettings) -> DbResult<()> {
        let invalid = |reason: &str| DbError::invalid_setting(self.as_str(), value, reason);
        let trimmed = value.trim();

        match self {
            SettingKey::MinimumDownPayment => {
                settings.minimum_down_payment = parse_money(trimmed).map_err(|r| invalid(r))?
            }
            SettingKey::BulkDiscountThreshold => {
                settings.bulk_discount_threshold =
                    trimmed.parse().map_err(|_| invalid("expected a whole number"))?
            }
            SettingKey::BulkDiscountRate => {
                let bps: u32 = trimmed.parse().map_err(|_| invalid("expected basis points"))?;
                if bps > Rate::SCALE {
                    return Err(invalid("rate above 10000 bps"));
                }
                settings.bulk_discount_rate = Rate::from_bps(bps)
            }
            SettingKey::CertificateDiscount => {
                settings.certificate_discount = parse_money(trimmed).map_err(|r| invalid(r))?
            }
            SettingKey::CertificateMinCourse => {
                settings.certificate_min_course = parse_money(trimmed).map_err(|r| invalid(r))?
            }
            SettingKey::InstallmentMonths => {
                settings.installment_month_options =
                    parse_months(trimmed).map_err(|r| invalid(r))?
            }
        }
        Ok(())
    }

    /// Renders the stored text for `settings`' value of this key.
    fn render(&self, settings: &CalculatorSettings) -> String {
        match self {
            SettingKey::MinimumDownPayment => settings.minimum_down_payment.minor().to_string(),
            SettingKey::BulkDiscountThreshold => settings.bulk_discount_threshold.to_string(),
            SettingKey::BulkDiscountRate => settings.bulk_discount_rate.bps().to_string(),
            SettingKey::CertificateDiscount => settings.certificate_discount.minor().to_string(),
            SettingKey::CertificateMinCourse => {
                settings.certificate_min_course.minor().to_string()
            }
            SettingKey::InstallmentMonths => settings
                .installment_month_options
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| DbError::invalid_setting(s, "", "unknown setting key"))
    }
}

fn parse_money(value: &str) -> Result<Money, &'static str> {
    let minor: i64 = value.parse().map_err(|_| "expected an amount in kopecks")?;
    if minor < 0 {
        return Err("amount must not be negative");
    }
    Ok(Money::from_minor(minor))
}

fn parse_months(value: &str) -> Result<Vec<u32>, &'static str> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|part| match part.trim().parse::<u32>() {
            Ok(0) => Err("installment length must be positive"),
            Ok(months) => Ok(months),
            Err(_) => Err("expected comma-separated months"),
        })
        .collect()
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SettingRecord {
    key: String,
    value: String,
}

/// Repository for calculator settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads settings, filling missing keys with defaults.
    pub async fn load(&self) -> DbResult<CalculatorSettings> {
        let records = sqlx::query_as::<_, SettingRecord>(
            "SELECT key, value FROM calculator_settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut settings = CalculatorSettings::default();
        for record in records {
            match record.key.parse::<SettingKey>() {
                Ok(key) => key.apply(&record.value, &mut settings)?,
                Err(_) => warn!(key = %record.key, "Ignoring unknown setting"),
            }
        }

        let settings = settings.normalized();
        validate_settings(&settings)?;
        debug!(?settings, "Loaded calculator settings");
        Ok(settings)
    }

    /// Stores one setting after checking that it parses.
    pub async fn set(&self, key: SettingKey, value: &str) -> DbResult<()> {
        key.apply(value, &mut CalculatorSettings::default())?;

        info!(%key, value, "Saving setting");
        write_setting(&self.pool, key, value.trim()).await
    }

    /// Writes every key from `settings` in one transaction.
    pub async fn save(&self, settings: &CalculatorSettings) -> DbResult<()> {
        validate_settings(settings)?;

        let mut tx = self.pool.begin().await?;
        for key in SettingKey::ALL {
            write_setting(&mut *tx, key, &key.render(settings)).await?;
        }
        tx.commit().await?;

        info!("Saved calculator settings");
        Ok(())
    }
}

async fn write_setting<'e, E>(executor: E, key: SettingKey, value: &str) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO calculator_settings (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key.as_str())
    .bind(value)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
