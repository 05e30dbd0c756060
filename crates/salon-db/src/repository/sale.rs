//! # Sale Repository
//!
//! Append-only log of confirmed packages.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CONFIRM (salon-core)                                               │
//! │     └── PackageSelector::confirm() → NewSale (validated snapshot)      │
//! │                                                                         │
//! │  2. RECORD (this module)                                               │
//! │     └── record(&NewSale) → Sale { id: uuid v4, created_at: now }       │
//! │                                                                         │
//! │  3. READ                                                               │
//! │     └── get_by_id() / list_for_client()                                │
//! │                                                                         │
//! │  There is no step 4: the table rejects UPDATE and DELETE.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Prices, discounts and selected services are frozen into the row as JSON.
//! Later catalog or package-config edits never change a recorded sale.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::column_u32;
use salon_core::types::{NewSale, PaymentChoice, Sale, SaleParty, Tier};
use salon_core::validation::validate_party;
use salon_core::Money;

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleRecord {
    id: String,
    client_id: String,
    master_id: String,
    tier: Tier,
    procedure_count: i64,
    base_cost_minor: i64,
    final_cost_minor: i64,
    total_savings_minor: i64,
    gift_session_value_minor: i64,
    bonus_account_value_minor: i64,
    free_zones_value_minor: i64,
    down_payment_minor: i64,
    installment_months: i64,
    used_certificate: bool,
    monthly_payment_minor: i64,
    applied_discounts: String,
    services: String,
    free_zones: String,
    created_at: DateTime<Utc>,
}

impl SaleRecord {
    fn into_sale(self) -> DbResult<Sale> {
        Ok(Sale {
            id: self.id,
            details: NewSale {
                party: SaleParty {
                    client_id: self.client_id,
                    master_id: self.master_id,
                },
                tier: self.tier,
                procedure_count: column_u32("procedure_count", self.procedure_count)?,
                base_cost: Money::from_minor(self.base_cost_minor),
                final_cost: Money::from_minor(self.final_cost_minor),
                total_savings: Money::from_minor(self.total_savings_minor),
                gift_session_value: Money::from_minor(self.gift_session_value_minor),
                bonus_account_value: Money::from_minor(self.bonus_account_value_minor),
                free_zones_value: Money::from_minor(self.free_zones_value_minor),
                payment: PaymentChoice {
                    down_payment: Money::from_minor(self.down_payment_minor),
                    installment_months: column_u32("installment_months", self.installment_months)?,
                    used_certificate: self.used_certificate,
                },
                monthly_payment: Money::from_minor(self.monthly_payment_minor),
                applied_discounts: serde_json::from_str(&self.applied_discounts)?,
                services: serde_json::from_str(&self.services)?,
                free_zones: serde_json::from_str(&self.free_zones)?,
            },
            created_at: self.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, client_id, master_id, tier, procedure_count,
        base_cost_minor, final_cost_minor, total_savings_minor,
        gift_session_value_minor, bonus_account_value_minor, free_zones_value_minor,
        down_payment_minor, installment_months, used_certificate, monthly_payment_minor,
        applied_discounts, services, free_zones, created_at
    FROM sales
"#;

/// Repository for recorded sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Appends a sale, assigning its id and timestamp.
    pub async fn record(&self, new_sale: &NewSale) -> DbResult<Sale> {
        validate_party(&new_sale.party)?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            details: new_sale.clone(),
            created_at: Utc::now(),
        };
        let details = &sale.details;

        debug!(id = %sale.id, tier = %details.tier, "Recording sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, client_id, master_id, tier, procedure_count,
                base_cost_minor, final_cost_minor, total_savings_minor,
                gift_session_value_minor, bonus_account_value_minor, free_zones_value_minor,
                down_payment_minor, installment_months, used_certificate, monthly_payment_minor,
                applied_discounts, services, free_zones, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&details.party.client_id)
        .bind(&details.party.master_id)
        .bind(details.tier)
        .bind(i64::from(details.procedure_count))
        .bind(details.base_cost.minor())
        .bind(details.final_cost.minor())
        .bind(details.total_savings.minor())
        .bind(details.gift_session_value.minor())
        .bind(details.bonus_account_value.minor())
        .bind(details.free_zones_value.minor())
        .bind(details.payment.down_payment.minor())
        .bind(i64::from(details.payment.installment_months))
        .bind(details.payment.used_certificate)
        .bind(details.monthly_payment.minor())
        .bind(serde_json::to_string(&details.applied_discounts)?)
        .bind(serde_json::to_string(&details.services)?)
        .bind(serde_json::to_string(&details.free_zones)?)
        .bind(sale.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            id = %sale.id,
            client_id = %details.party.client_id,
            tier = %details.tier,
            final_cost = %details.final_cost,
            "Sale recorded"
        );

        Ok(sale)
    }

    /// Gets a sale by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(SaleRecord::into_sale)
            .transpose()
    }

    /// A client's sales, oldest first.
    pub async fn list_for_client(&self, client_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!("{SELECT_COLUMNS} WHERE client_id = ?1 ORDER BY created_at, rowid");
        sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(SaleRecord::into_sale)
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
