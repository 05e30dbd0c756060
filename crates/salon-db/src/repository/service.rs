//! # Service Repository
//!
//! The catalog of selectable services and their current unit prices.
//! Services are deactivated, never deleted: recorded sales keep their own
//! price snapshot, so old ids stay meaningful.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use salon_core::validation::{validate_id, validate_non_negative};
use salon_core::{Money, ServiceCatalog};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub unit_price: Money,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ServiceRecord {
    id: String,
    name: String,
    unit_price_minor: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ServiceRecord> for Service {
    fn from(record: ServiceRecord) -> Self {
        Service {
            id: record.id,
            name: record.name,
            unit_price: Money::from_minor(record.unit_price_minor),
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Repository for the service catalog.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Active services ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Service>> {
        let records = sqlx::query_as::<_, ServiceRecord>(
            r#"
            SELECT id, name, unit_price_minor, is_active, created_at, updated_at
            FROM services
            WHERE is_active = 1
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Service::from).collect())
    }

    /// Gets a service by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            r#"
            SELECT id, name, unit_price_minor, is_active, created_at, updated_at
            FROM services
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Service::from))
    }

    /// Inserts a service or updates its name and price. Upserting a
    /// deactivated service reactivates it. Surrounding whitespace is
    /// stripped from the id.
    pub async fn upsert(&self, id: &str, name: &str, unit_price: Money) -> DbResult<Service> {
        let id = id.trim();
        validate_id("service_id", id)?;
        validate_non_negative("unit_price", unit_price)?;
        let now = Utc::now();

        debug!(id, price = %unit_price, "Upserting service");

        sqlx::query(
            r#"
            INSERT INTO services (id, name, unit_price_minor, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                unit_price_minor = excluded.unit_price_minor,
                is_active = 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(unit_price.minor())
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Service", id))
    }

    /// Hides a service from the catalog.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE services SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        info!(id, "Service deactivated");
        Ok(())
    }

    /// Snapshot of active prices for quote resolution.
    pub async fn catalog(&self) -> DbResult<ServiceCatalog> {
        Ok(self
            .list_active()
            .await?
            .into_iter()
            .map(|service| (service.id, service.unit_price))
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.services();

        let created = repo
            .upsert("laser-legs", "Laser: legs", Money::from_major(3_000))
            .await
            .unwrap();
        assert!(created.is_active);
        assert_eq!(created.unit_price, Money::from_major(3_000));

        let updated = repo
            .upsert("laser-legs", "Laser: full legs", Money::from_major(3_500))
            .await
            .unwrap();
        assert_eq!(updated.name, "Laser: full legs");
        assert_eq!(updated.created_at, created.created_at);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_catalog() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.services();

        repo.upsert("laser-legs", "Laser: legs", Money::from_major(3_000)).await.unwrap();
        repo.upsert("laser-face", "Laser: face", Money::from_major(2_000)).await.unwrap();
        repo.deactivate("laser-face").await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "laser-legs");

        let catalog = repo.catalog().await.unwrap();
        assert_eq!(catalog.price("laser-legs"), Some(Money::from_major(3_000)));
        assert_eq!(catalog.price("laser-face"), None);

        // Still readable by id
        let face = repo.get_by_id("laser-face").await.unwrap().unwrap();
        assert!(!face.is_active);
    }

    #[tokio::test]
    async fn test_deactivate_unknown_service() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.services().deactivate("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_upsert_stores_trimmed_id() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.services();

        let created = repo
            .upsert(" laser-legs\t", "Laser: legs", Money::from_major(3_000))
            .await
            .unwrap();
        assert_eq!(created.id, "laser-legs");

        let catalog = repo.catalog().await.unwrap();
        assert_eq!(catalog.price("laser-legs"), Some(Money::from_major(3_000)));
        assert_eq!(catalog.len(), 1);

        assert!(repo.upsert("   ", "Blank", Money::from_major(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_rejects_negative_price() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .services()
            .upsert("laser-legs", "Laser: legs", Money::from_minor(-100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidData(_)));
    }
}
