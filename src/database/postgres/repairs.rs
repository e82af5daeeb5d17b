use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{map_err, meta_from_row, soft_delete, text_column};
use crate::database::models::Repair;
use crate::database::store::{ListFilter, Resource, ResourceStore, StoreError};

const COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, car_id, technician_id, description, status, cost, started_at, completed_at";

/// Repair columns plus the owning user, resolved through `cars`. The join
/// ignores the car's tombstone so history stays attributable.
const SELECT_JOINED: &str = "SELECT r.id, r.created_at, r.updated_at, r.deleted_at, r.car_id, r.technician_id, \
     r.description, r.status, r.cost, r.started_at, r.completed_at, c.owner_id \
     FROM repairs r LEFT JOIN cars c ON c.id = r.car_id";

#[derive(Clone)]
pub struct PgRepairStore {
    pool: PgPool,
}

impl PgRepairStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> Result<Repair, StoreError> {
    Ok(Repair {
        meta: meta_from_row(row)?,
        car_id: row.try_get("car_id")?,
        technician_id: row.try_get("technician_id")?,
        description: row.try_get("description")?,
        status: text_column(row, "status", Repair::KIND)?,
        cost: row.try_get("cost")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        owner_id: row.try_get("owner_id")?,
    })
}

#[async_trait]
impl ResourceStore<Repair> for PgRepairStore {
    async fn create(&self, repair: &Repair) -> Result<Repair, StoreError> {
        let sql = format!(
            "WITH r AS (INSERT INTO repairs ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COLUMNS}) \
             SELECT r.*, c.owner_id FROM r LEFT JOIN cars c ON c.id = r.car_id"
        );
        let row = sqlx::query(&sql)
            .bind(repair.meta.id)
            .bind(repair.meta.created_at)
            .bind(repair.meta.updated_at)
            .bind(repair.meta.deleted_at)
            .bind(repair.car_id)
            .bind(repair.technician_id)
            .bind(&repair.description)
            .bind(repair.status.as_str())
            .bind(repair.cost)
            .bind(repair.started_at)
            .bind(repair.completed_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err(Repair::KIND))?;
        from_row(&row)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Repair>, StoreError> {
        let sql = format!("{SELECT_JOINED} WHERE r.id = $1 AND r.deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Repair::KIND))?;
        row.as_ref().map(from_row).transpose()
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Repair>, StoreError> {
        let sql = format!(
            "{SELECT_JOINED} WHERE r.deleted_at IS NULL \
             AND ($1::uuid IS NULL OR c.owner_id = $1) \
             AND ($2::uuid IS NULL OR r.car_id = $2) \
             ORDER BY r.created_at, r.id LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.owner_id)
            .bind(filter.car_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err(Repair::KIND))?;
        rows.iter().map(from_row).collect()
    }

    async fn update(&self, repair: &Repair) -> Result<Option<Repair>, StoreError> {
        let sql = format!(
            "WITH r AS (UPDATE repairs SET technician_id = $2, description = $3, status = $4, cost = $5, \
             started_at = $6, completed_at = $7, updated_at = $8 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {COLUMNS}) \
             SELECT r.*, c.owner_id FROM r LEFT JOIN cars c ON c.id = r.car_id"
        );
        let row = sqlx::query(&sql)
            .bind(repair.meta.id)
            .bind(repair.technician_id)
            .bind(&repair.description)
            .bind(repair.status.as_str())
            .bind(repair.cost)
            .bind(repair.started_at)
            .bind(repair.completed_at)
            .bind(repair.meta.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Repair::KIND))?;
        row.as_ref().map(from_row).transpose()
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        soft_delete(&self.pool, "repairs", Repair::KIND, id, at).await
    }

    async fn find_by_unique_key(
        &self,
        key: &<Repair as Resource>::Key,
    ) -> Result<Option<Repair>, StoreError> {
        let (car_id, description, started_at) = key;
        let sql = format!(
            "{SELECT_JOINED} WHERE r.deleted_at IS NULL AND r.car_id = $1 AND r.description = $2 \
             AND r.started_at IS NOT DISTINCT FROM $3"
        );
        let row = sqlx::query(&sql)
            .bind(car_id)
            .bind(description)
            .bind(started_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Repair::KIND))?;
        row.as_ref().map(from_row).transpose()
    }
}
