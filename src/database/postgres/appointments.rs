use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{map_err, meta_from_row, soft_delete, text_column, LIVE};
use crate::database::models::Appointment;
use crate::database::store::{ListFilter, Resource, ResourceStore, StoreError};

const COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, customer_id, car_id, service_type, status, scheduled_at, notes";

#[derive(Clone)]
pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> Result<Appointment, StoreError> {
    Ok(Appointment {
        meta: meta_from_row(row)?,
        customer_id: row.try_get("customer_id")?,
        car_id: row.try_get("car_id")?,
        service_type: row.try_get("service_type")?,
        status: text_column(row, "status", Appointment::KIND)?,
        scheduled_at: row.try_get("scheduled_at")?,
        notes: row.try_get("notes")?,
    })
}

#[async_trait]
impl ResourceStore<Appointment> for PgAppointmentStore {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let sql = format!(
            "INSERT INTO appointments ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(appointment.meta.id)
            .bind(appointment.meta.created_at)
            .bind(appointment.meta.updated_at)
            .bind(appointment.meta.deleted_at)
            .bind(appointment.customer_id)
            .bind(appointment.car_id)
            .bind(&appointment.service_type)
            .bind(appointment.status.as_str())
            .bind(appointment.scheduled_at)
            .bind(&appointment.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err(Appointment::KIND))?;
        from_row(&row)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM appointments WHERE id = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Appointment::KIND))?;
        row.as_ref().map(from_row).transpose()
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Appointment>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM appointments \
             WHERE {LIVE} AND ($1::uuid IS NULL OR customer_id = $1) \
             AND ($2::uuid IS NULL OR car_id = $2) \
             ORDER BY created_at, id LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.owner_id)
            .bind(filter.car_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err(Appointment::KIND))?;
        rows.iter().map(from_row).collect()
    }

    async fn update(&self, appointment: &Appointment) -> Result<Option<Appointment>, StoreError> {
        let sql = format!(
            "UPDATE appointments SET customer_id = $2, car_id = $3, service_type = $4, status = $5, \
             scheduled_at = $6, notes = $7, updated_at = $8 \
             WHERE id = $1 AND {LIVE} RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(appointment.meta.id)
            .bind(appointment.customer_id)
            .bind(appointment.car_id)
            .bind(&appointment.service_type)
            .bind(appointment.status.as_str())
            .bind(appointment.scheduled_at)
            .bind(&appointment.notes)
            .bind(appointment.meta.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Appointment::KIND))?;
        row.as_ref().map(from_row).transpose()
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        soft_delete(&self.pool, "appointments", Appointment::KIND, id, at).await
    }

    async fn find_by_unique_key(
        &self,
        key: &<Appointment as Resource>::Key,
    ) -> Result<Option<Appointment>, StoreError> {
        let (car_id, scheduled_at) = key;
        let sql = format!("SELECT {COLUMNS} FROM appointments WHERE car_id = $1 AND scheduled_at = $2 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(car_id)
            .bind(scheduled_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Appointment::KIND))?;
        row.as_ref().map(from_row).transpose()
    }
}
