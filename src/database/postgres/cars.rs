use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{map_err, meta_from_row, soft_delete, LIVE};
use crate::database::models::Car;
use crate::database::store::{ListFilter, Resource, ResourceStore, StoreError};

const COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, make, model, year, license_plate, vin, color, mileage, owner_id";

#[derive(Clone)]
pub struct PgCarStore {
    pool: PgPool,
}

impl PgCarStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> Result<Car, sqlx::Error> {
    Ok(Car {
        meta: meta_from_row(row)?,
        make: row.try_get("make")?,
        model: row.try_get("model")?,
        year: row.try_get("year")?,
        license_plate: row.try_get("license_plate")?,
        vin: row.try_get("vin")?,
        color: row.try_get("color")?,
        mileage: row.try_get("mileage")?,
        owner_id: row.try_get("owner_id")?,
    })
}

#[async_trait]
impl ResourceStore<Car> for PgCarStore {
    async fn create(&self, car: &Car) -> Result<Car, StoreError> {
        let sql = format!(
            "INSERT INTO cars ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(car.meta.id)
            .bind(car.meta.created_at)
            .bind(car.meta.updated_at)
            .bind(car.meta.deleted_at)
            .bind(&car.make)
            .bind(&car.model)
            .bind(car.year)
            .bind(&car.license_plate)
            .bind(&car.vin)
            .bind(&car.color)
            .bind(car.mileage)
            .bind(car.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err(Car::KIND))?;
        Ok(from_row(&row)?)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Car>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM cars WHERE id = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Car::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Car>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM cars \
             WHERE {LIVE} AND ($1::uuid IS NULL OR owner_id = $1) \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.owner_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err(Car::KIND))?;
        Ok(rows.iter().map(from_row).collect::<Result<_, _>>()?)
    }

    async fn update(&self, car: &Car) -> Result<Option<Car>, StoreError> {
        let sql = format!(
            "UPDATE cars SET make = $2, model = $3, year = $4, license_plate = $5, vin = $6, \
             color = $7, mileage = $8, owner_id = $9, updated_at = $10 \
             WHERE id = $1 AND {LIVE} RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(car.meta.id)
            .bind(&car.make)
            .bind(&car.model)
            .bind(car.year)
            .bind(&car.license_plate)
            .bind(&car.vin)
            .bind(&car.color)
            .bind(car.mileage)
            .bind(car.owner_id)
            .bind(car.meta.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Car::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        soft_delete(&self.pool, "cars", Car::KIND, id, at).await
    }

    async fn find_by_unique_key(&self, plate: &String) -> Result<Option<Car>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM cars WHERE license_plate = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(plate)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Car::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }
}
