use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{map_err, meta_from_row, soft_delete, LIVE};
use crate::database::models::Client;
use crate::database::store::{ListFilter, Resource, ResourceStore, StoreError};

const COLUMNS: &str = "id, created_at, updated_at, deleted_at, user_id, email, first_name, last_name, \
     phone, address, city, state, zip_code, is_active";

#[derive(Clone)]
pub struct PgClientStore {
    pool: PgPool,
}

impl PgClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> Result<Client, sqlx::Error> {
    Ok(Client {
        meta: meta_from_row(row)?,
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip_code: row.try_get("zip_code")?,
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl ResourceStore<Client> for PgClientStore {
    async fn create(&self, client: &Client) -> Result<Client, StoreError> {
        let sql = format!(
            "INSERT INTO clients ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(client.meta.id)
            .bind(client.meta.created_at)
            .bind(client.meta.updated_at)
            .bind(client.meta.deleted_at)
            .bind(client.user_id)
            .bind(&client.email)
            .bind(&client.first_name)
            .bind(&client.last_name)
            .bind(&client.phone)
            .bind(&client.address)
            .bind(&client.city)
            .bind(&client.state)
            .bind(&client.zip_code)
            .bind(client.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err(Client::KIND))?;
        Ok(from_row(&row)?)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM clients WHERE id = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Client::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Client>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM clients \
             WHERE {LIVE} AND ($1::uuid IS NULL OR user_id = $1) \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.owner_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err(Client::KIND))?;
        Ok(rows.iter().map(from_row).collect::<Result<_, _>>()?)
    }

    async fn update(&self, client: &Client) -> Result<Option<Client>, StoreError> {
        let sql = format!(
            "UPDATE clients SET user_id = $2, email = $3, first_name = $4, last_name = $5, phone = $6, \
             address = $7, city = $8, state = $9, zip_code = $10, is_active = $11, updated_at = $12 \
             WHERE id = $1 AND {LIVE} RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(client.meta.id)
            .bind(client.user_id)
            .bind(&client.email)
            .bind(&client.first_name)
            .bind(&client.last_name)
            .bind(&client.phone)
            .bind(&client.address)
            .bind(&client.city)
            .bind(&client.state)
            .bind(&client.zip_code)
            .bind(client.is_active)
            .bind(client.meta.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Client::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        soft_delete(&self.pool, "clients", Client::KIND, id, at).await
    }

    async fn find_by_unique_key(&self, email: &String) -> Result<Option<Client>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM clients WHERE email = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Client::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }
}
