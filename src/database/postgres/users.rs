use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{map_err, meta_from_row, soft_delete, text_column, LIVE};
use crate::database::models::User;
use crate::database::store::{ListFilter, Resource, ResourceStore, StoreError};

const COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, email, password_hash, first_name, last_name, role, is_active";

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        meta: meta_from_row(row)?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        role: text_column(row, "role", User::KIND)?,
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl ResourceStore<User> for PgUserStore {
    async fn create(&self, user: &User) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user.meta.id)
            .bind(user.meta.created_at)
            .bind(user.meta.updated_at)
            .bind(user.meta.deleted_at)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.role.as_str())
            .bind(user.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err(User::KIND))?;
        from_row(&row)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(User::KIND))?;
        row.as_ref().map(from_row).transpose()
    }

    /// The owner filter selects the account itself.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE {LIVE} AND ($1::uuid IS NULL OR id = $1) \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.owner_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err(User::KIND))?;
        rows.iter().map(from_row).collect()
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users SET email = $2, password_hash = $3, first_name = $4, last_name = $5, \
             role = $6, is_active = $7, updated_at = $8 \
             WHERE id = $1 AND {LIVE} RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user.meta.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.role.as_str())
            .bind(user.is_active)
            .bind(user.meta.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(User::KIND))?;
        row.as_ref().map(from_row).transpose()
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        soft_delete(&self.pool, "users", User::KIND, id, at).await
    }

    async fn find_by_unique_key(&self, email: &String) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE email = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(User::KIND))?;
        row.as_ref().map(from_row).transpose()
    }
}
