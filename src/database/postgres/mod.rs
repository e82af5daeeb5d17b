//! PostgreSQL store backend.
//!
//! Every read carries the liveness predicate and uniqueness is enforced by
//! partial unique indexes over live rows (see `migrations/`).

pub mod appointments;
pub mod cars;
pub mod clients;
pub mod employees;
pub mod repairs;
pub mod users;

pub use appointments::PgAppointmentStore;
pub use cars::PgCarStore;
pub use clients::PgClientStore;
pub use employees::PgEmployeeStore;
pub use repairs::PgRepairStore;
pub use users::PgUserStore;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

use super::store::{RecordMeta, StoreError};

/// Predicate appended to every read.
pub(crate) const LIVE: &str = "deleted_at IS NULL";

/// Maps driver errors, turning unique-index violations into `Conflict`.
pub(crate) fn map_err(kind: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::Conflict(kind);
            }
        }
        tracing::debug!("{} query failed: {}", kind, e);
        StoreError::Sqlx(e)
    }
}

pub(crate) fn meta_from_row(row: &PgRow) -> Result<RecordMeta, sqlx::Error> {
    Ok(RecordMeta {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

/// Reads a text column holding an enum value.
pub(crate) fn text_column<T>(row: &PgRow, column: &str, kind: &'static str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: T::Err| StoreError::Corrupt {
        kind,
        message: format!("{}: {}", column, e),
    })
}

pub(crate) async fn soft_delete(
    pool: &PgPool,
    table: &'static str,
    kind: &'static str,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let sql = format!("UPDATE {table} SET deleted_at = $2 WHERE id = $1 AND {LIVE}");
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(at)
        .execute(pool)
        .await
        .map_err(map_err(kind))?;
    Ok(result.rows_affected() == 1)
}
