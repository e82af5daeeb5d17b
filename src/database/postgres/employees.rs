use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{map_err, meta_from_row, soft_delete, LIVE};
use crate::database::models::Employee;
use crate::database::store::{ListFilter, Resource, ResourceStore, StoreError};

const COLUMNS: &str = "id, created_at, updated_at, deleted_at, user_id, employee_code, first_name, last_name, \
     email, phone, department, position, hourly_rate, hire_date, is_active";

#[derive(Clone)]
pub struct PgEmployeeStore {
    pool: PgPool,
}

impl PgEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> Result<Employee, sqlx::Error> {
    Ok(Employee {
        meta: meta_from_row(row)?,
        user_id: row.try_get("user_id")?,
        employee_code: row.try_get("employee_code")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        department: row.try_get("department")?,
        position: row.try_get("position")?,
        hourly_rate: row.try_get("hourly_rate")?,
        hire_date: row.try_get("hire_date")?,
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl ResourceStore<Employee> for PgEmployeeStore {
    async fn create(&self, employee: &Employee) -> Result<Employee, StoreError> {
        let sql = format!(
            "INSERT INTO employees ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(employee.meta.id)
            .bind(employee.meta.created_at)
            .bind(employee.meta.updated_at)
            .bind(employee.meta.deleted_at)
            .bind(employee.user_id)
            .bind(&employee.employee_code)
            .bind(&employee.first_name)
            .bind(&employee.last_name)
            .bind(&employee.email)
            .bind(&employee.phone)
            .bind(&employee.department)
            .bind(&employee.position)
            .bind(employee.hourly_rate)
            .bind(employee.hire_date)
            .bind(employee.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err(Employee::KIND))?;
        Ok(from_row(&row)?)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM employees WHERE id = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Employee::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Employee>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM employees \
             WHERE {LIVE} AND ($1::uuid IS NULL OR user_id = $1) \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.owner_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err(Employee::KIND))?;
        Ok(rows.iter().map(from_row).collect::<Result<_, _>>()?)
    }

    async fn update(&self, employee: &Employee) -> Result<Option<Employee>, StoreError> {
        let sql = format!(
            "UPDATE employees SET user_id = $2, first_name = $3, last_name = $4, email = $5, phone = $6, \
             department = $7, position = $8, hourly_rate = $9, is_active = $10, updated_at = $11 \
             WHERE id = $1 AND {LIVE} RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(employee.meta.id)
            .bind(employee.user_id)
            .bind(&employee.first_name)
            .bind(&employee.last_name)
            .bind(&employee.email)
            .bind(&employee.phone)
            .bind(&employee.department)
            .bind(&employee.position)
            .bind(employee.hourly_rate)
            .bind(employee.is_active)
            .bind(employee.meta.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Employee::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        soft_delete(&self.pool, "employees", Employee::KIND, id, at).await
    }

    async fn find_by_unique_key(&self, email: &String) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM employees WHERE email = $1 AND {LIVE}");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err(Employee::KIND))?;
        Ok(row.as_ref().map(from_row).transpose()?)
    }
}
