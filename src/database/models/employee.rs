use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use super::{clean_optional, normalize_email};
use crate::database::store::{FieldErrors, RecordMeta, Resource};
use crate::policy::{capabilities, Capabilities};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub user_id: Uuid,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: String,
    pub position: String,
    pub hourly_rate: Decimal,
    pub hire_date: NaiveDate,
    pub is_active: bool,
}

/// Eight upper-case hex characters taken from a fresh v4 uuid.
pub fn generate_employee_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

impl Employee {
    pub fn from_input(input: CreateEmployee) -> Self {
        Self {
            meta: RecordMeta::new(),
            user_id: input.user_id,
            employee_code: generate_employee_code(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: normalize_email(&input.email),
            phone: clean_optional(input.phone),
            department: input.department.trim().to_string(),
            position: input.position.trim().to_string(),
            hourly_rate: input.hourly_rate,
            hire_date: input.hire_date.unwrap_or_else(|| Utc::now().date_naive()),
            is_active: true,
        }
    }

    pub fn apply(mut self, changes: UpdateEmployee) -> Self {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(email) = changes.email {
            self.email = normalize_email(&email);
        }
        if changes.phone.is_some() {
            self.phone = clean_optional(changes.phone);
        }
        if let Some(department) = changes.department {
            self.department = department.trim().to_string();
        }
        if let Some(position) = changes.position {
            self.position = position.trim().to_string();
        }
        if let Some(rate) = changes.hourly_rate {
            self.hourly_rate = rate;
        }
        if let Some(active) = changes.is_active {
            self.is_active = active;
        }
        self
    }
}

impl Resource for Employee {
    type Key = String;

    const KIND: &'static str = "employee";
    const CAPABILITIES: Capabilities = capabilities::EMPLOYEES;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn set_owner(&mut self, owner: Uuid) {
        self.user_id = owner;
    }

    fn unique_key(&self) -> String {
        self.email.clone()
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(!self.first_name.is_empty(), "first_name", "first name is required");
        errors.check(!self.last_name.is_empty(), "last_name", "last name is required");
        errors.check(self.email.validate_email(), "email", "must be a valid email address");
        errors.check(!self.department.is_empty(), "department", "department is required");
        errors.check(!self.position.is_empty(), "position", "position is required");
        errors.check(self.hourly_rate >= Decimal::ZERO, "hourly_rate", "hourly rate cannot be negative");
        errors.check(self.employee_code.len() == 8, "employee_code", "employee code must be 8 characters");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmployee {
    pub user_id: Uuid,
    #[validate(length(max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub department: String,
    #[validate(length(max = 100))]
    pub position: String,
    #[serde(default)]
    pub hourly_rate: Decimal,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEmployee {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}
