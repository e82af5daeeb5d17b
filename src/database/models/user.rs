use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use super::normalize_email;
use crate::auth::Role;
use crate::database::store::{FieldErrors, RecordMeta, Resource};
use crate::policy::{capabilities, Capabilities};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
}

impl User {
    pub fn new(email: &str, password_hash: String, first_name: &str, last_name: &str, role: Role) -> Self {
        Self {
            meta: RecordMeta::new(),
            email: normalize_email(email),
            password_hash,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            role,
            is_active: true,
        }
    }

    /// Applies an update. The new password arrives already hashed.
    pub fn apply(mut self, changes: UpdateUser, password_hash: Option<String>) -> Self {
        if let Some(email) = changes.email {
            self.email = normalize_email(&email);
        }
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
        self
    }
}

impl Resource for User {
    type Key = String;

    const KIND: &'static str = "user";
    const CAPABILITIES: Capabilities = capabilities::USERS;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    /// Accounts own themselves.
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.meta.id)
    }

    fn unique_key(&self) -> String {
        self.email.clone()
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(self.email.validate_email(), "email", "must be a valid email address");
        errors.check(!self.first_name.is_empty(), "first_name", "first name is required");
        errors.check(!self.last_name.is_empty(), "last_name", "last name is required");
        errors.check(!self.password_hash.is_empty(), "password", "password is required");
        errors.into_result()
    }
}

/// Public self-registration. Always produces a `client` account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Account creation by a manager, with an explicit role.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub role: Role,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    /// Whether the update touches fields only managers may change. Account
    /// holders may edit their names and password, nothing else.
    pub fn changes_access(&self) -> bool {
        self.email.is_some() || self.role.is_some() || self.is_active.is_some()
    }
}
