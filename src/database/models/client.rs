use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use super::{clean_optional, normalize_email};
use crate::database::store::{FieldErrors, RecordMeta, Resource};
use crate::policy::{capabilities, Capabilities};

/// Customer profile attached to a `client` account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub is_active: bool,
}

impl Client {
    pub fn from_input(input: CreateClient, user_id: Uuid) -> Self {
        Self {
            meta: RecordMeta::new(),
            user_id,
            email: normalize_email(&input.email),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            phone: clean_optional(input.phone),
            address: clean_optional(input.address),
            city: clean_optional(input.city),
            state: clean_optional(input.state),
            zip_code: clean_optional(input.zip_code),
            is_active: true,
        }
    }

    pub fn apply(mut self, changes: UpdateClient) -> Self {
        if let Some(email) = changes.email {
            self.email = normalize_email(&email);
        }
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if changes.phone.is_some() {
            self.phone = clean_optional(changes.phone);
        }
        if changes.address.is_some() {
            self.address = clean_optional(changes.address);
        }
        if changes.city.is_some() {
            self.city = clean_optional(changes.city);
        }
        if changes.state.is_some() {
            self.state = clean_optional(changes.state);
        }
        if changes.zip_code.is_some() {
            self.zip_code = clean_optional(changes.zip_code);
        }
        if let Some(active) = changes.is_active {
            self.is_active = active;
        }
        self
    }
}

impl Resource for Client {
    type Key = String;

    const KIND: &'static str = "client";
    const CAPABILITIES: Capabilities = capabilities::CLIENTS;

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
        errors.check(self.email.validate_email(), "email", "must be a valid email address");
        errors.check(!self.first_name.is_empty(), "first_name", "first name is required");
        errors.check(!self.last_name.is_empty(), "last_name", "last name is required");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClient {
    /// Honoured only for managers; clients always create their own profile.
    pub user_id: Option<Uuid>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClient {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,
    pub is_active: Option<bool>,
}
