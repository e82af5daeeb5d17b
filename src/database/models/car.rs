use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::clean_optional;
use crate::database::store::{FieldErrors, RecordMeta, Resource};
use crate::policy::{capabilities, Capabilities};

pub const MIN_YEAR: i32 = 1900;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub vin: Option<String>,
    pub color: String,
    pub mileage: i32,
    pub owner_id: Uuid,
}

/// Plates compare without surrounding whitespace and case.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

impl Car {
    pub fn from_input(input: CreateCar, owner_id: Uuid) -> Self {
        Self {
            meta: RecordMeta::new(),
            make: input.make.trim().to_string(),
            model: input.model.trim().to_string(),
            year: input.year,
            license_plate: normalize_plate(&input.license_plate),
            vin: clean_optional(input.vin),
            color: input.color.trim().to_string(),
            mileage: input.mileage,
            owner_id,
        }
    }

    pub fn apply(mut self, changes: UpdateCar) -> Self {
        if let Some(make) = changes.make {
            self.make = make.trim().to_string();
        }
        if let Some(model) = changes.model {
            self.model = model.trim().to_string();
        }
        if let Some(year) = changes.year {
            self.year = year;
        }
        if let Some(plate) = changes.license_plate {
            self.license_plate = normalize_plate(&plate);
        }
        if changes.vin.is_some() {
            self.vin = clean_optional(changes.vin);
        }
        if let Some(color) = changes.color {
            self.color = color.trim().to_string();
        }
        if let Some(mileage) = changes.mileage {
            self.mileage = mileage;
        }
        self
    }
}

impl Resource for Car {
    type Key = String;

    const KIND: &'static str = "car";
    const CAPABILITIES: Capabilities = capabilities::CARS;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.owner_id)
    }

    fn set_owner(&mut self, owner: Uuid) {
        self.owner_id = owner;
    }

    fn unique_key(&self) -> String {
        normalize_plate(&self.license_plate)
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let max_year = Utc::now().year() + 1;
        let mut errors = FieldErrors::new();
        errors.check(!self.make.trim().is_empty(), "make", "make is required");
        errors.check(!self.model.trim().is_empty(), "model", "model is required");
        errors.check(
            (MIN_YEAR..=max_year).contains(&self.year),
            "year",
            &format!("year must be between {} and {}", MIN_YEAR, max_year),
        );
        errors.check(!self.license_plate.trim().is_empty(), "license_plate", "license plate is required");
        errors.check(!self.color.trim().is_empty(), "color", "color is required");
        errors.check(self.mileage >= 0, "mileage", "mileage cannot be negative");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCar {
    #[validate(length(max = 100))]
    pub make: String,
    #[validate(length(max = 100))]
    pub model: String,
    pub year: i32,
    #[validate(length(max = 20))]
    pub license_plate: String,
    #[validate(length(max = 17))]
    pub vin: Option<String>,
    #[validate(length(max = 50))]
    pub color: String,
    #[serde(default)]
    pub mileage: i32,
    /// Honoured only for principals that may create cars for others.
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCar {
    #[validate(length(max = 100))]
    pub make: Option<String>,
    #[validate(length(max = 100))]
    pub model: Option<String>,
    pub year: Option<i32>,
    #[validate(length(max = 20))]
    pub license_plate: Option<String>,
    #[validate(length(max = 17))]
    pub vin: Option<String>,
    #[validate(length(max = 50))]
    pub color: Option<String>,
    pub mileage: Option<i32>,
}
