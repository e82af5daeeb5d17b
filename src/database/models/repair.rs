use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::store::{now, FieldErrors, RecordMeta, Resource};
use crate::policy::{capabilities, Capabilities};

text_enum! {
    RepairStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for RepairStatus {
    fn default() -> Self {
        RepairStatus::Pending
    }
}

/// Work performed on a car. The owner is the owner of the car, resolved by
/// the store on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub car_id: Uuid,
    pub technician_id: Uuid,
    pub description: String,
    pub status: RepairStatus,
    pub cost: Decimal,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

impl Repair {
    pub fn from_input(input: CreateRepair, technician_id: Uuid, car_owner: Uuid) -> Self {
        let mut repair = Self {
            meta: RecordMeta::new(),
            car_id: input.car_id,
            technician_id,
            description: input.description.trim().to_string(),
            status: input.status.unwrap_or_default(),
            cost: input.cost.unwrap_or(Decimal::ZERO),
            started_at: input.started_at,
            completed_at: None,
            owner_id: Some(car_owner),
        };
        repair.stamp_status();
        repair
    }

    pub fn apply(mut self, changes: UpdateRepair) -> Self {
        if let Some(description) = changes.description {
            self.description = description.trim().to_string();
        }
        if let Some(cost) = changes.cost {
            self.cost = cost;
        }
        if let Some(started_at) = changes.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(completed_at) = changes.completed_at {
            self.completed_at = Some(completed_at);
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.stamp_status();
        self
    }

    /// Fills in the lifecycle timestamps implied by the current status.
    fn stamp_status(&mut self) {
        match self.status {
            RepairStatus::InProgress => {
                self.started_at.get_or_insert_with(now);
            }
            RepairStatus::Completed => {
                self.completed_at.get_or_insert_with(now);
            }
            RepairStatus::Pending | RepairStatus::Cancelled => {}
        }
    }
}

impl Resource for Repair {
    type Key = (Uuid, String, Option<DateTime<Utc>>);

    const KIND: &'static str = "repair";
    const CAPABILITIES: Capabilities = capabilities::REPAIRS;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    fn car_id(&self) -> Option<Uuid> {
        Some(self.car_id)
    }

    fn unique_key(&self) -> Self::Key {
        (self.car_id, self.description.clone(), self.started_at)
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(!self.description.trim().is_empty(), "description", "description is required");
        errors.check(self.cost >= Decimal::ZERO, "cost", "cost cannot be negative");
        if let (Some(started), Some(completed)) = (self.started_at, self.completed_at) {
            errors.check(completed >= started, "completed_at", "cannot complete before the repair started");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRepair {
    pub car_id: Uuid,
    #[validate(length(max = 2000))]
    pub description: String,
    pub cost: Option<Decimal>,
    pub status: Option<RepairStatus>,
    pub started_at: Option<DateTime<Utc>>,
    /// Honoured only for managers; everyone else is recorded as the technician.
    pub technician_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRepair {
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub status: Option<RepairStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
