use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::clean_optional;
use crate::database::store::{FieldErrors, RecordMeta, Resource};
use crate::policy::{capabilities, Capabilities};

text_enum! {
    AppointmentStatus {
        Scheduled => "scheduled",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub service_type: String,
    pub status: AppointmentStatus,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Appointment {
    pub fn from_input(input: CreateAppointment, customer_id: Uuid) -> Self {
        Self {
            meta: RecordMeta::new(),
            customer_id,
            car_id: input.car_id,
            service_type: input.service_type.trim().to_string(),
            status: input.status.unwrap_or(AppointmentStatus::Scheduled),
            scheduled_at: input.scheduled_at,
            notes: clean_optional(input.notes),
        }
    }

    pub fn apply(mut self, changes: UpdateAppointment) -> Self {
        if let Some(service_type) = changes.service_type {
            self.service_type = service_type.trim().to_string();
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(scheduled_at) = changes.scheduled_at {
            self.scheduled_at = scheduled_at;
        }
        if changes.notes.is_some() {
            self.notes = clean_optional(changes.notes);
        }
        self
    }
}

impl Resource for Appointment {
    type Key = (Uuid, DateTime<Utc>);

    const KIND: &'static str = "appointment";
    const CAPABILITIES: Capabilities = capabilities::APPOINTMENTS;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.customer_id)
    }

    fn set_owner(&mut self, owner: Uuid) {
        self.customer_id = owner;
    }

    fn car_id(&self) -> Option<Uuid> {
        Some(self.car_id)
    }

    /// One booking per car per slot.
    fn unique_key(&self) -> Self::Key {
        (self.car_id, self.scheduled_at)
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(!self.service_type.is_empty(), "service_type", "service type is required");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAppointment {
    /// Honoured only for principals that may book for others.
    pub customer_id: Option<Uuid>,
    pub car_id: Uuid,
    #[validate(length(max = 100))]
    pub service_type: String,
    pub scheduled_at: DateTime<Utc>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAppointment {
    #[validate(length(max = 100))]
    pub service_type: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_scheduled() {
        let input = CreateAppointment {
            customer_id: None,
            car_id: Uuid::new_v4(),
            service_type: " Oil change ".into(),
            scheduled_at: Utc::now(),
            notes: None,
            status: None,
        };
        let customer = Uuid::new_v4();
        let appointment = Appointment::from_input(input, customer);
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.service_type, "Oil change");
        assert_eq!(appointment.owner_id(), Some(customer));
        assert!(appointment.validate().is_ok());
    }

    #[test]
    fn blank_service_type_rejected() {
        let input = CreateAppointment {
            customer_id: None,
            car_id: Uuid::new_v4(),
            service_type: "   ".into(),
            scheduled_at: Utc::now(),
            notes: None,
            status: None,
        };
        let appointment = Appointment::from_input(input, Uuid::new_v4());
        assert!(appointment.validate().unwrap_err().0.contains_key("service_type"));
    }
}
