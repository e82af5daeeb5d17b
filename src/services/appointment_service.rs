use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;
use super::crud::{Crud, ListQuery, PageLimits};
use super::error::ServiceError;
use crate::auth::Principal;
use crate::database::models::{Appointment, Car, CreateAppointment, UpdateAppointment};
use crate::database::ResourceStore;

pub struct AppointmentService {
    crud: Crud<Appointment>,
    cars: Arc<dyn ResourceStore<Car>>,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn ResourceStore<Appointment>>,
        cars: Arc<dyn ResourceStore<Car>>,
        page: PageLimits,
    ) -> Self {
        Self {
            crud: Crud::new(appointments, page),
            cars,
        }
    }

    /// Books a slot for a car. The car must be live and belong to the customer.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        input: CreateAppointment,
    ) -> Result<Appointment, ServiceError> {
        input.validate()?;

        let customer_id = match self.crud.forced_owner(principal)? {
            Some(customer_id) => customer_id,
            None => input
                .customer_id
                .ok_or_else(|| ServiceError::invalid_field("customer_id", "customer_id is required"))?,
        };

        match ctx.run(self.cars.get_by_id(input.car_id)).await? {
            Some(car) if car.owner_id == customer_id => {}
            Some(_) => return Err(ServiceError::invalid_field("car_id", "car does not belong to the customer")),
            None => return Err(ServiceError::invalid_field("car_id", "car does not exist")),
        }

        self.crud
            .create(ctx, principal, Appointment::from_input(input, customer_id))
            .await
    }

    pub async fn get(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<Appointment, ServiceError> {
        self.crud.get(ctx, principal, id).await
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        query: &ListQuery,
    ) -> Result<Vec<Appointment>, ServiceError> {
        self.crud.list(ctx, principal, query).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        id: Uuid,
        changes: UpdateAppointment,
    ) -> Result<Appointment, ServiceError> {
        changes.validate()?;
        self.crud
            .update(ctx, principal, id, |appointment| appointment.apply(changes))
            .await
    }

    pub async fn delete(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        self.crud.delete(ctx, principal, id).await
    }
}
