use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;
use super::crud::{Crud, ListQuery, PageLimits};
use super::error::ServiceError;
use crate::auth::Principal;
use crate::database::models::{Car, CreateRepair, Repair, UpdateRepair};
use crate::database::ResourceStore;

pub struct RepairService {
    crud: Crud<Repair>,
    cars: Arc<dyn ResourceStore<Car>>,
}

impl RepairService {
    pub fn new(repairs: Arc<dyn ResourceStore<Repair>>, cars: Arc<dyn ResourceStore<Car>>, page: PageLimits) -> Self {
        Self {
            crud: Crud::new(repairs, page),
            cars,
        }
    }

    /// Opens a repair on a live car. The technician is the caller unless a
    /// manager assigns someone else.
    pub async fn create(&self, ctx: &RequestContext, principal: &Principal, input: CreateRepair) -> Result<Repair, ServiceError> {
        input.validate()?;
        self.crud.forced_owner(principal)?;

        let car = ctx
            .run(self.cars.get_by_id(input.car_id))
            .await?
            .ok_or_else(|| ServiceError::invalid_field("car_id", "car does not exist"))?;

        let technician_id = match input.technician_id {
            Some(technician_id) if principal.role.can_manage() => technician_id,
            _ => principal.id,
        };

        let repair = Repair::from_input(input, technician_id, car.owner_id);
        self.crud.create(ctx, principal, repair).await
    }

    pub async fn get(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<Repair, ServiceError> {
        self.crud.get(ctx, principal, id).await
    }

    /// Lists repairs, optionally narrowed to one car with `car_id`.
    pub async fn list(&self, ctx: &RequestContext, principal: &Principal, query: &ListQuery) -> Result<Vec<Repair>, ServiceError> {
        self.crud.list(ctx, principal, query).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        id: Uuid,
        changes: UpdateRepair,
    ) -> Result<Repair, ServiceError> {
        changes.validate()?;
        self.crud.update(ctx, principal, id, |repair| repair.apply(changes)).await
    }

    pub async fn delete(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        self.crud.delete(ctx, principal, id).await
    }
}
