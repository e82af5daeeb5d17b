use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;
use super::crud::{Crud, ListQuery, PageLimits};
use super::error::ServiceError;
use crate::auth::{Principal, Role};
use crate::database::models::{Car, CreateCar, Repair, UpdateCar, User};
use crate::database::ResourceStore;
use crate::policy::Operation;

pub struct CarService {
    crud: Crud<Car>,
    users: Arc<dyn ResourceStore<User>>,
    repairs: Arc<dyn ResourceStore<Repair>>,
    page: PageLimits,
}

impl CarService {
    pub fn new(
        cars: Arc<dyn ResourceStore<Car>>,
        users: Arc<dyn ResourceStore<User>>,
        repairs: Arc<dyn ResourceStore<Repair>>,
        page: PageLimits,
    ) -> Self {
        Self {
            crud: Crud::new(cars, page),
            users,
            repairs,
            page,
        }
    }

    /// Registers a car. Clients always register their own; staff must name
    /// the client who owns it.
    pub async fn create(&self, ctx: &RequestContext, principal: &Principal, input: CreateCar) -> Result<Car, ServiceError> {
        input.validate()?;

        let owner_id = match self.crud.forced_owner(principal)? {
            Some(owner_id) => owner_id,
            None => {
                let owner_id = input
                    .owner_id
                    .ok_or_else(|| ServiceError::invalid_field("owner_id", "owner_id is required"))?;
                self.ensure_client(ctx, owner_id).await?;
                owner_id
            }
        };

        self.crud.create(ctx, principal, Car::from_input(input, owner_id)).await
    }

    pub async fn get(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<Car, ServiceError> {
        self.crud.get(ctx, principal, id).await
    }

    pub async fn list(&self, ctx: &RequestContext, principal: &Principal, query: &ListQuery) -> Result<Vec<Car>, ServiceError> {
        self.crud.list(ctx, principal, query).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        id: Uuid,
        changes: UpdateCar,
    ) -> Result<Car, ServiceError> {
        changes.validate()?;
        self.crud.update(ctx, principal, id, |car| car.apply(changes)).await
    }

    pub async fn delete(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        self.crud.delete(ctx, principal, id).await
    }

    /// Repair history of one car. Anyone who may read the car may read it.
    pub async fn repairs(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        id: Uuid,
        query: &ListQuery,
    ) -> Result<Vec<Repair>, ServiceError> {
        let car = self.crud.load_for(ctx, principal, Operation::Read, id).await?;
        let filter = crate::database::ListFilter {
            owner_id: None,
            car_id: Some(car.meta.id),
            limit: query.limit.unwrap_or(self.page.default).clamp(1, self.page.max.max(1)),
            offset: query.offset.unwrap_or(0).max(0),
        };
        ctx.run(self.repairs.list(&filter)).await
    }

    async fn ensure_client(&self, ctx: &RequestContext, owner_id: Uuid) -> Result<(), ServiceError> {
        match ctx.run(self.users.get_by_id(owner_id)).await? {
            Some(user) if user.role == Role::Client && user.is_active => Ok(()),
            Some(_) => Err(ServiceError::invalid_field("owner_id", "owner must be an active client")),
            None => Err(ServiceError::invalid_field("owner_id", "owner does not exist")),
        }
    }
}
