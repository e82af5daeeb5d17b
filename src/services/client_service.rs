use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;
use super::crud::{Crud, ListQuery, PageLimits};
use super::error::ServiceError;
use crate::auth::{Principal, Role};
use crate::database::models::{Client, CreateClient, UpdateClient, User};
use crate::database::ResourceStore;
use crate::policy::Operation;

pub struct ClientService {
    crud: Crud<Client>,
    users: Arc<dyn ResourceStore<User>>,
}

impl ClientService {
    pub fn new(clients: Arc<dyn ResourceStore<Client>>, users: Arc<dyn ResourceStore<User>>, page: PageLimits) -> Self {
        Self {
            crud: Crud::new(clients, page),
            users,
        }
    }

    /// Creates a client profile. Clients create their own; managers name the
    /// account it belongs to. Employees create none.
    pub async fn create(&self, ctx: &RequestContext, principal: &Principal, input: CreateClient) -> Result<Client, ServiceError> {
        input.validate()?;

        let user_id = match self.crud.forced_owner(principal)? {
            // A profile owned by a staff account is never a customer
            Some(_) if principal.role != Role::Client => {
                return Err(ServiceError::forbidden("client", Operation::Create));
            }
            Some(user_id) => user_id,
            None => {
                let user_id = input
                    .user_id
                    .ok_or_else(|| ServiceError::invalid_field("user_id", "user_id is required"))?;
                if ctx.run(self.users.get_by_id(user_id)).await?.is_none() {
                    return Err(ServiceError::invalid_field("user_id", "user does not exist"));
                }
                user_id
            }
        };

        self.crud.create(ctx, principal, Client::from_input(input, user_id)).await
    }

    pub async fn get(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<Client, ServiceError> {
        self.crud.get(ctx, principal, id).await
    }

    pub async fn list(&self, ctx: &RequestContext, principal: &Principal, query: &ListQuery) -> Result<Vec<Client>, ServiceError> {
        self.crud.list(ctx, principal, query).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        id: Uuid,
        changes: UpdateClient,
    ) -> Result<Client, ServiceError> {
        changes.validate()?;
        self.crud.update(ctx, principal, id, |client| client.apply(changes)).await
    }

    pub async fn delete(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        self.crud.delete(ctx, principal, id).await
    }
}
