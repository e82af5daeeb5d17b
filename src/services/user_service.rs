use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;
use super::crud::{Crud, ListQuery, PageLimits};
use super::error::ServiceError;
use crate::auth::{PasswordHasher, Principal};
use crate::database::models::{CreateUser, UpdateUser, User};
use crate::database::ResourceStore;
use crate::policy::Operation;

/// Account administration. Managers create accounts with any role; everyone
/// else can only see and edit their own.
pub struct UserService {
    crud: Crud<User>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(users: Arc<dyn ResourceStore<User>>, hasher: PasswordHasher, page: PageLimits) -> Self {
        Self {
            crud: Crud::new(users, page),
            hasher,
        }
    }

    pub async fn create(&self, ctx: &RequestContext, principal: &Principal, input: CreateUser) -> Result<User, ServiceError> {
        input.validate()?;
        self.crud.forced_owner(principal)?;

        let CreateUser {
            email,
            password,
            first_name,
            last_name,
            role,
            is_active,
        } = input;
        let password_hash = self.hash(ctx, password).await?;
        let mut user = User::new(&email, password_hash, &first_name, &last_name, role);
        if let Some(is_active) = is_active {
            user.is_active = is_active;
        }

        self.crud.create(ctx, principal, user).await
    }

    pub async fn get(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<User, ServiceError> {
        self.crud.get(ctx, principal, id).await
    }

    pub async fn list(&self, ctx: &RequestContext, principal: &Principal, query: &ListQuery) -> Result<Vec<User>, ServiceError> {
        self.crud.list(ctx, principal, query).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        id: Uuid,
        mut changes: UpdateUser,
    ) -> Result<User, ServiceError> {
        changes.validate()?;
        let existing = self.crud.load_for(ctx, principal, Operation::Update, id).await?;
        if changes.changes_access() && !principal.role.can_manage() {
            return Err(ServiceError::forbidden("user", Operation::Update));
        }

        let password_hash = match changes.password.take() {
            Some(password) => Some(self.hash(ctx, password).await?),
            None => None,
        };

        let next = existing.clone().apply(changes, password_hash);
        self.crud.save(ctx, principal, &existing, next).await
    }

    pub async fn delete(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        self.crud.delete(ctx, principal, id).await
    }

    async fn hash(&self, ctx: &RequestContext, password: String) -> Result<String, ServiceError> {
        ctx.guard(async { self.hasher.hash_blocking(password).await.map_err(ServiceError::from) })
            .await
    }
}
