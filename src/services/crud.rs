//! Authorization-aware CRUD shared by every entity service.
//!
//! Order of checks on each path: liveness (NotFound), policy (Forbidden),
//! domain validation (InvalidInput), uniqueness among live records
//! (AlreadyExists), then the store write.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::context::RequestContext;
use super::error::ServiceError;
use crate::auth::Principal;
use crate::database::store::{now, now_after};
use crate::database::{ListFilter, Resource, ResourceStore};
use crate::policy::{self, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: i64,
    pub max: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: ListFilter::DEFAULT_LIMIT,
            max: 1000,
        }
    }
}

/// Requested listing, before the policy narrows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    pub owner_id: Option<Uuid>,
    pub car_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub struct Crud<R: Resource> {
    store: Arc<dyn ResourceStore<R>>,
    page: PageLimits,
}

impl<R: Resource> Crud<R> {
    pub fn new(store: Arc<dyn ResourceStore<R>>, page: PageLimits) -> Self {
        Self { store, page }
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore<R>> {
        &self.store
    }

    pub fn authorize(&self, principal: &Principal, op: Operation, owner: Option<Uuid>) -> Result<(), ServiceError> {
        if policy::authorize(principal, op, owner, &R::CAPABILITIES).is_allowed() {
            return Ok(());
        }
        debug!(
            "Denied {} {} to {} {} (owner {:?})",
            op,
            R::KIND,
            principal.role,
            principal.id,
            owner
        );
        Err(ServiceError::forbidden(R::KIND, op))
    }

    /// Owner a new record must carry for this principal, or `None` when the
    /// principal may create on behalf of anyone. Fails for principals who can
    /// never create this entity.
    pub fn forced_owner(&self, principal: &Principal) -> Result<Option<Uuid>, ServiceError> {
        let caps = &R::CAPABILITIES;
        if policy::bypasses_ownership(principal, Operation::Create, caps) {
            return Ok(None);
        }
        if !principal.active || !caps.owner.contains(Operation::Create) {
            return Err(ServiceError::forbidden(R::KIND, Operation::Create));
        }
        Ok(Some(principal.id))
    }

    /// Live record or `NotFound`, without an authorization check.
    pub async fn live(&self, ctx: &RequestContext, id: Uuid) -> Result<R, ServiceError> {
        ctx.run(self.store.get_by_id(id))
            .await?
            .ok_or(ServiceError::NotFound(R::KIND))
    }

    /// Live record the principal may perform `op` on.
    pub async fn load_for(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        op: Operation,
        id: Uuid,
    ) -> Result<R, ServiceError> {
        let record = self.live(ctx, id).await?;
        self.authorize(principal, op, record.owner_id())?;
        Ok(record)
    }

    pub async fn create(&self, ctx: &RequestContext, principal: &Principal, mut record: R) -> Result<R, ServiceError> {
        if !policy::bypasses_ownership(principal, Operation::Create, &R::CAPABILITIES) {
            record.set_owner(principal.id);
        }
        self.authorize(principal, Operation::Create, record.owner_id())?;
        record.validate()?;
        self.ensure_unique(ctx, &record).await?;

        let created = ctx.run(self.store.create(&record)).await?;
        info!("Created {} {} by {}", R::KIND, created.id(), principal.id);
        Ok(created)
    }

    pub async fn get(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<R, ServiceError> {
        self.load_for(ctx, principal, Operation::Read, id).await
    }

    /// Narrows a requested listing to what the principal may see.
    pub fn scope(&self, principal: &Principal, query: &ListQuery) -> Result<ListFilter, ServiceError> {
        let caps = &R::CAPABILITIES;
        let owner_id = if policy::bypasses_ownership(principal, Operation::List, caps) {
            query.owner_id
        } else if principal.active && caps.owner.contains(Operation::List) {
            Some(principal.id)
        } else {
            return Err(ServiceError::forbidden(R::KIND, Operation::List));
        };

        Ok(ListFilter {
            owner_id,
            car_id: query.car_id,
            limit: query.limit.unwrap_or(self.page.default).clamp(1, self.page.max.max(1)),
            offset: query.offset.unwrap_or(0).max(0),
        })
    }

    pub async fn list(&self, ctx: &RequestContext, principal: &Principal, query: &ListQuery) -> Result<Vec<R>, ServiceError> {
        let filter = self.scope(principal, query)?;
        match filter {
            ListFilter { owner_id: Some(owner), car_id: None, limit, offset } => {
                ctx.run(self.store.get_by_owner(owner, limit, offset)).await
            }
            _ => ctx.run(self.store.list(&filter)).await,
        }
    }

    pub async fn update<F>(&self, ctx: &RequestContext, principal: &Principal, id: Uuid, apply: F) -> Result<R, ServiceError>
    where
        F: FnOnce(R) -> R,
    {
        let existing = self.load_for(ctx, principal, Operation::Update, id).await?;
        let next = apply(existing.clone());
        self.save(ctx, principal, &existing, next).await
    }

    /// Persists `next` over `existing`, keeping identity, ownership and
    /// creation time from the stored record. The caller must already have
    /// authorized the update.
    pub async fn save(&self, ctx: &RequestContext, principal: &Principal, existing: &R, mut next: R) -> Result<R, ServiceError> {
        {
            let meta = next.meta_mut();
            meta.id = existing.meta().id;
            meta.created_at = existing.meta().created_at;
            meta.deleted_at = None;
        }
        if let Some(owner) = existing.owner_id() {
            next.set_owner(owner);
        }

        next.validate()?;
        self.ensure_unique(ctx, &next).await?;
        next.meta_mut().updated_at = now_after(existing.meta().updated_at);

        let updated = ctx
            .run(self.store.update(&next))
            .await?
            .ok_or(ServiceError::NotFound(R::KIND))?;
        info!("Updated {} {} by {}", R::KIND, updated.id(), principal.id);
        Ok(updated)
    }

    pub async fn delete(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        self.load_for(ctx, principal, Operation::Delete, id).await?;
        if !ctx.run(self.store.soft_delete(id, now())).await? {
            // Lost a race with another delete
            return Err(ServiceError::NotFound(R::KIND));
        }
        info!("Deleted {} {} by {}", R::KIND, id, principal.id);
        Ok(())
    }

    async fn ensure_unique(&self, ctx: &RequestContext, record: &R) -> Result<(), ServiceError> {
        match ctx.run(self.store.find_by_unique_key(&record.unique_key())).await? {
            Some(existing) if existing.id() != record.id() => Err(ServiceError::AlreadyExists(R::KIND)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::database::memory::MemoryStore;
    use crate::database::models::{Car, CreateCar};
    use std::time::Duration;

    fn crud() -> Crud<Car> {
        Crud::new(Arc::new(MemoryStore::<Car>::new()), PageLimits { default: 2, max: 3 })
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Duration::from_secs(5))
    }

    fn car(plate: &str, owner: Uuid) -> Car {
        Car::from_input(
            CreateCar {
                make: "Fiat".into(),
                model: "Panda".into(),
                year: 2015,
                license_plate: plate.into(),
                vin: None,
                color: "White".into(),
                mileage: 1,
                owner_id: None,
            },
            owner,
        )
    }

    #[test]
    fn scope_clamps_paging() {
        let crud = crud();
        let admin = Principal::new(Uuid::new_v4(), Role::Admin, true);

        let filter = crud.scope(&admin, &ListQuery::default()).unwrap();
        assert_eq!((filter.limit, filter.offset, filter.owner_id), (2, 0, None));

        let query = ListQuery { limit: Some(500), offset: Some(-4), ..Default::default() };
        let filter = crud.scope(&admin, &query).unwrap();
        assert_eq!((filter.limit, filter.offset), (3, 0));
    }

    #[test]
    fn scope_forces_client_owner() {
        let crud = crud();
        let client = Principal::new(Uuid::new_v4(), Role::Client, true);
        let query = ListQuery { owner_id: Some(Uuid::new_v4()), ..Default::default() };
        assert_eq!(crud.scope(&client, &query).unwrap().owner_id, Some(client.id));
    }

    #[test]
    fn forced_owner_by_role() {
        let crud = crud();
        let admin = Principal::new(Uuid::new_v4(), Role::Admin, true);
        let client = Principal::new(Uuid::new_v4(), Role::Client, true);
        let inactive = Principal::new(Uuid::new_v4(), Role::Client, false);
        assert_eq!(crud.forced_owner(&admin).unwrap(), None);
        assert_eq!(crud.forced_owner(&client).unwrap(), Some(client.id));
        assert!(matches!(crud.forced_owner(&inactive), Err(ServiceError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn client_listing_is_owner_scoped_and_paged() {
        let crud = crud();
        let ctx = ctx();
        let admin = Principal::new(Uuid::new_v4(), Role::Admin, true);
        let client = Principal::new(Uuid::new_v4(), Role::Client, true);
        for plate in ["OWN-1", "OWN-2", "OWN-3"] {
            crud.create(&ctx, &admin, car(plate, client.id)).await.unwrap();
        }
        crud.create(&ctx, &admin, car("OTHER-1", Uuid::new_v4())).await.unwrap();

        let first = crud.list(&ctx, &client, &ListQuery::default()).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|c| c.owner_id == client.id));

        let gone = first[0].id();
        crud.delete(&ctx, &admin, gone).await.unwrap();
        let query = ListQuery { limit: Some(3), ..Default::default() };
        let rest = crud.list(&ctx, &client, &query).await.unwrap();
        assert_eq!(rest.len(), 2);
        assert!(rest.iter().all(|c| c.owner_id == client.id && c.id() != gone));

        assert_eq!(crud.list(&ctx, &admin, &query).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_preserves_identity_and_advances_updated_at() {
        let crud = crud();
        let ctx = ctx();
        let owner = Principal::new(Uuid::new_v4(), Role::Client, true);
        let created = crud.create(&ctx, &owner, car("UP-01", owner.id)).await.unwrap();

        let updated = crud
            .update(&ctx, &owner, created.id(), |mut c| {
                c.mileage = 99;
                c.owner_id = Uuid::new_v4();
                c.meta.created_at = now() - chrono::Duration::days(3);
                c
            })
            .await
            .unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.owner_id, owner.id);
        assert_eq!(updated.meta.created_at, created.meta.created_at);
        assert!(updated.meta.updated_at > created.meta.updated_at);
        assert_eq!(updated.mileage, 99);
    }

    #[tokio::test]
    async fn duplicate_key_on_update_is_rejected() {
        let crud = crud();
        let ctx = ctx();
        let admin = Principal::new(Uuid::new_v4(), Role::Admin, true);
        let owner = Uuid::new_v4();
        crud.create(&ctx, &admin, car("DUP-1", owner)).await.unwrap();
        let second = crud.create(&ctx, &admin, car("DUP-2", owner)).await.unwrap();

        let err = crud
            .update(&ctx, &admin, second.id(), |mut c| {
                c.license_plate = "DUP-1".into();
                c
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists("car")));
    }
}
