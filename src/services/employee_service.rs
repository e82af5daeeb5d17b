use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;
use super::crud::{Crud, ListQuery, PageLimits};
use super::error::ServiceError;
use crate::auth::Principal;
use crate::cache::{self, CacheStore};
use crate::database::models::{CreateEmployee, Employee, UpdateEmployee, User};
use crate::database::{ListFilter, ResourceStore};
use crate::policy::Operation;

const RECORD_PREFIX: &str = "employee:";
const LIST_PREFIX: &str = "employees:list:";

#[derive(Debug, Clone, Copy)]
pub struct CacheTtl {
    pub record: Duration,
    pub list: Duration,
}

/// Employee records with a read-through cache in front of lookups and
/// listings. Every write drops the record entry and all cached listings.
pub struct EmployeeService {
    crud: Crud<Employee>,
    users: Arc<dyn ResourceStore<User>>,
    cache: Arc<dyn CacheStore>,
    ttl: CacheTtl,
}

fn record_key(id: Uuid) -> String {
    format!("{}{}", RECORD_PREFIX, id)
}

fn list_key(filter: &ListFilter) -> String {
    let owner = filter.owner_id.map(|id| id.to_string()).unwrap_or_else(|| "all".to_string());
    format!("{}{}:{}:{}", LIST_PREFIX, owner, filter.limit, filter.offset)
}

impl EmployeeService {
    pub fn new(
        employees: Arc<dyn ResourceStore<Employee>>,
        users: Arc<dyn ResourceStore<User>>,
        cache: Arc<dyn CacheStore>,
        ttl: CacheTtl,
        page: PageLimits,
    ) -> Self {
        Self {
            crud: Crud::new(employees, page),
            users,
            cache,
            ttl,
        }
    }

    pub async fn create(&self, ctx: &RequestContext, principal: &Principal, input: CreateEmployee) -> Result<Employee, ServiceError> {
        input.validate()?;
        self.crud.forced_owner(principal)?;

        if ctx.run(self.users.get_by_id(input.user_id)).await?.is_none() {
            return Err(ServiceError::invalid_field("user_id", "user does not exist"));
        }

        let employee = self.crud.create(ctx, principal, Employee::from_input(input)).await?;
        self.cache.delete_prefix(LIST_PREFIX).await;
        Ok(employee)
    }

    pub async fn get(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<Employee, ServiceError> {
        let key = record_key(id);
        if let Some(employee) = cache::get_json::<Employee>(self.cache.as_ref(), &key).await {
            tracing::debug!("Cache hit for {}", key);
            self.crud.authorize(principal, Operation::Read, Some(employee.user_id))?;
            return Ok(employee);
        }

        let employee = self.crud.get(ctx, principal, id).await?;
        cache::set_json(self.cache.as_ref(), &key, &employee, self.ttl.record).await;
        Ok(employee)
    }

    pub async fn list(&self, ctx: &RequestContext, principal: &Principal, query: &ListQuery) -> Result<Vec<Employee>, ServiceError> {
        let filter = self.crud.scope(principal, query)?;
        let key = list_key(&filter);
        if let Some(employees) = cache::get_json::<Vec<Employee>>(self.cache.as_ref(), &key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(employees);
        }

        let employees = ctx.run(self.crud.store().list(&filter)).await?;
        cache::set_json(self.cache.as_ref(), &key, &employees, self.ttl.list).await;
        Ok(employees)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        id: Uuid,
        changes: UpdateEmployee,
    ) -> Result<Employee, ServiceError> {
        changes.validate()?;
        let employee = self
            .crud
            .update(ctx, principal, id, |employee| employee.apply(changes))
            .await?;
        self.invalidate(id).await;
        Ok(employee)
    }

    pub async fn delete(&self, ctx: &RequestContext, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        self.crud.delete(ctx, principal, id).await?;
        self.invalidate(id).await;
        Ok(())
    }

    async fn invalidate(&self, id: Uuid) {
        self.cache.delete(&record_key(id)).await;
        self.cache.delete_prefix(LIST_PREFIX).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::cache::MemoryCache;
    use crate::database::memory::MemoryStore;
    use rust_decimal::Decimal;

    struct Fixture {
        service: EmployeeService,
        cache: MemoryCache,
        users: Arc<MemoryStore<User>>,
    }

    fn fixture() -> Fixture {
        let cache = MemoryCache::new();
        let users = Arc::new(MemoryStore::<User>::new());
        let ttl = CacheTtl {
            record: Duration::from_secs(60),
            list: Duration::from_secs(60),
        };
        let service = EmployeeService::new(
            Arc::new(MemoryStore::<Employee>::new()),
            users.clone(),
            Arc::new(cache.clone()),
            ttl,
            PageLimits::default(),
        );
        Fixture { service, cache, users }
    }

    fn input(user_id: Uuid, email: &str) -> CreateEmployee {
        CreateEmployee {
            user_id,
            first_name: "Rui".into(),
            last_name: "Costa".into(),
            email: email.into(),
            phone: None,
            department: "Mechanics".into(),
            position: "Technician".into(),
            hourly_rate: Decimal::new(1850, 2),
            hire_date: None,
        }
    }

    async fn seed_user(users: &MemoryStore<User>, role: Role) -> User {
        let user = User::new(&format!("{}@shop.pt", Uuid::new_v4()), "hash".into(), "Rui", "Costa", role);
        users.create(&user).await.unwrap()
    }

    #[tokio::test]
    async fn reads_are_cached_and_writes_invalidate() {
        let fx = fixture();
        let ctx = RequestContext::new(Duration::from_secs(5));
        let manager = Principal::new(Uuid::new_v4(), Role::Manager, true);
        let user = seed_user(&fx.users, Role::Employee).await;

        let created = fx.service.create(&ctx, &manager, input(user.meta.id, "rui@shop.pt")).await.unwrap();
        assert_eq!(created.employee_code.len(), 8);

        fx.service.get(&ctx, &manager, created.meta.id).await.unwrap();
        fx.service.list(&ctx, &manager, &ListQuery::default()).await.unwrap();
        assert_eq!(fx.cache.len().await, 2);

        let changes = UpdateEmployee { position: Some("Lead".into()), ..Default::default() };
        fx.service.update(&ctx, &manager, created.meta.id, changes).await.unwrap();
        assert_eq!(fx.cache.len().await, 0);

        let fetched = fx.service.get(&ctx, &manager, created.meta.id).await.unwrap();
        assert_eq!(fetched.position, "Lead");
    }

    #[tokio::test]
    async fn cached_record_still_checks_policy() {
        let fx = fixture();
        let ctx = RequestContext::new(Duration::from_secs(5));
        let manager = Principal::new(Uuid::new_v4(), Role::Manager, true);
        let user = seed_user(&fx.users, Role::Employee).await;
        let created = fx.service.create(&ctx, &manager, input(user.meta.id, "ana@shop.pt")).await.unwrap();
        fx.service.get(&ctx, &manager, created.meta.id).await.unwrap();

        let stranger = Principal::new(Uuid::new_v4(), Role::Client, true);
        let err = fx.service.get(&ctx, &stranger, created.meta.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));

        let own = Principal::new(user.meta.id, Role::Client, true);
        assert!(fx.service.get(&ctx, &own, created.meta.id).await.is_ok());
    }

    #[tokio::test]
    async fn deleted_employee_is_not_served_from_cache() {
        let fx = fixture();
        let ctx = RequestContext::new(Duration::from_secs(5));
        let admin = Principal::new(Uuid::new_v4(), Role::Admin, true);
        let user = seed_user(&fx.users, Role::Employee).await;
        let created = fx.service.create(&ctx, &admin, input(user.meta.id, "gone@shop.pt")).await.unwrap();
        fx.service.get(&ctx, &admin, created.meta.id).await.unwrap();

        fx.service.delete(&ctx, &admin, created.meta.id).await.unwrap();
        let err = fx.service.get(&ctx, &admin, created.meta.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("employee")));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let fx = fixture();
        let ctx = RequestContext::new(Duration::from_secs(5));
        let admin = Principal::new(Uuid::new_v4(), Role::Admin, true);
        let err = fx.service.create(&ctx, &admin, input(Uuid::new_v4(), "x@shop.pt")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput { .. }));
    }
}
