//! Domain services. Each one wraps the store for its entity with the
//! ownership policy, validation and the request deadline.

pub mod appointment_service;
pub mod auth_service;
pub mod car_service;
pub mod client_service;
pub mod context;
pub mod crud;
pub mod employee_service;
pub mod error;
pub mod repair_service;
pub mod user_service;

pub use appointment_service::AppointmentService;
pub use auth_service::{AuthService, AuthSession};
pub use car_service::CarService;
pub use client_service::ClientService;
pub use context::RequestContext;
pub use crud::{Crud, ListQuery, PageLimits};
pub use employee_service::{CacheTtl, EmployeeService};
pub use error::{ErrorKind, ServiceError};
pub use repair_service::RepairService;
pub use user_service::UserService;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{PasswordError, PasswordHasher};
use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::database::Stores;

pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub cars: CarService,
    pub repairs: RepairService,
    pub appointments: AppointmentService,
    pub employees: EmployeeService,
    pub clients: ClientService,
}

impl Services {
    pub fn new(stores: Stores, cache: Arc<dyn CacheStore>, config: &AppConfig) -> Result<Self, PasswordError> {
        let hasher = PasswordHasher::new(config.security.password_memory_kib, config.security.password_iterations)?;
        let page = PageLimits {
            default: config.api.default_page_size,
            max: config.api.max_page_size,
        };
        let ttl = CacheTtl {
            record: Duration::from_secs(config.cache.ttl_secs),
            list: Duration::from_secs(config.cache.list_ttl_secs),
        };

        Ok(Self {
            auth: AuthService::new(
                stores.users.clone(),
                hasher.clone(),
                config.security.jwt_secret.clone(),
                config.security.jwt_expiry_hours,
            ),
            users: UserService::new(stores.users.clone(), hasher, page),
            cars: CarService::new(stores.cars.clone(), stores.users.clone(), stores.repairs.clone(), page),
            repairs: RepairService::new(stores.repairs.clone(), stores.cars.clone(), page),
            appointments: AppointmentService::new(stores.appointments.clone(), stores.cars.clone(), page),
            employees: EmployeeService::new(stores.employees.clone(), stores.users.clone(), cache, ttl, page),
            clients: ClientService::new(stores.clients, stores.users, page),
        })
    }
}
