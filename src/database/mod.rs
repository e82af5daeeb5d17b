pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use store::{FieldErrors, ListFilter, RecordMeta, Resource, ResourceStore, StoreError};

use std::sync::Arc;

use memory::{MemoryRepairStore, MemoryStore};
use models::{Appointment, Car, Client, Employee, Repair, User};

/// One store per entity, behind the backend-neutral trait.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn ResourceStore<User>>,
    pub cars: Arc<dyn ResourceStore<Car>>,
    pub repairs: Arc<dyn ResourceStore<Repair>>,
    pub appointments: Arc<dyn ResourceStore<Appointment>>,
    pub employees: Arc<dyn ResourceStore<Employee>>,
    pub clients: Arc<dyn ResourceStore<Client>>,
}

impl Stores {
    pub fn memory() -> Self {
        let cars = Arc::new(MemoryStore::<Car>::new());
        Self {
            users: Arc::new(MemoryStore::<User>::new()),
            repairs: Arc::new(MemoryRepairStore::new(cars.clone())),
            cars,
            appointments: Arc::new(MemoryStore::<Appointment>::new()),
            employees: Arc::new(MemoryStore::<Employee>::new()),
            clients: Arc::new(MemoryStore::<Client>::new()),
        }
    }

    pub fn postgres(db: &DatabaseManager) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(postgres::PgUserStore::new(pool.clone())),
            cars: Arc::new(postgres::PgCarStore::new(pool.clone())),
            repairs: Arc::new(postgres::PgRepairStore::new(pool.clone())),
            appointments: Arc::new(postgres::PgAppointmentStore::new(pool.clone())),
            employees: Arc::new(postgres::PgEmployeeStore::new(pool.clone())),
            clients: Arc::new(postgres::PgClientStore::new(pool)),
        }
    }
}
