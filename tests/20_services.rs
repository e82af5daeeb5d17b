//! Service-level ownership and lifecycle scenarios, without HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use garage_api::auth::{Principal, Role};
use garage_api::cache::NullCache;
use garage_api::config::AppConfig;
use garage_api::database::models::{Car, CreateCar, UpdateCar, User};
use garage_api::database::{ListFilter, ResourceStore, StoreError, Stores};
use garage_api::services::{ListQuery, RequestContext, ServiceError, Services};

fn config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "STORE_BACKEND" => Some("memory".to_string()),
        "PASSWORD_MEMORY_KIB" => Some("1024".to_string()),
        "PASSWORD_ITERATIONS" => Some("1".to_string()),
        _ => None,
    })
}

fn ctx() -> RequestContext {
    RequestContext::new(Duration::from_secs(5))
}

fn car_input(plate: &str, owner: Option<Uuid>) -> CreateCar {
    CreateCar {
        make: "Renault".into(),
        model: "Clio".into(),
        year: 2019,
        license_plate: plate.into(),
        vin: None,
        color: "Red".into(),
        mileage: 1000,
        owner_id: owner,
    }
}

struct World {
    services: Services,
    stores: Stores,
    admin: Principal,
}

impl World {
    fn new() -> Self {
        let stores = Stores::memory();
        let services = Services::new(stores.clone(), Arc::new(NullCache), &config()).expect("services");
        Self {
            services,
            stores,
            admin: Principal::new(Uuid::new_v4(), Role::Admin, true),
        }
    }

    async fn client(&self, name: &str) -> Principal {
        let user = User::new(&format!("{}@garage.test", name), "hash".into(), name, "Client", Role::Client);
        let user = self.stores.users.create(&user).await.expect("user");
        Principal::new(user.meta.id, Role::Client, true)
    }
}

#[tokio::test]
async fn admin_creates_car_for_client() {
    let world = World::new();
    let u1 = world.client("u1").await;

    let car = world
        .services
        .cars
        .create(&ctx(), &world.admin, car_input("AA-11-BB", Some(u1.id)))
        .await
        .unwrap();
    assert_eq!(car.owner_id, u1.id);

    let seen = world.services.cars.get(&ctx(), &u1, car.meta.id).await.unwrap();
    assert_eq!(seen.meta.id, car.meta.id);
}

#[tokio::test]
async fn client_create_forces_owner() {
    let world = World::new();
    let u1 = world.client("forced").await;
    let other = Uuid::new_v4();

    let car = world
        .services
        .cars
        .create(&ctx(), &u1, car_input("FO-RC-ED", Some(other)))
        .await
        .unwrap();
    assert_eq!(car.owner_id, u1.id);
}

#[tokio::test]
async fn client_listing_is_limited_to_own_cars() {
    let world = World::new();
    let u1 = world.client("lister").await;
    let u2 = world.client("other").await;

    for (plate, owner) in [("L-1", u1.id), ("L-2", u1.id), ("L-3", u2.id)] {
        world
            .services
            .cars
            .create(&ctx(), &world.admin, car_input(plate, Some(owner)))
            .await
            .unwrap();
    }

    // A client asking for someone else's cars still only gets their own
    let query = ListQuery { owner_id: Some(u2.id), ..Default::default() };
    let cars = world.services.cars.list(&ctx(), &u1, &query).await.unwrap();
    assert_eq!(cars.len(), 2);
    assert!(cars.iter().all(|c| c.owner_id == u1.id));

    let all = world.services.cars.list(&ctx(), &world.admin, &ListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn foreign_update_is_forbidden_and_leaves_record_unchanged() {
    let world = World::new();
    let u1 = world.client("victim").await;
    let u2 = world.client("intruder").await;
    let car = world
        .services
        .cars
        .create(&ctx(), &world.admin, car_input("VI-CT-IM", Some(u1.id)))
        .await
        .unwrap();

    let changes = UpdateCar { mileage: Some(1), ..Default::default() };
    let err = world.services.cars.update(&ctx(), &u2, car.meta.id, changes).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));

    let err = world.services.cars.get(&ctx(), &u2, car.meta.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));

    let stored = world.services.cars.get(&ctx(), &u1, car.meta.id).await.unwrap();
    assert_eq!(stored, car);
}

#[tokio::test]
async fn plate_is_unique_among_live_cars_only() {
    let world = World::new();
    let u1 = world.client("plates").await;
    let first = world
        .services
        .cars
        .create(&ctx(), &world.admin, car_input("XX-00-XX", Some(u1.id)))
        .await
        .unwrap();

    let err = world
        .services
        .cars
        .create(&ctx(), &world.admin, car_input("xx-00-xx", Some(u1.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists("car")));

    world.services.cars.delete(&ctx(), &world.admin, first.meta.id).await.unwrap();
    let second = world
        .services
        .cars
        .create(&ctx(), &world.admin, car_input("XX-00-XX", Some(u1.id)))
        .await
        .unwrap();
    assert_ne!(second.meta.id, first.meta.id);
}

#[tokio::test]
async fn second_delete_is_not_found_and_data_is_retained() {
    let world = World::new();
    let u1 = world.client("deleter").await;
    let car = world
        .services
        .cars
        .create(&ctx(), &u1, car_input("DE-LE-TE", None))
        .await
        .unwrap();

    world.services.cars.delete(&ctx(), &u1, car.meta.id).await.unwrap();
    let err = world.services.cars.delete(&ctx(), &u1, car.meta.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("car")));

    let err = world.services.cars.get(&ctx(), &world.admin, car.meta.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("car")));
    assert!(world.stores.cars.get_by_id(car.meta.id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_preserves_identity() {
    let world = World::new();
    let u1 = world.client("keeper").await;
    let car = world
        .services
        .cars
        .create(&ctx(), &u1, car_input("KE-EP-01", None))
        .await
        .unwrap();

    let changes = UpdateCar { color: Some("Green".into()), ..Default::default() };
    world.services.cars.update(&ctx(), &u1, car.meta.id, changes).await.unwrap();
    let after = world.services.cars.get(&ctx(), &u1, car.meta.id).await.unwrap();

    assert_eq!(after.meta.id, car.meta.id);
    assert_eq!(after.owner_id, car.owner_id);
    assert_eq!(after.meta.created_at, car.meta.created_at);
    assert!(after.meta.updated_at > car.meta.updated_at);
    assert_eq!(after.color, "Green");
}

#[tokio::test]
async fn inactive_principal_is_denied_everything() {
    let world = World::new();
    let u1 = world.client("sleepy").await;
    let car = world
        .services
        .cars
        .create(&ctx(), &u1, car_input("SL-EE-PY", None))
        .await
        .unwrap();

    let inactive = Principal::new(u1.id, Role::Client, false);
    assert!(matches!(
        world.services.cars.get(&ctx(), &inactive, car.meta.id).await,
        Err(ServiceError::Forbidden { .. })
    ));
    assert!(matches!(
        world.services.cars.create(&ctx(), &inactive, car_input("SL-EE-P2", None)).await,
        Err(ServiceError::Forbidden { .. })
    ));
}

/// Car store whose reads never finish in time.
struct StalledCars;

#[async_trait]
impl ResourceStore<Car> for StalledCars {
    async fn create(&self, record: &Car) -> Result<Car, StoreError> {
        Ok(record.clone())
    }

    async fn get_by_id(&self, _id: Uuid) -> Result<Option<Car>, StoreError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    async fn list(&self, _filter: &ListFilter) -> Result<Vec<Car>, StoreError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn update(&self, record: &Car) -> Result<Option<Car>, StoreError> {
        Ok(Some(record.clone()))
    }

    async fn soft_delete(&self, _id: Uuid, _at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn find_by_unique_key(&self, _key: &String) -> Result<Option<Car>, StoreError> {
        Ok(None)
    }
}

#[tokio::test]
async fn slow_store_hits_the_request_deadline() {
    let mut stores = Stores::memory();
    stores.cars = Arc::new(StalledCars) as Arc<dyn ResourceStore<Car>>;
    let services = Services::new(stores, Arc::new(NullCache), &config()).unwrap();
    let admin = Principal::new(Uuid::new_v4(), Role::Admin, true);

    let ctx = RequestContext::new(Duration::from_millis(50));
    let started = std::time::Instant::now();
    let err = services.cars.get(&ctx, &admin, Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Timeout));
    assert!(started.elapsed() < Duration::from_secs(5));
}
