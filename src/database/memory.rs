//! In-process store backend used for local runs and tests.
//!
//! Mirrors the Postgres backend's guarantees: the liveness predicate on every
//! read, uniqueness among live records only, creation-order listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Car, Repair};
use super::store::{ListFilter, Resource, ResourceStore, StoreError};

pub struct MemoryStore<R: Resource> {
    records: RwLock<HashMap<Uuid, R>>,
}

impl<R: Resource> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Fetches a record whether or not it is tombstoned.
    pub async fn get_any(&self, id: Uuid) -> Option<R> {
        self.records.read().await.get(&id).cloned()
    }

    async fn select(&self, filter: &ListFilter, keep: impl Fn(&R) -> bool) -> Vec<R> {
        let records = self.records.read().await;
        let mut rows: Vec<R> = records
            .values()
            .filter(|r| r.is_live())
            .filter(|r| filter.owner_id.is_none() || r.owner_id() == filter.owner_id)
            .filter(|r| filter.car_id.is_none() || r.car_id() == filter.car_id)
            .filter(|r| keep(*r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.meta()
                .created_at
                .cmp(&b.meta().created_at)
                .then_with(|| a.id().cmp(&b.id()))
        });
        rows.into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect()
    }

    fn key_taken(records: &HashMap<Uuid, R>, key: &R::Key, except: Uuid) -> bool {
        records
            .values()
            .any(|r| r.is_live() && r.id() != except && r.unique_key() == *key)
    }
}

impl<R: Resource> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    async fn create(&self, record: &R) -> Result<R, StoreError> {
        let mut records = self.records.write().await;
        if Self::key_taken(&records, &record.unique_key(), record.id()) || records.contains_key(&record.id()) {
            return Err(StoreError::Conflict(R::KIND));
        }
        records.insert(record.id(), record.clone());
        Ok(record.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        Ok(self.get_any(id).await.filter(|r| r.is_live()))
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<R>, StoreError> {
        Ok(self.select(filter, |_| true).await)
    }

    async fn update(&self, record: &R) -> Result<Option<R>, StoreError> {
        let mut records = self.records.write().await;
        match records.get(&record.id()) {
            Some(existing) if existing.is_live() => {}
            _ => return Ok(None),
        }
        if Self::key_taken(&records, &record.unique_key(), record.id()) {
            return Err(StoreError::Conflict(R::KIND));
        }
        records.insert(record.id(), record.clone());
        Ok(Some(record.clone()))
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) if record.is_live() => {
                record.meta_mut().deleted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_unique_key(&self, key: &R::Key) -> Result<Option<R>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.is_live() && r.unique_key() == *key)
            .cloned())
    }
}

/// Repair store that resolves each repair's owner through the car store,
/// the way the Postgres backend joins `cars`.
pub struct MemoryRepairStore {
    repairs: MemoryStore<Repair>,
    cars: Arc<MemoryStore<Car>>,
}

impl MemoryRepairStore {
    pub fn new(cars: Arc<MemoryStore<Car>>) -> Self {
        Self {
            repairs: MemoryStore::new(),
            cars,
        }
    }

    async fn with_owner(&self, mut repair: Repair) -> Repair {
        repair.owner_id = self.cars.get_any(repair.car_id).await.map(|car| car.owner_id);
        repair
    }

    async fn with_owners(&self, repairs: Vec<Repair>) -> Vec<Repair> {
        let mut out = Vec::with_capacity(repairs.len());
        for repair in repairs {
            out.push(self.with_owner(repair).await);
        }
        out
    }

    async fn cars_owned_by(&self, owner: Uuid) -> HashSet<Uuid> {
        let cars = self.cars.records.read().await;
        cars.values()
            .filter(|car| car.owner_id == owner)
            .map(|car| car.meta.id)
            .collect()
    }
}

#[async_trait]
impl ResourceStore<Repair> for MemoryRepairStore {
    async fn create(&self, record: &Repair) -> Result<Repair, StoreError> {
        let created = self.repairs.create(record).await?;
        Ok(self.with_owner(created).await)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Repair>, StoreError> {
        match self.repairs.get_by_id(id).await? {
            Some(repair) => Ok(Some(self.with_owner(repair).await)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Repair>, StoreError> {
        let rows = match filter.owner_id {
            Some(owner) => {
                let owned = self.cars_owned_by(owner).await;
                let unscoped = ListFilter {
                    owner_id: None,
                    ..*filter
                };
                self.repairs
                    .select(&unscoped, |repair| owned.contains(&repair.car_id))
                    .await
            }
            None => self.repairs.list(filter).await?,
        };
        Ok(self.with_owners(rows).await)
    }

    async fn update(&self, record: &Repair) -> Result<Option<Repair>, StoreError> {
        match self.repairs.update(record).await? {
            Some(repair) => Ok(Some(self.with_owner(repair).await)),
            None => Ok(None),
        }
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        self.repairs.soft_delete(id, at).await
    }

    async fn find_by_unique_key(
        &self,
        key: &<Repair as Resource>::Key,
    ) -> Result<Option<Repair>, StoreError> {
        match self.repairs.find_by_unique_key(key).await? {
            Some(repair) => Ok(Some(self.with_owner(repair).await)),
            None => Ok(None),
        }
    }
}
