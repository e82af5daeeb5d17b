use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use thiserror::Error;
use uuid::Uuid;

use crate::policy::Capabilities;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A live record already holds the unique key.
    #[error("{0} violates a uniqueness constraint")]
    Conflict(&'static str),

    #[error("stored {kind} is unreadable: {message}")]
    Corrupt { kind: &'static str, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Domain-level rejection of a record's contents, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Identity and lifecycle columns shared by every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    pub fn new() -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Current time at the precision Postgres stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly after `previous`, even when the clock has not moved.
pub fn now_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// A persisted entity with a single owner reference and a unique key among
/// live records.
pub trait Resource: Clone + Send + Sync + 'static {
    type Key: Clone + PartialEq + Debug + Send + Sync;

    const KIND: &'static str;
    const CAPABILITIES: Capabilities;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// User that owns this record, if it can be determined.
    fn owner_id(&self) -> Option<Uuid>;

    /// Reassigns the owner. Entities whose owner is derived ignore this.
    fn set_owner(&mut self, _owner: Uuid) {}

    /// Car the record hangs off, for entities that reference one.
    fn car_id(&self) -> Option<Uuid> {
        None
    }

    fn unique_key(&self) -> Self::Key;

    fn validate(&self) -> Result<(), FieldErrors>;

    fn id(&self) -> Uuid {
        self.meta().id
    }

    fn is_live(&self) -> bool {
        self.meta().is_live()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    pub owner_id: Option<Uuid>,
    pub car_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

impl ListFilter {
    pub const DEFAULT_LIMIT: i64 = 50;

    pub fn all() -> Self {
        Self {
            owner_id: None,
            car_id: None,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Default for ListFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Persistence for one entity type. Every read applies the liveness
/// predicate: tombstoned records are invisible.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    async fn create(&self, record: &R) -> Result<R, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<R>, StoreError>;

    /// Live records in creation order, filtered and paged.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<R>, StoreError>;

    /// Replaces a live record. `None` when it is absent or tombstoned.
    async fn update(&self, record: &R) -> Result<Option<R>, StoreError>;

    /// Tombstones a live record. `false` when it is absent or already tombstoned.
    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    async fn find_by_unique_key(&self, key: &R::Key) -> Result<Option<R>, StoreError>;

    async fn get_by_owner(&self, owner: Uuid, limit: i64, offset: i64) -> Result<Vec<R>, StoreError> {
        let filter = ListFilter {
            owner_id: Some(owner),
            car_id: None,
            limit,
            offset,
        };
        self.list(&filter).await
    }
}
