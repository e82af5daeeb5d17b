//! Optional read-through cache for hot lookups.
//!
//! Values are stored as JSON strings so any backend speaking strings can sit
//! behind [`CacheStore`]. Misses and decode failures are never errors.

pub mod memory;
pub mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::database::manager::redact_url;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
    async fn delete(&self, key: &str);
    async fn delete_prefix(&self, prefix: &str);
}

/// Cache that never holds anything. Used when caching is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl CacheStore for NullCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) {}

    async fn delete(&self, _key: &str) {}

    async fn delete_prefix(&self, _prefix: &str) {}
}

/// Picks the cache backend: Redis when `CACHE_URL` is set, the in-process
/// cache otherwise. An unreachable Redis degrades to no caching.
pub async fn from_config(config: &CacheConfig, connect_timeout: Duration) -> Arc<dyn CacheStore> {
    if !config.enabled {
        return Arc::new(NullCache);
    }
    let Some(url) = config.url.as_deref() else {
        return Arc::new(MemoryCache::new());
    };

    match RedisCache::connect(url, connect_timeout).await {
        Ok(cache) => {
            tracing::info!("Using Redis cache at {}", redact_url(url));
            Arc::new(cache)
        }
        Err(e) => {
            tracing::warn!("Redis cache at {} unavailable, caching disabled: {}", redact_url(url), e);
            Arc::new(NullCache)
        }
    }
}

pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Option<T> {
    let raw = cache.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Dropping undecodable cache entry {}: {}", key, e);
            cache.delete(key).await;
            None
        }
    }
}

pub async fn set_json<T: Serialize + ?Sized>(cache: &dyn CacheStore, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_string(value) {
        Ok(raw) => cache.set(key, raw, ttl).await,
        Err(e) => tracing::warn!("Skipping cache write for {}: {}", key, e),
    }
}
