use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::CacheStore;

/// In-process TTL cache. Expired entries are dropped when read and swept on
/// every write, so keys nobody asks for again do not accumulate.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, (Instant, String)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        // Fast path: try read lock
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((expires, value)) if *expires > Instant::now() => return Some(value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        if matches!(entries.get(key), Some((expires, _)) if *expires <= Instant::now()) {
            entries.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (expires, _)| *expires > now);
        entries.insert(key.to_string(), (now + ttl, value));
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    async fn delete_prefix(&self, prefix: &str) {
        self.entries.write().await.retain(|key, _| !key.starts_with(prefix));
    }
}
