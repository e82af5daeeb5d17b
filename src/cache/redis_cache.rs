use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::CacheStore;

const SCAN_BATCH: usize = 200;

/// Cache backed by a Redis server. Command failures are logged and behave
/// like misses; the store stays the source of truth.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Opens a managed connection and pings it once. Fails when the server
    /// cannot be reached within `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let mut conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| redis::RedisError::from((redis::ErrorKind::IoError, "connection timed out")))??;

        redis::cmd("PING").query_async::<_, ()>(&mut conn).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Redis GET {} failed: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, seconds).await {
            tracing::warn!("Redis SETEX {} failed: {}", key, e);
        }
    }

    async fn delete(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            tracing::warn!("Redis DEL {} failed: {}", key, e);
        }
    }

    async fn delete_prefix(&self, prefix: &str) {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;

        loop {
            let scanned = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async::<_, (u64, Vec<String>)>(&mut conn)
                .await;
            let (next, keys) = match scanned {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Redis SCAN {} failed: {}", pattern, e);
                    return;
                }
            };

            if !keys.is_empty() {
                if let Err(e) = conn.del::<_, ()>(keys).await {
                    tracing::warn!("Redis DEL for {} failed: {}", pattern, e);
                }
            }
            if next == 0 {
                return;
            }
            cursor = next;
        }
    }
}
