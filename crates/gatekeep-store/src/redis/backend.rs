//! Redis key-value backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use gatekeep_core::error::{AppError, ErrorKind};
use gatekeep_core::result::AppResult;
use gatekeep_core::traits::kv::KvBackend;

use super::client::RedisKvClient;

/// Redis-backed key-value store.
#[derive(Debug, Clone)]
pub struct RedisKvStore {
    /// Redis client.
    client: RedisKvClient,
}

impl RedisKvStore {
    /// Create a new Redis key-value store.
    pub fn new(client: RedisKvClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl KvBackend for RedisKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        // SETEX rejects a zero expiry; sub-second TTLs round up to one second.
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(&full_key, value, seconds)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let removed: i64 = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(removed > 0)
    }

    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        let full_pattern = self.client.prefixed_key(pattern);
        let mut conn = self.client.conn_mut();

        // Full keyspace scan: O(total keys), not O(matching keys).
        let found: Vec<String> = redis::cmd("KEYS")
            .arg(&full_pattern)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(pattern, count = found.len(), "Scanned keys");

        // Callers see keys as they stored them, without our prefix.
        let prefix = self.client.prefix();
        Ok(found
            .into_iter()
            .map(|key| match key.strip_prefix(prefix) {
                Some(stripped) => stripped.to_string(),
                None => key,
            })
            .collect())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: bool = conn.exists(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
