//! Store manager that dispatches to the configured backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use gatekeep_core::config::store::StoreConfig;
use gatekeep_core::error::AppError;
use gatekeep_core::result::AppResult;
use gatekeep_core::traits::kv::KvBackend;

/// Store manager that wraps the configured key-value backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner key-value backend.
    inner: Arc<dyn KvBackend>,
}

impl StoreManager {
    /// Create a store manager from configuration.
    pub async fn from_config(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn KvBackend> = match config.backend.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis store backend");
                let client = crate::redis::RedisKvClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisKvStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory store backend");
                Arc::new(crate::memory::MemoryKvStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store backend: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a store manager from an existing backend (for testing).
    pub fn from_backend(backend: Arc<dyn KvBackend>) -> Self {
        Self { inner: backend }
    }

    /// Get a reference to the inner backend.
    pub fn backend(&self) -> &dyn KvBackend {
        self.inner.as_ref()
    }
}

#[async_trait]
impl KvBackend for StoreManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set_ex(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.inner.delete(key).await
    }

    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        self.inner.scan_keys(pattern).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
