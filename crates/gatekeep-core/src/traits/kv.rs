//! Key-value backend trait for token storage.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for key-value backends (Redis or in-memory).
///
/// Values are serialized as strings (JSON). Each operation is atomic
/// for its single key; there is no multi-key transaction. An `Err`
/// from any method is an infrastructure failure (connection refused,
/// timeout), never a "not found" condition.
#[async_trait]
pub trait KvBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or
    /// has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with a per-key TTL, overwriting any prior value.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Delete a key. Returns whether a live value was removed.
    /// Idempotent.
    async fn delete(&self, key: &str) -> AppResult<bool>;

    /// List all keys matching a glob pattern (e.g. `"token:*"`).
    ///
    /// Full keyspace scan, O(total keys). Returned keys are exactly as
    /// they were passed to [`set_ex`](KvBackend::set_ex), without any
    /// backend-internal prefix.
    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>>;

    /// Check whether a key exists and has not expired.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
