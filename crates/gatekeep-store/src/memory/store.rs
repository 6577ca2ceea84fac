//! In-memory key-value store with per-entry expiry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use gatekeep_core::result::AppResult;
use gatekeep_core::traits::kv::KvBackend;

/// A stored value with its expiry deadline.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory key-value backend.
///
/// Expired entries are evicted lazily on access, so TTL behavior
/// matches Redis down to sub-second granularity. Intended for tests
/// and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    /// Live and not-yet-evicted entries.
    entries: DashMap<String, Entry>,
}

impl MemoryKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Return the live value for a key, evicting it if expired.
    fn get_live(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        if entry.is_expired() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }
}

#[async_trait]
impl KvBackend for MemoryKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.get_live(key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        // An already-expired entry counts as absent.
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        let prefix = pattern.trim_end_matches('*');
        let mut live = Vec::new();
        let mut dead = Vec::new();

        for entry in self.entries.iter() {
            if !entry.key().starts_with(prefix) {
                continue;
            }
            if entry.value().is_expired() {
                dead.push(entry.key().clone());
            } else {
                live.push(entry.key().clone());
            }
        }

        for key in &dead {
            self.entries.remove(key);
        }

        debug!(
            pattern,
            live = live.len(),
            evicted = dead.len(),
            "Scanned keys"
        );
        Ok(live)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.get_live(key).is_some())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get() {
        let store = MemoryKvStore::new();
        store
            .set_ex("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        let val = store.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = MemoryKvStore::new();
        store
            .set_ex("key2", "value2", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.delete("key2").await.unwrap());
        assert!(!store.delete("key2").await.unwrap());
        assert_eq!(store.get("key2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let store = MemoryKvStore::new();
        store
            .set_ex("short", "lived", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(store.exists("short").await.unwrap());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.get("short").await.unwrap(), None);
        assert!(!store.exists("short").await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_filters_by_prefix_and_skips_expired() {
        let store = MemoryKvStore::new();
        store
            .set_ex("token:a", "1", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set_ex("token:b", "2", Duration::from_millis(40))
            .await
            .unwrap();
        store
            .set_ex("other:c", "3", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(70)).await;
        let mut keys = store.scan_keys("token:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["token:a".to_string()]);
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let store = MemoryKvStore::new();
        store
            .set_ex("key", "old", Duration::from_millis(40))
            .await
            .unwrap();
        store
            .set_ex("key", "new", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert_eq!(store.get("key").await.unwrap(), Some("new".to_string()));
    }
}
