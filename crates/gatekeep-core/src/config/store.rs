//! Key-value store configuration.

use serde::{Deserialize, Serialize};

/// Top-level store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend: `"memory"` or `"redis"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Per-operation timeout in milliseconds. An elapsed timeout is
    /// treated as a failed operation, never as success.
    #[serde(default = "default_op_timeout")]
    pub op_timeout_ms: u64,
    /// Redis-specific store configuration.
    #[serde(default)]
    pub redis: RedisStoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            op_timeout_ms: default_op_timeout(),
            redis: RedisStoreConfig::default(),
        }
    }
}

/// Redis store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all Gatekeep keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_op_timeout() -> u64 {
    2000
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "gatekeep:".to_string()
}
