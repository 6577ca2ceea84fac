//! # gatekeep-store
//!
//! Key-value store backends for the Gatekeep token store: Redis for
//! shared deployments and an in-memory map for tests and single-node
//! use. Backend selection happens in [`StoreManager`].

pub mod keys;
pub mod manager;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use manager::StoreManager;
#[cfg(feature = "memory")]
pub use memory::{MemoryDirectory, MemoryKvStore};
#[cfg(feature = "redis-backend")]
pub use redis::{RedisKvClient, RedisKvStore};
