//! Cache layer
//!
//! In-process caching for hot reads (entities by slug, category counts).
//! Values are stored as JSON so any serializable type fits behind one
//! interface.
//!
//! # Usage
//!
//! ```ignore
//! use inkpost::cache::{create_cache, CacheLayer};
//! use inkpost::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::config::CacheConfig;

/// Cache layer interface.
///
/// The methods are generic, so the trait cannot be used as a trait
/// object; services hold the concrete `Cache` type instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: std::time::Duration,
    ) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values whose key starts with the given prefix
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

pub use memory::MemoryCache;

/// The cache implementation used across the application.
pub type Cache = MemoryCache;

/// Create the cache from configuration.
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_entries,
        std::time::Duration::from_secs(config.ttl_seconds),
    ))
}
