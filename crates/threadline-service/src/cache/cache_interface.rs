//! Cache interface trait for abstracted caching operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use threadline_core::ThreadlineResult;

/// TTL reported for a key that does not exist.
pub const TTL_MISSING: i64 = -2;

/// TTL reported for a key that exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// Aggregate memory figures reported by a cache store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Bytes currently used.
    pub used: u64,
    /// Bytes available in total; 0 when the store does not know.
    pub total: u64,
}

impl MemoryUsage {
    /// Creates a new memory usage reading.
    #[must_use]
    pub const fn new(used: u64, total: u64) -> Self {
        Self { used, total }
    }

    /// Returns `used / total`, or `None` when the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.used as f64 / self.total as f64)
        }
    }
}

/// Cache interface for storing and retrieving cached data.
///
/// This trait provides an abstraction over caching implementations,
/// allowing for easy swapping between Redis, in-memory, or other cache backends.
///
/// Uses JSON strings for type-erased storage to maintain dyn-compatibility.
/// Patterns follow Redis `KEYS` glob rules (`*`, `?`, `[...]`).
#[async_trait]
pub trait CacheInterface: Send + Sync {
    /// Get a raw JSON value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> ThreadlineResult<Option<String>>;

    /// Set a raw JSON value in the cache with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> ThreadlineResult<()>;

    /// Delete a value from the cache.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> ThreadlineResult<bool>;

    /// List the keys matching a pattern.
    async fn keys(&self, pattern: &str) -> ThreadlineResult<Vec<String>>;

    /// Delete multiple keys matching a pattern.
    ///
    /// Returns the number of keys deleted.
    async fn delete_pattern(&self, pattern: &str) -> ThreadlineResult<u64>;

    /// Remaining time to live of a key, in seconds.
    ///
    /// Returns [`TTL_MISSING`] for an absent key and [`TTL_PERSISTENT`] for a
    /// key without expiry.
    async fn ttl(&self, key: &str) -> ThreadlineResult<i64>;

    /// Aggregate memory usage of the store.
    async fn memory_usage(&self) -> ThreadlineResult<MemoryUsage>;

    /// Check if caching is enabled.
    fn is_enabled(&self) -> bool;
}

/// Extension trait with typed methods for convenience.
///
/// This trait provides generic get/set methods that work with any serializable type.
#[async_trait]
pub trait CacheExt: CacheInterface {
    /// Get a typed value from the cache.
    async fn get<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> ThreadlineResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => {
                let value: T = serde_json::from_str(&json)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value in the cache.
    async fn set<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> ThreadlineResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, ttl).await
    }
}

// Blanket implementation for all CacheInterface implementations
impl<T: CacheInterface + ?Sized> CacheExt for T {}
