//! Cache-aside mirror over a [`CacheInterface`].

use super::{CacheExt, CacheInterface, EvictionPolicy};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Typed, failure-tolerant view of the cache used by the service.
///
/// Reads turn every cache problem into a miss and writes never fail; the
/// caller always has the store of record to fall back on. Each successful
/// write runs the eviction policy inline.
#[derive(Clone)]
pub struct CacheMirror {
    cache: Arc<dyn CacheInterface>,
    eviction: Arc<dyn EvictionPolicy>,
    ttl: Duration,
}

impl CacheMirror {
    /// Creates a mirror writing entries with the given TTL.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheInterface>, eviction: Arc<dyn EvictionPolicy>, ttl: Duration) -> Self {
        Self { cache, eviction, ttl }
    }

    /// Returns the TTL applied to every entry.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Reads and deserializes a cached value. `None` on miss or on any error.
    pub async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cached value, treating as miss");
                None
            }
        }
    }

    /// Serializes and stores a value, then runs the eviction policy.
    ///
    /// Failures are logged and dropped.
    pub async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) {
        if !self.cache.is_enabled() {
            return;
        }

        if let Err(e) = self.cache.set(key, value, self.ttl).await {
            warn!(key = %key, error = %e, "Failed to write cache entry");
            return;
        }

        info!(key = %key, "Data set to cache");
        self.eviction.relieve(self.cache.as_ref()).await;
    }

    /// Deletes every key matching a glob pattern. Failures are logged and dropped.
    pub async fn invalidate(&self, pattern: &str) {
        match self.cache.delete_pattern(pattern).await {
            Ok(0) => {}
            Ok(deleted) => info!(pattern = %pattern, deleted, "Cleared cache"),
            Err(e) => warn!(pattern = %pattern, error = %e, "Failed to clear cache"),
        }
    }
}

impl std::fmt::Debug for CacheMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheMirror")
            .field("enabled", &self.cache.is_enabled())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
