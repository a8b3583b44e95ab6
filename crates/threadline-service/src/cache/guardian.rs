//! Memory-pressure relief for the cache store.

use super::{cache_keys, CacheInterface};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Strategy run after each successful cache write to keep memory in check.
///
/// Implementations are best-effort: they log failures and never return them.
#[async_trait]
pub trait EvictionPolicy: Send + Sync {
    /// Inspects the cache and deletes keys if needed. Returns how many were deleted.
    async fn relieve(&self, cache: &dyn CacheInterface) -> usize;
}

/// Deletes keys with a negative or unreadable TTL once memory usage passes a threshold.
///
/// A negative TTL means the key is missing or was stored without expiry;
/// entries written by the service always carry one.
#[derive(Debug, Clone, Copy)]
pub struct ExpiredKeyReaper {
    threshold: f64,
}

impl ExpiredKeyReaper {
    /// Default used/total ratio above which the reaper runs.
    pub const DEFAULT_THRESHOLD: f64 = 0.75;

    /// Creates a reaper with the given used/total threshold.
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Returns the configured threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ExpiredKeyReaper {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

#[async_trait]
impl EvictionPolicy for ExpiredKeyReaper {
    async fn relieve(&self, cache: &dyn CacheInterface) -> usize {
        let usage = match cache.memory_usage().await {
            Ok(usage) => usage,
            Err(e) => {
                warn!(error = %e, "Failed to read cache memory usage");
                return 0;
            }
        };

        let Some(ratio) = usage.ratio() else {
            debug!(used = usage.used, "Cache reports no memory total, skipping eviction");
            return 0;
        };
        debug!(used = usage.used, total = usage.total, ratio, "Cache memory usage");

        if ratio <= self.threshold {
            return 0;
        }

        let keys = match cache.keys(&cache_keys::all_keys_pattern()).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list keys for eviction");
                return 0;
            }
        };

        let mut reaped = 0;
        for key in keys {
            let expired = match cache.ttl(&key).await {
                Ok(ttl) => ttl < 0,
                Err(e) => {
                    debug!(key = %key, error = %e, "TTL unreadable, treating key as expired");
                    true
                }
            };
            if !expired {
                continue;
            }

            match cache.delete(&key).await {
                Ok(_) => {
                    info!(key = %key, "Cleared expired cache key");
                    reaped += 1;
                }
                Err(e) => warn!(key = %key, error = %e, "Failed to delete expired cache key"),
            }
        }

        reaped
    }
}
