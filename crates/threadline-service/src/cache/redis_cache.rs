//! Redis-based cache implementation.

use super::{CacheInterface, MemoryUsage};
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config, Pool, PoolConfig, Runtime};
use std::sync::Arc;
use std::time::Duration;
use threadline_config::RedisConfig;
use threadline_core::{ThreadlineError, ThreadlineResult};
use tracing::{debug, info};

/// Redis-based cache service.
pub struct RedisCacheService {
    /// Redis connection pool.
    pool: Option<Arc<Pool>>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Build a connection pool from configuration.
    ///
    /// Connections are opened lazily, so an unreachable server surfaces as
    /// cache errors on use rather than here.
    pub fn connect(config: &RedisConfig) -> ThreadlineResult<Self> {
        let mut cfg = Config::from_url(config.url.clone());
        cfg.pool = Some(PoolConfig::new(config.pool_size as usize));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ThreadlineError::Cache(format!("Failed to create Redis pool: {}", e)))?;

        info!("Redis connection pool created");
        Ok(Self::new(Arc::new(pool)))
    }

    /// Create a no-op cache service (for when caching is disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ThreadlineResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool.get().await.map_err(|e| {
                ThreadlineError::Cache(format!("Failed to get Redis connection: {}", e))
            }),
            None => Err(ThreadlineError::cache("Cache is disabled")),
        }
    }
}

/// Extracts memory figures from an `INFO memory` reply.
///
/// `maxmemory` is the configured ceiling; when it is 0 (no limit) the host's
/// `total_system_memory` is used instead.
#[must_use]
pub fn parse_memory_info(info: &str) -> MemoryUsage {
    let mut used = 0;
    let mut max_memory = 0;
    let mut system_memory = 0;

    for line in info.lines() {
        let Some((field, value)) = line.trim().split_once(':') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<u64>() else {
            continue;
        };
        match field {
            "used_memory" => used = value,
            "maxmemory" => max_memory = value,
            "total_system_memory" => system_memory = value,
            _ => {}
        }
    }

    let total = if max_memory > 0 { max_memory } else { system_memory };
    MemoryUsage::new(used, total)
}

#[async_trait]
impl CacheInterface for RedisCacheService {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> ThreadlineResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            ThreadlineError::Cache(format!("Failed to get key '{}': {}", key, e))
        })?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> ThreadlineResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await.map_err(|e| {
            ThreadlineError::Cache(format!("Failed to set key '{}': {}", key, e))
        })?;

        debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ThreadlineResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn.del(key).await.map_err(|e| {
            ThreadlineError::Cache(format!("Failed to delete key '{}': {}", key, e))
        })?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn keys(&self, pattern: &str) -> ThreadlineResult<Vec<String>> {
        if !self.is_enabled() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn().await?;

        // KEYS blocks the server while it walks the keyspace
        let keys: Vec<String> = deadpool_redis::redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
            .map_err(|e| ThreadlineError::Cache(format!("Failed to list keys: {}", e)))?;

        Ok(keys)
    }

    async fn delete_pattern(&self, pattern: &str) -> ThreadlineResult<u64> {
        let keys = self.keys(pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let deleted: u64 = conn.del(&keys).await.map_err(|e| {
            ThreadlineError::Cache(format!("Failed to delete keys: {}", e))
        })?;

        debug!("Deleted {} keys matching pattern '{}'", deleted, pattern);
        Ok(deleted)
    }

    async fn ttl(&self, key: &str) -> ThreadlineResult<i64> {
        if !self.is_enabled() {
            return Ok(super::TTL_MISSING);
        }

        let mut conn = self.get_conn().await?;
        let ttl: i64 = conn.ttl(key).await.map_err(|e| {
            ThreadlineError::Cache(format!("Failed to read TTL of '{}': {}", key, e))
        })?;

        Ok(ttl)
    }

    async fn memory_usage(&self) -> ThreadlineResult<MemoryUsage> {
        if !self.is_enabled() {
            return Ok(MemoryUsage::default());
        }

        let mut conn = self.get_conn().await?;
        let info: String = deadpool_redis::redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await
            .map_err(|e| ThreadlineError::Cache(format!("Failed to read memory info: {}", e)))?;

        let usage = parse_memory_info(&info);
        debug!(used = usage.used, total = usage.total, "Redis memory usage");
        Ok(usage)
    }
}
