//! Process-local cache backend.

use super::{glob, CacheInterface, MemoryUsage, TTL_MISSING};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use threadline_core::{ThreadlineError, ThreadlineResult};
use tracing::debug;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    fn size(&self, key: &str) -> u64 {
        (key.len() + self.value.len()) as u64
    }
}

/// In-memory cache with a byte capacity and lazy expiry.
///
/// Expired entries stay in the map until the next operation that touches
/// them. Usage is the sum of key and value lengths of live entries; writes
/// that would push it past the capacity are rejected, like a Redis server
/// running with `maxmemory` and `noeviction`.
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    capacity_bytes: u64,
}

impl InMemoryCache {
    /// Creates an empty cache that holds at most `capacity_bytes`.
    #[must_use]
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity_bytes,
        }
    }

    fn purge_expired(entries: &mut HashMap<String, Entry>, now: Instant) {
        entries.retain(|_, entry| !entry.is_expired(now));
    }

    fn used_bytes(entries: &HashMap<String, Entry>) -> u64 {
        entries.iter().map(|(key, entry)| entry.size(key)).sum()
    }
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("entries", &self.entries.lock().len())
            .field("capacity_bytes", &self.capacity_bytes)
            .finish()
    }
}

#[async_trait]
impl CacheInterface for InMemoryCache {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> ThreadlineResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let value = match entries.get(key).map(|entry| entry.is_expired(now)) {
            Some(true) => {
                entries.remove(key);
                None
            }
            Some(false) => entries.get(key).map(|entry| entry.value.clone()),
            None => None,
        };

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> ThreadlineResult<()> {
        let now = Instant::now();
        let ttl = ttl.max(Duration::from_secs(1));
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, now);

        let replaced = entries.get(key).map_or(0, |entry| entry.size(key));
        let needed = Self::used_bytes(&entries) - replaced + (key.len() + value.len()) as u64;
        if needed > self.capacity_bytes {
            return Err(ThreadlineError::cache(format!(
                "Capacity exceeded writing '{}': {} of {} bytes",
                key, needed, self.capacity_bytes
            )));
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        debug!("Cached key '{}' with TTL {}s", key, ttl.as_secs());
        Ok(())
    }

    async fn delete(&self, key: &str) -> ThreadlineResult<bool> {
        let now = Instant::now();
        let removed = self.entries.lock().remove(key);
        Ok(removed.is_some_and(|entry| !entry.is_expired(now)))
    }

    async fn keys(&self, pattern: &str) -> ThreadlineResult<Vec<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, now);

        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| glob::matches(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete_pattern(&self, pattern: &str) -> ThreadlineResult<u64> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, now);

        let before = entries.len();
        entries.retain(|key, _| !glob::matches(pattern, key));
        let deleted = (before - entries.len()) as u64;

        debug!("Deleted {} keys matching pattern '{}'", deleted, pattern);
        Ok(deleted)
    }

    async fn ttl(&self, key: &str) -> ThreadlineResult<i64> {
        let now = Instant::now();
        let entries = self.entries.lock();

        let ttl = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let remaining = entry.expires_at - now;
                // Redis rounds to the nearest second
                i64::try_from((remaining.as_millis() + 500) / 1000).unwrap_or(i64::MAX)
            }
            _ => TTL_MISSING,
        };
        Ok(ttl)
    }

    async fn memory_usage(&self) -> ThreadlineResult<MemoryUsage> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, now);
        Ok(MemoryUsage::new(Self::used_bytes(&entries), self.capacity_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new(1024);
        cache.set_raw("post:1", "{}", HOUR).await.unwrap();

        assert_eq!(cache.get_raw("post:1").await.unwrap().as_deref(), Some("{}"));
        assert!(cache.delete("post:1").await.unwrap());
        assert!(!cache.delete("post:1").await.unwrap());
        assert_eq!(cache.get_raw("post:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_reporting() {
        let cache = InMemoryCache::new(1024);
        cache.set_raw("posts", "[]", HOUR).await.unwrap();

        let ttl = cache.ttl("posts").await.unwrap();
        assert!(ttl > 3590 && ttl <= 3600, "unexpected ttl {}", ttl);
        assert_eq!(cache.ttl("absent").await.unwrap(), TTL_MISSING);
    }

    #[tokio::test]
    async fn test_pattern_operations() {
        let cache = InMemoryCache::new(1024);
        for key in ["post:1", "post:2", "posts", "comments:1"] {
            cache.set_raw(key, "x", HOUR).await.unwrap();
        }

        assert_eq!(cache.keys("post:*").await.unwrap(), vec!["post:1", "post:2"]);
        assert_eq!(cache.keys("post?").await.unwrap(), vec!["posts"]);
        assert_eq!(cache.delete_pattern("post*").await.unwrap(), 3);
        assert_eq!(cache.keys("*").await.unwrap(), vec!["comments:1"]);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let cache = InMemoryCache::new(20);
        cache.set_raw("k1", "0123456789", HOUR).await.unwrap();

        let err = cache.set_raw("k2", "0123456789", HOUR).await.unwrap_err();
        assert!(matches!(err, ThreadlineError::Cache(_)));

        // overwriting an entry only counts the difference
        cache.set_raw("k1", "abcdefghijklmnop", HOUR).await.unwrap();
        assert_eq!(cache.memory_usage().await.unwrap(), MemoryUsage::new(18, 20));
    }

    #[tokio::test]
    async fn test_memory_usage_counts_keys_and_values() {
        let cache = InMemoryCache::new(100);
        cache.set_raw("abc", "12345", HOUR).await.unwrap();
        cache.set_raw("de", "1", HOUR).await.unwrap();

        let usage = cache.memory_usage().await.unwrap();
        assert_eq!(usage, MemoryUsage::new(11, 100));
    }
}
