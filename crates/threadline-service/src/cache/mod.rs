//! Caching infrastructure for the service layer.
//!
//! The store of record is always authoritative. Cached values are JSON
//! snapshots of read models, written with a fixed TTL and dropped or
//! recomputed by the write paths.

mod cache_interface;
pub mod cache_keys;
pub(crate) mod glob;
mod guardian;
mod memory_cache;
mod mirror;
mod redis_cache;

pub use cache_interface::{CacheExt, CacheInterface, MemoryUsage, TTL_MISSING, TTL_PERSISTENT};
pub use guardian::{EvictionPolicy, ExpiredKeyReaper};
pub use memory_cache::InMemoryCache;
pub use mirror::CacheMirror;
pub use redis_cache::{parse_memory_info, RedisCacheService};
