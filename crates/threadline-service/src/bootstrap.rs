//! Process wiring: tracing, cache backend and service construction.

use crate::cache::{CacheInterface, InMemoryCache, RedisCacheService};
use crate::r#impl::ThreadServiceImpl;
use std::sync::Arc;
use threadline_config::{AppConfig, CacheBackend, CacheConfig, ObservabilityConfig, RedisConfig};
use threadline_core::{ThreadlineError, ThreadlineResult};
use threadline_repository::{create_pool, PgCommentRepository, PgPostRepository};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a
/// subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> ThreadlineResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ThreadlineError::Configuration(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    result.map_err(|e| ThreadlineError::internal(format!("Failed to install tracing subscriber: {}", e)))
}

/// Builds the configured cache store.
pub fn build_cache(cache: &CacheConfig, redis: &RedisConfig) -> ThreadlineResult<Arc<dyn CacheInterface>> {
    let store: Arc<dyn CacheInterface> = match cache.backend {
        CacheBackend::Redis => Arc::new(RedisCacheService::connect(redis)?),
        CacheBackend::Memory => Arc::new(InMemoryCache::new(cache.memory_capacity_bytes)),
        CacheBackend::Disabled => Arc::new(RedisCacheService::disabled()),
    };
    info!(backend = %cache.backend, ttl_secs = cache.ttl_secs, "Cache initialized");
    Ok(store)
}

/// Connects to the database, runs migrations if enabled, and assembles the
/// thread service over the configured cache.
pub async fn build_thread_service(config: &AppConfig) -> ThreadlineResult<ThreadServiceImpl> {
    let pool = create_pool(&config.database).await?;
    let posts = Arc::new(PgPostRepository::new(pool.clone()));
    let comments = Arc::new(PgCommentRepository::new(pool));
    let cache = build_cache(&config.cache, &config.redis)?;

    let service = ThreadServiceImpl::with_cache_config(posts, comments, cache, &config.cache);
    info!(
        environment = %config.app.environment,
        refresh_policy = ?config.cache.refresh_policy,
        "Thread service ready"
    );
    Ok(service)
}
