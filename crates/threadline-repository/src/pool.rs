//! Database connection pool management.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use threadline_config::DatabaseConfig;
use threadline_core::{ThreadlineError, ThreadlineResult};
use tracing::{info, warn};

/// Interface for database pool operations.
///
/// Repositories hold an `Arc<dyn DatabasePoolInterface>` so tests and
/// alternative wiring can hand them any pool owner.
#[async_trait]
pub trait DatabasePoolInterface: Send + Sync {
    /// Returns a reference to the underlying PostgreSQL pool.
    fn inner(&self) -> &PgPool;

    /// Checks if the database connection is healthy.
    async fn health_check(&self) -> ThreadlineResult<()>;

    /// Runs database migrations.
    async fn run_migrations(&self) -> ThreadlineResult<()>;

    /// Closes the database pool.
    async fn close(&self);
}

/// Database pool wrapper.
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Creates a new database pool from configuration.
    pub async fn new(config: &DatabaseConfig) -> ThreadlineResult<Self> {
        info!("Connecting to PostgreSQL database...");

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .connect(&config.url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                ThreadlineError::Database(format!("Failed to connect: {}", e))
            })?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Wraps a pre-existing pool.
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabasePoolInterface for DatabasePool {
    fn inner(&self) -> &PgPool {
        &self.pool
    }

    async fn health_check(&self) -> ThreadlineResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ThreadlineError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    async fn run_migrations(&self) -> ThreadlineResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ThreadlineError::Database(format!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

impl std::ops::Deref for DatabasePool {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

/// Creates a shared database pool, running migrations when configured to.
pub async fn create_pool(config: &DatabaseConfig) -> ThreadlineResult<std::sync::Arc<DatabasePool>> {
    let pool = DatabasePool::new(config).await?;
    if config.run_migrations {
        pool.run_migrations().await?;
    }
    Ok(std::sync::Arc::new(pool))
}
