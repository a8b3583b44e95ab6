//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use std::sync::Arc;
use threadline_core::ThreadlineError;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "THREADLINE";

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `THREADLINE_` prefix, `__` as the section separator
    ///    (e.g. `THREADLINE_CACHE__REFRESH_POLICY=lazy`)
    pub fn new(config_dir: impl Into<String>) -> Result<Self, ThreadlineError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, ThreadlineError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    ///
    /// The previous configuration stays in effect if the new one fails validation.
    pub async fn reload(&self) -> Result<(), ThreadlineError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    fn load_config(config_dir: &str) -> Result<AppConfig, ThreadlineError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var(format!("{}_ENVIRONMENT", ENV_PREFIX)).unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_threadline_error)?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_threadline_error)?;
        app_config.app.environment = environment;

        ConfigValidator::validate(&app_config)
            .map_err(|errors| ThreadlineError::Configuration(format_validation_errors(&errors)))?;

        Ok(app_config)
    }
}

fn config_error_to_threadline_error(err: ConfigError) -> ThreadlineError {
    ThreadlineError::Configuration(err.to_string())
}
