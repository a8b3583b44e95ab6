//! Configuration validation module.
//!
//! Checks every section at load time and reports all problems at once,
//! so a bad deployment fails on startup rather than on the first request.

use crate::{AppConfig, CacheBackend};
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Memory threshold must be in (0.0, 1.0].
    InvalidMemoryThreshold { value: f64 },
    /// Timeout or TTL value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Tree depth bound must be positive.
    InvalidTreeDepth { value: usize },
    /// In-memory cache capacity must be positive.
    InvalidCacheCapacity { value: u64 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPoolSize { min, max } => {
                write!(
                    f,
                    "Invalid pool size: min ({}) cannot be greater than max ({})",
                    min, max
                )
            }
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {} exceeds maximum allowed ({})", value, maximum)
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::InvalidMemoryThreshold { value } => {
                write!(
                    f,
                    "Invalid memory threshold: {} (must be greater than 0.0 and at most 1.0)",
                    value
                )
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::InvalidTreeDepth { value } => {
                write!(f, "Maximum tree depth must be positive, got {}", value)
            }
            Self::InvalidCacheCapacity { value } => {
                write!(f, "In-memory cache capacity must be positive, got {}", value)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: json, pretty)", value)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    #[must_use]
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    /// Valid log formats.
    const VALID_LOG_FORMATS: &'static [&'static str] = &["json", "pretty"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::new();

        Self::validate_database(&config.database, &mut result);
        if config.cache.backend == CacheBackend::Redis {
            Self::validate_redis(&config.redis, &mut result);
        }
        Self::validate_cache(&config.cache, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_database(config: &crate::DatabaseConfig, result: &mut ValidationResult) {
        if config.url.is_empty() {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !config.url.starts_with("postgres://") && !config.url.starts_with("postgresql://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with postgres:// or postgresql://".to_string(),
            });
        }

        if config.min_connections > config.max_connections {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: config.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        if config.connect_timeout_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "database.connect_timeout_secs".to_string(),
                value: 0,
            });
        }
        if config.idle_timeout_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "database.idle_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_redis(config: &crate::RedisConfig, result: &mut ValidationResult) {
        match Url::parse(&config.url) {
            Ok(url) if url.scheme() == "redis" || url.scheme() == "rediss" => {}
            Ok(_) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            }),
            Err(e) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: format!("Invalid URL format: {}", e),
            }),
        }

        if config.pool_size == 0 || config.pool_size > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: config.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }
    }

    fn validate_cache(config: &crate::CacheConfig, result: &mut ValidationResult) {
        if !(config.memory_threshold > 0.0 && config.memory_threshold <= 1.0) {
            result.add_error(ConfigValidationError::InvalidMemoryThreshold {
                value: config.memory_threshold,
            });
        }

        if config.ttl_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "cache.ttl_secs".to_string(),
                value: 0,
            });
        }

        if config.max_tree_depth == 0 {
            result.add_error(ConfigValidationError::InvalidTreeDepth {
                value: config.max_tree_depth,
            });
        }

        if config.backend == CacheBackend::Memory && config.memory_capacity_bytes == 0 {
            result.add_error(ConfigValidationError::InvalidCacheCapacity {
                value: config.memory_capacity_bytes,
            });
        }
    }

    fn validate_observability(config: &crate::ObservabilityConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        let format = config.log_format.to_lowercase();
        if !Self::VALID_LOG_FORMATS.contains(&format.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
#[must_use]
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}
