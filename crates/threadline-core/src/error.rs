//! Unified error types for all layers of the application.

use crate::PostId;
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Threadline.
///
/// Store, validation, and tree errors are surfaced to callers. Cache errors
/// are produced by the cache backends but never escape the cache-aside
/// mirror or the memory guardian; they are logged and discarded there.
#[derive(Error, Debug)]
pub enum ThreadlineError {
    // ============ Domain Errors ============
    /// Resource not found in the store of record
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error (empty or oversized field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Comment creation attempted on a post with comments disabled
    #[error("Comments are disabled for post {post_id}")]
    CommentsDisabled { post_id: PostId },

    /// Conflict error (e.g., editing a tombstoned comment)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Reply tree violates the acyclic parent-chain invariant
    #[error("Corrupt reply tree: {0}")]
    CorruptTree(String),

    // ============ Infrastructure Errors ============
    /// Store of record error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Redis/Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ThreadlineError {
    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a cache error.
    #[must_use]
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::Cache(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for ThreadlineError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                // PostgreSQL unique violation
                if db_err.code().is_some_and(|code| code == "23505") {
                    return Self::Conflict(db_err.message().to_string());
                }
                Self::Database(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ThreadlineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Cache(format!("JSON serialization error: {}", err))
    }
}
