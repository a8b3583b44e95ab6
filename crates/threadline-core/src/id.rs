//! Typed ID wrappers for domain entities.
//!
//! Ids are surrogate keys assigned by the store of record.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A strongly-typed wrapper for post IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl PostId {
    /// Returns the inner value.
    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PostId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A strongly-typed wrapper for comment IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl CommentId {
    /// Returns the inner value.
    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CommentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
