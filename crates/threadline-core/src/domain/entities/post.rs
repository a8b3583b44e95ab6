//! Post entity.

use super::{now, Comment};
use crate::{Entity, PostId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discussion post, the root of a comment forest.
///
/// `comments` holds the top-level comments only. Deeper replies hang off
/// each comment's `replies` and are reconstructed on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Surrogate identifier assigned by the store.
    pub id: PostId,

    /// Post title.
    pub title: String,

    /// Post body.
    pub content: String,

    /// Author name.
    pub author: String,

    /// Whether new comments are accepted.
    pub comments_enabled: bool,

    /// Top-level comments, in store order.
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Applies new field values and refreshes `updated_at`.
    pub fn update(&mut self, title: String, content: String, author: String, comments_enabled: bool) {
        self.title = title;
        self.content = content;
        self.author = author;
        self.comments_enabled = comments_enabled;
        self.updated_at = now();
    }

    /// Returns a copy of the post without its comment tree.
    #[must_use]
    pub fn without_comments(&self) -> Self {
        Self {
            comments: Vec::new(),
            ..self.clone()
        }
    }

    /// Counts every comment in the post's tree.
    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.comments.iter().map(Comment::subtree_size).sum()
    }
}

impl Entity<PostId> for Post {
    fn id(&self) -> &PostId {
        &self.id
    }
}

/// A post that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Display name of the writer.
    pub author: String,
    /// Whether new comments may be added.
    pub comments_enabled: bool,
    /// Creation time, also used as the initial `updated_at`.
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    /// Creates a new post stamped with the current time.
    #[must_use]
    pub fn new(title: String, content: String, author: String, comments_enabled: bool) -> Self {
        Self {
            title,
            content,
            author,
            comments_enabled,
            created_at: now(),
        }
    }

    /// Overrides the creation timestamp.
    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Materializes the stored post once the store has assigned an id.
    #[must_use]
    pub fn into_post(self, id: PostId) -> Post {
        Post {
            id,
            title: self.title,
            content: self.content,
            author: self.author,
            comments_enabled: self.comments_enabled,
            comments: Vec::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
