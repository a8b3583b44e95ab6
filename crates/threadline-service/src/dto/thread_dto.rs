//! Post and comment request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threadline_core::{CommentId, PostId};
use validator::Validate;

fn default_comments_enabled() -> bool {
    true
}

/// Request to create a post.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: String,

    #[validate(length(min = 1, message = "content cannot be empty"))]
    pub content: String,

    #[validate(length(min = 1, message = "author cannot be empty"))]
    pub author: String,

    #[serde(default = "default_comments_enabled")]
    pub comments_enabled: bool,

    /// Creation time; the current time when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request to replace a post's fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: String,

    #[validate(length(min = 1, message = "content cannot be empty"))]
    pub content: String,

    #[validate(length(min = 1, message = "author cannot be empty"))]
    pub author: String,

    pub comments_enabled: bool,
}

/// Request to comment on a post or reply to a comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: PostId,

    /// Comment being replied to; top-level when absent.
    #[serde(default)]
    pub parent_id: Option<CommentId>,

    #[validate(length(min = 1, message = "author cannot be empty"))]
    pub author: String,

    #[validate(length(min = 1, max = 2000, message = "content must be 1 to 2000 characters"))]
    pub content: String,
}

/// Request to edit a comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "content must be 1 to 2000 characters"))]
    pub content: String,
}
