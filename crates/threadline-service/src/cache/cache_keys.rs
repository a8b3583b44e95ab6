//! Cache key generators for consistent key naming.

use threadline_core::PostId;

/// Key holding every post, each with top-level comments and one level of replies.
pub const POSTS: &str = "posts";

/// Generate a cache key for a single post, stored without its comments.
#[must_use]
pub fn post_by_id(id: PostId) -> String {
    format!("post:{}", id)
}

/// Generate a cache key for the top-level comments of a post.
#[must_use]
pub fn comments_by_post(id: PostId) -> String {
    format!("comments:{}", id)
}

/// Pattern matching every key the service writes.
#[must_use]
pub fn all_keys_pattern() -> String {
    "*".to_string()
}
