//! Repository trait definitions.
//!
//! Sibling lists are always returned in ascending id order, which is the
//! order comments were inserted.

use async_trait::async_trait;
use threadline_core::{Comment, CommentId, NewComment, NewPost, Post, PostId, ThreadlineResult};

/// Post repository trait.
///
/// Posts come back without their `comments`; trees are assembled above the store.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts a post and returns it with its assigned id.
    async fn create(&self, post: &NewPost) -> ThreadlineResult<Post>;

    /// Finds a post by ID.
    async fn find_by_id(&self, id: PostId) -> ThreadlineResult<Option<Post>>;

    /// Returns every post, ordered by id.
    async fn find_all(&self) -> ThreadlineResult<Vec<Post>>;

    /// Saves the mutable fields of an existing post.
    ///
    /// Fails with `NotFound` if the post does not exist.
    async fn update(&self, post: &Post) -> ThreadlineResult<Post>;

    /// Deletes every comment of the post, then the post, in one transaction.
    ///
    /// Returns `false` if the post did not exist; nothing is changed in that case.
    async fn delete_cascade(&self, id: PostId) -> ThreadlineResult<bool>;
}

/// Comment repository trait.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Inserts a comment and returns it with its assigned id.
    async fn create(&self, comment: &NewComment) -> ThreadlineResult<Comment>;

    /// Finds a comment by ID, tombstoned or not.
    async fn find_by_id(&self, id: CommentId) -> ThreadlineResult<Option<Comment>>;

    /// Returns the top-level comments of a post.
    async fn find_top_level(&self, post_id: PostId) -> ThreadlineResult<Vec<Comment>>;

    /// Returns the direct replies to a comment.
    async fn find_replies(&self, parent_id: CommentId) -> ThreadlineResult<Vec<Comment>>;

    /// Saves content, tombstone flag and `updated_at` of an existing comment.
    ///
    /// Fails with `NotFound` if the comment does not exist.
    async fn update(&self, comment: &Comment) -> ThreadlineResult<Comment>;
}
