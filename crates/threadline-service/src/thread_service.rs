//! Thread service trait definition.

use crate::dto::{CreateCommentRequest, CreatePostRequest, UpdateCommentRequest, UpdatePostRequest};
use async_trait::async_trait;
use threadline_core::{Comment, CommentId, Post, PostId, ThreadlineResult};

/// Posts and their comment trees, read through the cache and written to the store.
#[async_trait]
pub trait ThreadService: Send + Sync {
    /// Creates a post.
    async fn create_post(&self, request: CreatePostRequest) -> ThreadlineResult<Post>;

    /// Replaces a post's fields.
    async fn update_post(&self, id: PostId, request: UpdatePostRequest) -> ThreadlineResult<Post>;

    /// Deletes a post together with all of its comments.
    async fn delete_post(&self, id: PostId) -> ThreadlineResult<()>;

    /// Lists every post with its full comment trees.
    async fn get_posts(&self) -> ThreadlineResult<Vec<Post>>;

    /// Gets a post with its full comment trees.
    async fn get_post(&self, id: PostId) -> ThreadlineResult<Post>;

    /// Comments on a post, or replies to a comment of that post.
    async fn create_comment(&self, request: CreateCommentRequest) -> ThreadlineResult<Comment>;

    /// Edits a comment's content.
    async fn update_comment(&self, id: CommentId, request: UpdateCommentRequest) -> ThreadlineResult<Comment>;

    /// Tombstones a comment. Its replies stay attached.
    async fn delete_comment(&self, id: CommentId) -> ThreadlineResult<Comment>;

    /// Gets a comment with its full reply subtree.
    async fn get_comment_tree(&self, id: CommentId) -> ThreadlineResult<Comment>;
}
