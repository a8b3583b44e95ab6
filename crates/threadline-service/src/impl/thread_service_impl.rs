//! Thread service implementation.

use crate::cache::{cache_keys, CacheInterface, CacheMirror, ExpiredKeyReaper};
use crate::dto::{CreateCommentRequest, CreatePostRequest, UpdateCommentRequest, UpdatePostRequest};
use crate::thread_service::ThreadService;
use crate::tree::TreeAssembler;
use async_trait::async_trait;
use std::sync::Arc;
use threadline_config::{CacheConfig, RefreshPolicy};
use threadline_core::{
    Comment, CommentId, NewComment, NewPost, Post, PostId, ThreadlineError, ThreadlineResult,
    ValidateExt,
};
use threadline_repository::{CommentRepository, PostRepository};
use tracing::{debug, error, info, warn};

/// Cache-aside thread service over the store of record.
///
/// Reads check the cache first and fall back to the store, writing what they
/// loaded back. Writes go to the store and then invalidate the cached read
/// models they touch; with [`RefreshPolicy::Eager`] those are recomputed
/// from the store right away.
pub struct ThreadServiceImpl {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    mirror: CacheMirror,
    tree: TreeAssembler,
    refresh: RefreshPolicy,
}

impl ThreadServiceImpl {
    /// Creates a new thread service.
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        mirror: CacheMirror,
        refresh: RefreshPolicy,
        max_tree_depth: usize,
    ) -> Self {
        let tree = TreeAssembler::new(comments.clone(), max_tree_depth);
        Self {
            posts,
            comments,
            mirror,
            tree,
            refresh,
        }
    }

    /// Creates a thread service whose cache behavior follows `config`.
    pub fn with_cache_config(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        cache: Arc<dyn CacheInterface>,
        config: &CacheConfig,
    ) -> Self {
        let eviction = Arc::new(ExpiredKeyReaper::new(config.memory_threshold));
        let mirror = CacheMirror::new(cache, eviction, config.ttl());
        Self::new(posts, comments, mirror, config.refresh_policy, config.max_tree_depth)
    }

    /// Returns the refresh policy applied on the write path.
    #[must_use]
    pub const fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh
    }

    async fn find_post(&self, id: PostId) -> ThreadlineResult<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ThreadlineError::not_found("Post", id))
    }

    async fn find_comment(&self, id: CommentId) -> ThreadlineResult<Comment> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| ThreadlineError::not_found("Comment", id))
    }

    /// Top-level comments of a post, each with its direct replies.
    async fn load_comment_level(&self, post_id: PostId) -> ThreadlineResult<Vec<Comment>> {
        let mut top_level = self.comments.find_top_level(post_id).await?;
        for comment in &mut top_level {
            comment.replies = self.comments.find_replies(comment.id).await?;
        }
        debug!(post_id = %post_id, top_level = top_level.len(), "Loaded comment level");
        Ok(top_level)
    }

    /// Every post, each with its comment level.
    async fn load_posts(&self) -> ThreadlineResult<Vec<Post>> {
        let mut posts = self.posts.find_all().await?;
        for post in &mut posts {
            post.comments = self.load_comment_level(post.id).await?;
        }
        debug!(count = posts.len(), "Loaded posts");
        Ok(posts)
    }

    /// Comment level of a post, from `comments:<id>` or else from the store.
    async fn comment_level(&self, post_id: PostId) -> ThreadlineResult<Vec<Comment>> {
        let key = cache_keys::comments_by_post(post_id);
        if let Some(level) = self.mirror.get::<Vec<Comment>>(&key).await {
            return Ok(level);
        }

        let level = self.load_comment_level(post_id).await?;
        self.mirror.set(&key, &level).await;
        Ok(level)
    }

    /// Expands a post's comment level into full reply trees.
    async fn materialize(&self, mut post: Post) -> ThreadlineResult<Post> {
        let level = std::mem::take(&mut post.comments);
        post.comments = self.tree.assemble_forest(level).await?;
        Ok(post)
    }

    /// Drops the cached views of a written post and, when eager, recomputes them.
    async fn refresh_after_post_write(&self, post: &Post) -> ThreadlineResult<()> {
        self.mirror.invalidate(cache_keys::POSTS).await;
        self.mirror.invalidate(&cache_keys::post_by_id(post.id)).await;

        if self.refresh == RefreshPolicy::Eager {
            self.repopulate_posts().await?;
            self.mirror
                .set(&cache_keys::post_by_id(post.id), &post.without_comments())
                .await;
        }
        Ok(())
    }

    async fn refresh_after_post_delete(&self, id: PostId) -> ThreadlineResult<()> {
        self.mirror.invalidate(cache_keys::POSTS).await;
        self.mirror.invalidate(&cache_keys::post_by_id(id)).await;
        self.mirror.invalidate(&cache_keys::comments_by_post(id)).await;

        if self.refresh == RefreshPolicy::Eager {
            self.repopulate_posts().await?;
        }
        Ok(())
    }

    async fn repopulate_posts(&self) -> ThreadlineResult<()> {
        let posts = self.load_posts().await.map_err(|e| {
            error!(error = %e, "Failed to reload posts after write");
            e
        })?;
        self.mirror.set(cache_keys::POSTS, &posts).await;
        Ok(())
    }

    /// Drops the cached comment level of a post and, when eager, recomputes it.
    async fn refresh_after_comment_write(&self, post_id: PostId) -> ThreadlineResult<()> {
        let key = cache_keys::comments_by_post(post_id);
        self.mirror.invalidate(&key).await;

        if self.refresh == RefreshPolicy::Eager {
            let level = self.load_comment_level(post_id).await.map_err(|e| {
                error!(post_id = %post_id, error = %e, "Failed to reload comments after write");
                e
            })?;
            self.mirror.set(&key, &level).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ThreadService for ThreadServiceImpl {
    async fn create_post(&self, request: CreatePostRequest) -> ThreadlineResult<Post> {
        debug!("Creating post: {}", request.title);

        request.validate_request()?;

        let post = self.posts.create(&NewPost::from(request)).await?;
        info!(post_id = %post.id, "Post created");

        self.refresh_after_post_write(&post).await?;
        Ok(post)
    }

    async fn update_post(&self, id: PostId, request: UpdatePostRequest) -> ThreadlineResult<Post> {
        debug!(post_id = %id, "Updating post");

        request.validate_request()?;

        let mut post = self.find_post(id).await?;
        post.update(
            request.title,
            request.content,
            request.author,
            request.comments_enabled,
        );

        let updated = self.posts.update(&post).await?;
        info!(post_id = %id, "Post updated");

        self.refresh_after_post_write(&updated).await?;
        Ok(updated)
    }

    async fn delete_post(&self, id: PostId) -> ThreadlineResult<()> {
        debug!(post_id = %id, "Deleting post");

        if !self.posts.delete_cascade(id).await? {
            return Err(ThreadlineError::not_found("Post", id));
        }
        info!(post_id = %id, "Post deleted with its comments");

        self.refresh_after_post_delete(id).await
    }

    async fn get_posts(&self) -> ThreadlineResult<Vec<Post>> {
        let cached = self.mirror.get::<Vec<Post>>(cache_keys::POSTS).await;

        let posts = match cached {
            Some(mut posts) => {
                // comment writes refresh only comments:<id>
                for post in &mut posts {
                    post.comments = self.comment_level(post.id).await?;
                }
                posts
            }
            None => {
                let posts = self.load_posts().await?;
                self.mirror.set(cache_keys::POSTS, &posts).await;
                for post in &posts {
                    self.mirror
                        .set(&cache_keys::comments_by_post(post.id), &post.comments)
                        .await;
                }
                posts
            }
        };

        let mut materialized = Vec::with_capacity(posts.len());
        for post in posts {
            materialized.push(self.materialize(post).await?);
        }
        Ok(materialized)
    }

    async fn get_post(&self, id: PostId) -> ThreadlineResult<Post> {
        let key = cache_keys::post_by_id(id);

        let mut post = match self.mirror.get::<Post>(&key).await {
            Some(post) => post,
            None => {
                let post = self.find_post(id).await?;
                self.mirror.set(&key, &post.without_comments()).await;
                post
            }
        };

        post.comments = self.comment_level(id).await?;
        self.materialize(post).await
    }

    async fn create_comment(&self, request: CreateCommentRequest) -> ThreadlineResult<Comment> {
        debug!(post_id = %request.post_id, "Creating comment");

        request.validate_request()?;

        let post = self.find_post(request.post_id).await?;
        if !post.comments_enabled {
            warn!(post_id = %post.id, "Comment rejected, comments are disabled");
            return Err(ThreadlineError::CommentsDisabled { post_id: post.id });
        }

        if let Some(parent_id) = request.parent_id {
            let parent = self.find_comment(parent_id).await?;
            if parent.post_id != post.id {
                return Err(ThreadlineError::validation(format!(
                    "comment {} does not belong to post {}",
                    parent_id, post.id
                )));
            }
        }

        let comment = self.comments.create(&NewComment::from(request)).await?;
        info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment created");

        self.refresh_after_comment_write(comment.post_id).await?;
        Ok(comment)
    }

    async fn update_comment(&self, id: CommentId, request: UpdateCommentRequest) -> ThreadlineResult<Comment> {
        debug!(comment_id = %id, "Updating comment");

        request.validate_request()?;

        let mut comment = self.find_comment(id).await?;
        if comment.is_deleted {
            return Err(ThreadlineError::conflict(format!(
                "comment {} has been deleted",
                id
            )));
        }
        comment.edit(request.content);

        let updated = self.comments.update(&comment).await?;
        info!(comment_id = %id, "Comment updated");

        self.refresh_after_comment_write(updated.post_id).await?;
        Ok(updated)
    }

    async fn delete_comment(&self, id: CommentId) -> ThreadlineResult<Comment> {
        debug!(comment_id = %id, "Deleting comment");

        let mut comment = self.find_comment(id).await?;
        comment.tombstone();

        let deleted = self.comments.update(&comment).await?;
        info!(comment_id = %id, "Comment tombstoned");

        self.refresh_after_comment_write(deleted.post_id).await?;
        Ok(deleted)
    }

    async fn get_comment_tree(&self, id: CommentId) -> ThreadlineResult<Comment> {
        debug!(comment_id = %id, "Getting comment tree");

        let root = self.find_comment(id).await?;
        self.tree.assemble(root).await
    }
}

impl std::fmt::Debug for ThreadServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadServiceImpl")
            .field("mirror", &self.mirror)
            .field("tree", &self.tree)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}
