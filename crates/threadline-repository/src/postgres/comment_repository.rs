//! PostgreSQL comment repository implementation.

use crate::{traits::CommentRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use threadline_core::{Comment, CommentId, NewComment, PostId, ThreadlineError, ThreadlineResult};
use tracing::debug;

/// PostgreSQL comment repository implementation.
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgCommentRepository {
    /// Creates a new PostgreSQL comment repository.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a comment.
#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    parent_id: Option<i64>,
    author: String,
    content: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId(row.id),
            post_id: PostId(row.post_id),
            parent_id: row.parent_id.map(CommentId),
            author: row.author,
            content: row.content,
            is_deleted: row.is_deleted,
            replies: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COMMENT_COLUMNS: &str = "id, post_id, parent_id, author, content, is_deleted, created_at, updated_at";

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, comment: &NewComment) -> ThreadlineResult<Comment> {
        debug!("Inserting comment on post: {}", comment.post_id);

        let sql = format!(
            "INSERT INTO comments (post_id, parent_id, author, content, is_deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, FALSE, $5, $5) RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment.post_id.into_inner())
            .bind(comment.parent_id.map(CommentId::into_inner))
            .bind(&comment.author)
            .bind(&comment.content)
            .bind(comment.created_at)
            .fetch_one(self.pool.inner())
            .await?;

        Ok(Comment::from(row))
    }

    async fn find_by_id(&self, id: CommentId) -> ThreadlineResult<Option<Comment>> {
        debug!("Finding comment by id: {}", id);

        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(Comment::from))
    }

    async fn find_top_level(&self, post_id: PostId) -> ThreadlineResult<Vec<Comment>> {
        debug!("Finding top-level comments of post: {}", post_id);

        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 AND parent_id IS NULL ORDER BY id"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id.into_inner())
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn find_replies(&self, parent_id: CommentId) -> ThreadlineResult<Vec<Comment>> {
        debug!("Finding replies to comment: {}", parent_id);

        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE parent_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(parent_id.into_inner())
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn update(&self, comment: &Comment) -> ThreadlineResult<Comment> {
        debug!("Updating comment: {}", comment.id);

        let sql = format!(
            "UPDATE comments SET content = $2, is_deleted = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment.id.into_inner())
            .bind(&comment.content)
            .bind(comment.is_deleted)
            .bind(comment.updated_at)
            .fetch_optional(self.pool.inner())
            .await?
            .ok_or_else(|| ThreadlineError::not_found("Comment", comment.id))?;

        Ok(Comment::from(row))
    }
}
