//! PostgreSQL post repository implementation.

use crate::{traits::PostRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use threadline_core::{NewPost, Post, PostId, ThreadlineError, ThreadlineResult};
use tracing::{debug, info};

/// PostgreSQL post repository implementation.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgPostRepository {
    /// Creates a new PostgreSQL post repository.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a post.
#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author: String,
    comments_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: PostId(row.id),
            title: row.title,
            content: row.content,
            author: row.author,
            comments_enabled: row.comments_enabled,
            comments: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: &NewPost) -> ThreadlineResult<Post> {
        debug!("Inserting post: {}", post.title);

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (title, content, author, comments_enabled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, title, content, author, comments_enabled, created_at, updated_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.author)
        .bind(post.comments_enabled)
        .bind(post.created_at)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(Post::from(row))
    }

    async fn find_by_id(&self, id: PostId) -> ThreadlineResult<Option<Post>> {
        debug!("Finding post by id: {}", id);

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, author, comments_enabled, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Post::from))
    }

    async fn find_all(&self) -> ThreadlineResult<Vec<Post>> {
        debug!("Finding all posts");

        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, author, comments_enabled, created_at, updated_at
            FROM posts
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn update(&self, post: &Post) -> ThreadlineResult<Post> {
        debug!("Updating post: {}", post.id);

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET title = $2, content = $3, author = $4, comments_enabled = $5, updated_at = $6
            WHERE id = $1
            RETURNING id, title, content, author, comments_enabled, created_at, updated_at
            "#,
        )
        .bind(post.id.into_inner())
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.author)
        .bind(post.comments_enabled)
        .bind(post.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| ThreadlineError::not_found("Post", post.id))?;

        Ok(Post::from(row))
    }

    async fn delete_cascade(&self, id: PostId) -> ThreadlineResult<bool> {
        debug!("Deleting post with comments: {}", id);

        let mut tx = self.pool.inner().begin().await?;

        let comments = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id.into_inner())
            .execute(&mut *tx)
            .await?;

        let posts = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.into_inner())
            .execute(&mut *tx)
            .await?;

        if posts.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        info!(
            post_id = %id,
            comments = comments.rows_affected(),
            "Post deleted with its comments"
        );
        Ok(true)
    }
}
