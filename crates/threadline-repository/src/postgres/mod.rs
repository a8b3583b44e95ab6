//! PostgreSQL repository implementations.

mod comment_repository;
mod post_repository;

pub use comment_repository::PgCommentRepository;
pub use post_repository::PgPostRepository;
