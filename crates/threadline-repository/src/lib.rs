//! # Threadline Repository
//!
//! Store of record for posts and comments.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn PostRepository> / Arc<dyn CommentRepository>
//! PgPostRepository / PgCommentRepository   (SQLx)
//!   ↓  Arc<dyn DatabasePoolInterface>
//! PostgreSQL
//! ```
//!
//! Comments are stored flat with a nullable `parent_id`; reply trees are
//! rebuilt by the service layer.

pub mod pool;
pub mod postgres;
pub mod traits;

pub use pool::*;
pub use postgres::*;
pub use traits::*;
