//! Comment entity.

use super::now;
use crate::{CommentId, Entity, PostId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content written over a comment when it is deleted.
pub const REDACTED_CONTENT: &str = "Comment deleted by user";

/// Maximum comment length in characters.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// A comment on a post, possibly replying to another comment.
///
/// `replies` is a derived view (children by parent id) filled in on read;
/// it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Surrogate identifier assigned by the store.
    pub id: CommentId,

    /// Owning post. Immutable after creation.
    pub post_id: PostId,

    /// Parent comment, `None` for top-level comments.
    pub parent_id: Option<CommentId>,

    /// Author name.
    pub author: String,

    /// Comment body, or [`REDACTED_CONTENT`] once deleted.
    pub content: String,

    /// Tombstone flag.
    pub is_deleted: bool,

    /// Direct replies, in store order.
    #[serde(default)]
    pub replies: Vec<Comment>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Checks if this comment replies directly to the post.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Replaces the content and refreshes `updated_at`.
    pub fn edit(&mut self, content: String) {
        self.content = content;
        self.updated_at = now();
    }

    /// Logically deletes the comment. Identity, parent, and replies are kept.
    pub fn tombstone(&mut self) {
        self.is_deleted = true;
        self.content = REDACTED_CONTENT.to_string();
        self.updated_at = now();
    }

    /// Returns a copy of the comment without its replies.
    #[must_use]
    pub fn without_replies(&self) -> Self {
        Self {
            replies: Vec::new(),
            ..self.clone()
        }
    }

    /// Counts this comment and every reply below it.
    #[must_use]
    pub fn subtree_size(&self) -> usize {
        1 + self.replies.iter().map(Self::subtree_size).sum::<usize>()
    }

    /// Depth of the deepest reply chain below this comment, counting itself.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.replies.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Visits the subtree depth-first, pre-order.
    pub fn preorder(&self) -> impl Iterator<Item = &Comment> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.replies.iter().rev());
            Some(node)
        })
    }
}

impl Entity<CommentId> for Comment {
    fn id(&self) -> &CommentId {
        &self.id
    }
}

/// A comment that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Post the comment belongs to.
    pub post_id: PostId,
    /// Comment being replied to; `None` for a top-level comment.
    pub parent_id: Option<CommentId>,
    /// Display name of the writer.
    pub author: String,
    /// Comment body.
    pub content: String,
    /// Creation time, also used as the initial `updated_at`.
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    /// Creates a new comment stamped with the current time.
    #[must_use]
    pub fn new(post_id: PostId, parent_id: Option<CommentId>, author: String, content: String) -> Self {
        Self {
            post_id,
            parent_id,
            author,
            content,
            created_at: now(),
        }
    }

    /// Materializes the stored comment once the store has assigned an id.
    #[must_use]
    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            post_id: self.post_id,
            parent_id: self.parent_id,
            author: self.author,
            content: self.content,
            is_deleted: false,
            replies: Vec::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, parent: Option<i64>) -> Comment {
        NewComment::new(PostId(1), parent.map(CommentId), "ann".to_string(), format!("c{}", id))
            .into_comment(CommentId(id))
    }

    fn sample_tree() -> Comment {
        // 1 -> (2 -> 4), 3
        let mut two = comment(2, Some(1));
        two.replies.push(comment(4, Some(2)));
        let mut root = comment(1, None);
        root.replies.push(two);
        root.replies.push(comment(3, Some(1)));
        root
    }

    #[test]
    fn test_tombstone_keeps_identity_and_replies() {
        let mut root = sample_tree();
        root.tombstone();
        assert!(root.is_deleted);
        assert_eq!(root.content, REDACTED_CONTENT);
        assert_eq!(root.id, CommentId(1));
        assert_eq!(root.replies.len(), 2);
    }

    #[test]
    fn test_preorder_traversal() {
        let root = sample_tree();
        let ids: Vec<i64> = root.preorder().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_size_and_depth() {
        let root = sample_tree();
        assert_eq!(root.subtree_size(), 4);
        assert_eq!(root.depth(), 3);
        assert_eq!(root.without_replies().subtree_size(), 1);
    }

    #[test]
    fn test_edit_refreshes_timestamp() {
        let mut c = comment(5, None);
        let before = c.updated_at;
        c.edit("changed".to_string());
        assert_eq!(c.content, "changed");
        assert!(c.updated_at >= before);
        assert!(c.is_top_level());
    }

    #[test]
    fn test_json_round_trip_keeps_tree() {
        let root = sample_tree();
        let json = serde_json::to_string(&root).unwrap();
        assert!(json.contains("\"parentId\":null"));
        assert!(json.contains("\"isDeleted\":false"));
        let back: Comment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }
}
