//! Reply tree materialization.

use std::collections::HashSet;
use std::sync::Arc;
use threadline_core::{Comment, ThreadlineError, ThreadlineResult};
use threadline_repository::CommentRepository;
use tracing::{debug, error};

/// Where a node's direct children come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Children {
    /// Already attached as `replies`, one level deep (from a cache entry).
    Preloaded,
    /// Fetched from the store by parent id.
    Store,
}

/// Work item of the traversal: arena slot, depth, and child source.
type Pending = (usize, usize, Children);

/// Rebuilds full reply subtrees from flat comment rows.
///
/// Traversal is depth-first, pre-order, with siblings in store order, and
/// runs on an explicit stack so reply depth does not grow the call stack.
/// Every node is visited at most once and no chain may be deeper than
/// `max_depth`; either violation aborts with [`ThreadlineError::CorruptTree`].
/// Any error aborts the whole materialization.
#[derive(Clone)]
pub struct TreeAssembler {
    comments: Arc<dyn CommentRepository>,
    max_depth: usize,
}

impl TreeAssembler {
    /// Creates an assembler reading replies from `comments`.
    #[must_use]
    pub fn new(comments: Arc<dyn CommentRepository>, max_depth: usize) -> Self {
        Self { comments, max_depth }
    }

    /// Returns the depth bound.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Completes the trees of a post's top-level comments.
    ///
    /// Each comment's `replies` must hold its direct children as loaded with
    /// it; deeper levels are fetched from the store.
    pub async fn assemble_forest(&self, top_level: Vec<Comment>) -> ThreadlineResult<Vec<Comment>> {
        self.expand(top_level, Children::Preloaded).await
    }

    /// Materializes the full subtree below `root`, reading every level from the store.
    pub async fn assemble(&self, root: Comment) -> ThreadlineResult<Comment> {
        let mut trees = self.expand(vec![root], Children::Store).await?;
        trees
            .pop()
            .ok_or_else(|| ThreadlineError::internal("reply tree assembled without a root"))
    }

    /// Resolves every node below `roots` into a flat arena, then links
    /// replies bottom-up. A child always lands in a later slot than its parent.
    async fn expand(&self, roots: Vec<Comment>, source: Children) -> ThreadlineResult<Vec<Comment>> {
        let root_count = roots.len();
        let mut arena: Vec<Option<Comment>> = roots.into_iter().map(Some).collect();
        let mut links: Vec<Vec<usize>> = vec![Vec::new(); root_count];
        let mut visited = HashSet::new();
        let mut stack: Vec<Pending> = (0..root_count).rev().map(|slot| (slot, 1, source)).collect();

        while let Some((slot, depth, source)) = stack.pop() {
            let Some(node) = arena[slot].as_mut() else {
                return Err(ThreadlineError::internal("reply tree slot emptied during traversal"));
            };
            let (node_id, post_id) = (node.id, node.post_id);

            if depth > self.max_depth {
                error!(comment_id = %node_id, max_depth = self.max_depth, "Reply chain exceeds depth bound");
                return Err(ThreadlineError::CorruptTree(format!(
                    "reply chain through comment {} is deeper than {}",
                    node_id, self.max_depth
                )));
            }
            if !visited.insert(node_id) {
                error!(comment_id = %node_id, "Comment reached twice while assembling replies");
                return Err(ThreadlineError::CorruptTree(format!(
                    "comment {} is its own ancestor",
                    node_id
                )));
            }

            let children = match source {
                Children::Preloaded => std::mem::take(&mut node.replies),
                Children::Store => {
                    node.replies.clear();
                    self.comments.find_replies(node_id).await.map_err(|e| {
                        error!(comment_id = %node_id, error = %e, "Failed to load replies");
                        e
                    })?
                }
            };
            debug!(comment_id = %node_id, replies = children.len(), depth, "Resolved replies");

            let first_child = arena.len();
            for child in children {
                if child.parent_id != Some(node_id) || child.post_id != post_id {
                    return Err(ThreadlineError::CorruptTree(format!(
                        "comment {} listed under comment {} it does not reply to",
                        child.id, node_id
                    )));
                }
                arena.push(Some(child));
                links.push(Vec::new());
            }
            let child_slots: Vec<usize> = (first_child..arena.len()).collect();
            stack.extend(child_slots.iter().rev().map(|&child| (child, depth + 1, Children::Store)));
            links[slot] = child_slots;
        }

        for slot in (0..arena.len()).rev() {
            let replies: Vec<Comment> = links[slot]
                .iter()
                .filter_map(|&child| arena[child].take())
                .collect();
            if let Some(node) = arena[slot].as_mut() {
                node.replies = replies;
            }
        }

        Ok(arena.into_iter().take(root_count).flatten().collect())
    }
}

impl std::fmt::Debug for TreeAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeAssembler")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryStore;
    use threadline_core::{CommentId, PostId};

    fn chain(store: &InMemoryStore, post_id: PostId, length: usize) -> Vec<CommentId> {
        let mut ids = Vec::new();
        let mut parent = None;
        for i in 0..length {
            let id = store.seed_comment(post_id, parent, &format!("level {}", i + 1));
            ids.push(id);
            parent = Some(id);
        }
        ids
    }

    fn ids_along_first_branch(root: &Comment) -> Vec<CommentId> {
        let mut ids = vec![root.id];
        let mut node = root;
        while let Some(child) = node.replies.first() {
            ids.push(child.id);
            node = child;
        }
        ids
    }

    #[tokio::test]
    async fn test_assemble_from_store() {
        let store = Arc::new(InMemoryStore::new());
        let post = store.seed_post(true);
        let root = store.seed_comment(post, None, "root");
        let a = store.seed_comment(post, Some(root), "a");
        let b = store.seed_comment(post, Some(root), "b");
        let a1 = store.seed_comment(post, Some(a), "a1");

        let assembler = TreeAssembler::new(store.clone(), 16);
        let tree = assembler.assemble(store.comment(root)).await.unwrap();

        let order: Vec<CommentId> = tree.preorder().map(|c| c.id).collect();
        assert_eq!(order, vec![root, a, a1, b]);
    }

    #[tokio::test]
    async fn test_preloaded_level_is_not_refetched() {
        let store = Arc::new(InMemoryStore::new());
        let post = store.seed_post(true);
        let root = store.seed_comment(post, None, "root");
        let child = store.seed_comment(post, Some(root), "child");
        let grandchild = store.seed_comment(post, Some(child), "grandchild");

        let mut top = store.comment(root);
        top.replies = vec![store.comment(child)];
        store.reset_query_count();

        let assembler = TreeAssembler::new(store.clone(), 16);
        let forest = assembler.assemble_forest(vec![top]).await.unwrap();

        // only the child's and grandchild's replies were queried
        assert_eq!(store.query_count(), 2);
        assert_eq!(ids_along_first_branch(&forest[0]), vec![root, child, grandchild]);
    }

    #[tokio::test]
    async fn test_depth_guard() {
        let store = Arc::new(InMemoryStore::new());
        let post = store.seed_post(true);
        let ids = chain(&store, post, 6);

        let ok = TreeAssembler::new(store.clone(), 6)
            .assemble(store.comment(ids[0]))
            .await
            .unwrap();
        assert_eq!(ok.depth(), 6);

        let err = TreeAssembler::new(store.clone(), 5)
            .assemble(store.comment(ids[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ThreadlineError::CorruptTree(_)));
    }

    #[tokio::test]
    async fn test_chain_at_default_bound() {
        let store = Arc::new(InMemoryStore::new());
        let post = store.seed_post(true);
        let ids = chain(&store, post, 1024);
        let assembler = TreeAssembler::new(store.clone(), 1024);

        let tree = assembler.assemble(store.comment(ids[0])).await.unwrap();

        assert_eq!(tree.subtree_size(), 1024);
        assert_eq!(ids_along_first_branch(&tree), ids);
    }

    #[tokio::test]
    async fn test_chain_past_default_bound_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let post = store.seed_post(true);
        let ids = chain(&store, post, 1025);

        let err = TreeAssembler::new(store.clone(), 1024)
            .assemble(store.comment(ids[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ThreadlineError::CorruptTree(_)));
    }

    #[tokio::test]
    async fn test_forest_keeps_sibling_order() {
        let store = Arc::new(InMemoryStore::new());
        let post = store.seed_post(true);
        let first = store.seed_comment(post, None, "first");
        let second = store.seed_comment(post, None, "second");
        let first_reply = store.seed_comment(post, Some(first), "first reply");
        let second_reply = store.seed_comment(post, Some(second), "second reply");

        let grandchild = store.seed_comment(post, Some(first_reply), "grandchild");

        let mut top = vec![store.comment(first), store.comment(second)];
        top[0].replies = vec![store.comment(first_reply)];
        top[1].replies = vec![store.comment(second_reply)];
        let forest = TreeAssembler::new(store.clone(), 16)
            .assemble_forest(top)
            .await
            .unwrap();

        let order: Vec<CommentId> = forest.iter().flat_map(Comment::preorder).map(|c| c.id).collect();
        assert_eq!(order, vec![first, first_reply, grandchild, second, second_reply]);
    }

    #[tokio::test]
    async fn test_cycle_is_detected() {
        let store = Arc::new(InMemoryStore::new());
        let post = store.seed_post(true);
        let a = store.seed_comment(post, None, "a");
        let b = store.seed_comment(post, Some(a), "b");
        // corrupt the rows: a now replies to b
        store.reparent(a, Some(b));

        let err = TreeAssembler::new(store.clone(), 1024)
            .assemble(store.comment(a))
            .await
            .unwrap_err();
        assert!(matches!(err, ThreadlineError::CorruptTree(_)));
    }

    #[tokio::test]
    async fn test_store_error_aborts() {
        let store = Arc::new(InMemoryStore::new());
        let post = store.seed_post(true);
        let root = store.seed_comment(post, None, "root");
        store.seed_comment(post, Some(root), "child");
        store.fail_reads(true);

        let err = TreeAssembler::new(store.clone(), 16)
            .assemble(store.comment(root))
            .await
            .unwrap_err();
        assert!(matches!(err, ThreadlineError::Database(_)));
    }
}
