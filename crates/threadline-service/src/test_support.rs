//! In-memory fakes for service tests.

use crate::cache::{glob, CacheInterface, MemoryUsage, TTL_MISSING};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use threadline_core::{
    Comment, CommentId, NewComment, NewPost, Post, PostId, ThreadlineError, ThreadlineResult,
};
use threadline_repository::{CommentRepository, PostRepository};

// =============================================================================
// Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    next_post: i64,
    next_comment: i64,
}

/// Store of record backed by ordered maps, with read/write fault injection
/// and counters.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    queries: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().comments.len()
    }

    /// Inserts a post directly, bypassing counters and faults.
    pub fn seed_post(&self, comments_enabled: bool) -> PostId {
        let mut state = self.state.lock();
        state.next_post += 1;
        let id = PostId(state.next_post);
        let post = NewPost::new(
            format!("Post {}", id),
            "Body".to_string(),
            "ann".to_string(),
            comments_enabled,
        )
        .into_post(id);
        state.posts.insert(id, post);
        id
    }

    /// Inserts a comment directly, bypassing counters, faults and checks.
    pub fn seed_comment(&self, post_id: PostId, parent_id: Option<CommentId>, content: &str) -> CommentId {
        let mut state = self.state.lock();
        state.next_comment += 1;
        let id = CommentId(state.next_comment);
        let comment = NewComment::new(post_id, parent_id, "bob".to_string(), content.to_string())
            .into_comment(id);
        state.comments.insert(id, comment);
        id
    }

    /// Rewrites a comment's parent without any checks.
    pub fn reparent(&self, id: CommentId, parent_id: Option<CommentId>) {
        if let Some(comment) = self.state.lock().comments.get_mut(&id) {
            comment.parent_id = parent_id;
        }
    }

    /// Moves a comment's timestamps into the past.
    pub fn backdate_comment(&self, id: CommentId, at: DateTime<Utc>) {
        if let Some(comment) = self.state.lock().comments.get_mut(&id) {
            comment.created_at = at;
            comment.updated_at = at;
        }
    }

    /// Returns a stored comment. Panics if it does not exist.
    pub fn comment(&self, id: CommentId) -> Comment {
        self.state.lock().comments[&id].clone()
    }

    /// Returns a stored post, if any.
    pub fn post(&self, id: PostId) -> Option<Post> {
        self.state.lock().posts.get(&id).cloned()
    }

    /// Every comment of a post, as a reference for reply-tree checks.
    pub fn comments_of(&self, post_id: PostId) -> Vec<Comment> {
        self.state
            .lock()
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect()
    }

    fn read(&self) -> ThreadlineResult<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ThreadlineError::Database("injected read failure".to_string()));
        }
        Ok(())
    }

    fn write(&self) -> ThreadlineResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ThreadlineError::Database("injected write failure".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: &NewPost) -> ThreadlineResult<Post> {
        self.write()?;
        let mut state = self.state.lock();
        state.next_post += 1;
        let saved = post.clone().into_post(PostId(state.next_post));
        state.posts.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: PostId) -> ThreadlineResult<Option<Post>> {
        self.read()?;
        Ok(self.state.lock().posts.get(&id).cloned())
    }

    async fn find_all(&self) -> ThreadlineResult<Vec<Post>> {
        self.read()?;
        Ok(self.state.lock().posts.values().cloned().collect())
    }

    async fn update(&self, post: &Post) -> ThreadlineResult<Post> {
        self.write()?;
        let mut state = self.state.lock();
        let stored = state
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| ThreadlineError::not_found("Post", post.id))?;
        *stored = post.without_comments();
        Ok(stored.clone())
    }

    async fn delete_cascade(&self, id: PostId) -> ThreadlineResult<bool> {
        self.write()?;
        let mut state = self.state.lock();
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: &NewComment) -> ThreadlineResult<Comment> {
        self.write()?;
        let mut state = self.state.lock();
        if !state.posts.contains_key(&comment.post_id) {
            return Err(ThreadlineError::Database("foreign key violation: post_id".to_string()));
        }
        if let Some(parent) = comment.parent_id {
            if !state.comments.contains_key(&parent) {
                return Err(ThreadlineError::Database("foreign key violation: parent_id".to_string()));
            }
        }
        state.next_comment += 1;
        let saved = comment.clone().into_comment(CommentId(state.next_comment));
        state.comments.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: CommentId) -> ThreadlineResult<Option<Comment>> {
        self.read()?;
        Ok(self.state.lock().comments.get(&id).cloned())
    }

    async fn find_top_level(&self, post_id: PostId) -> ThreadlineResult<Vec<Comment>> {
        self.read()?;
        Ok(self
            .state
            .lock()
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.parent_id.is_none())
            .cloned()
            .collect())
    }

    async fn find_replies(&self, parent_id: CommentId) -> ThreadlineResult<Vec<Comment>> {
        self.read()?;
        Ok(self
            .state
            .lock()
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn update(&self, comment: &Comment) -> ThreadlineResult<Comment> {
        self.write()?;
        let mut state = self.state.lock();
        let stored = state
            .comments
            .get_mut(&comment.id)
            .ok_or_else(|| ThreadlineError::not_found("Comment", comment.id))?;
        stored.content.clone_from(&comment.content);
        stored.is_deleted = comment.is_deleted;
        stored.updated_at = comment.updated_at;
        Ok(stored.clone())
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Cache whose TTLs and memory figures are set by the test.
///
/// TTLs are stored as given and never count down. Reported usage is the sum
/// of key and value lengths against `capacity`, unless overridden.
#[derive(Default)]
pub struct FakeCache {
    entries: Mutex<BTreeMap<String, (String, i64)>>,
    capacity: u64,
    memory_override: Mutex<Option<MemoryUsage>>,
    fail: AtomicBool,
    sets: AtomicUsize,
}

impl FakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn insert_with_ttl(&self, key: &str, value: &str, ttl: i64) {
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_string(), ttl));
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).map(|(value, _)| value.clone())
    }

    pub fn set_memory_override(&self, usage: Option<MemoryUsage>) {
        *self.memory_override.lock() = usage;
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    fn check(&self) -> ThreadlineResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ThreadlineError::cache("injected cache failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheInterface for FakeCache {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> ThreadlineResult<Option<String>> {
        self.check()?;
        Ok(self.raw(key))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> ThreadlineResult<()> {
        self.check()?;
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.insert_with_ttl(key, value, ttl);
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ThreadlineResult<bool> {
        self.check()?;
        Ok(self.entries.lock().remove(key).is_some())
    }

    async fn keys(&self, pattern: &str) -> ThreadlineResult<Vec<String>> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .keys()
            .filter(|key| glob::matches(pattern, key))
            .cloned()
            .collect())
    }

    async fn delete_pattern(&self, pattern: &str) -> ThreadlineResult<u64> {
        self.check()?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !glob::matches(pattern, key));
        Ok((before - entries.len()) as u64)
    }

    async fn ttl(&self, key: &str) -> ThreadlineResult<i64> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .get(key)
            .map_or(TTL_MISSING, |(_, ttl)| *ttl))
    }

    async fn memory_usage(&self) -> ThreadlineResult<MemoryUsage> {
        self.check()?;
        if let Some(usage) = *self.memory_override.lock() {
            return Ok(usage);
        }
        let used = self
            .entries
            .lock()
            .iter()
            .map(|(key, (value, _))| (key.len() + value.len()) as u64)
            .sum();
        Ok(MemoryUsage::new(used, self.capacity))
    }
}
