//! Common test utilities

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use film_social::domain::{ContentItem, ContentKind, LikeEvent, User};
use film_social::storage::{
    InMemoryStorage, LikeEventChanges, LikeEventFilter, NewLikeEvent, Storage, StorageError,
    StorageResult, UpdateOptions, UserChanges,
};

/// Seed `count` users, each owning `reviews` reviews and `words` words.
/// Returns the user ids in creation order.
pub fn seed_users(storage: &InMemoryStorage, count: usize, reviews: usize, words: usize) -> Vec<i64> {
    (0..count)
        .map(|i| {
            let id = storage
                .insert_user(&format!("user{}", i))
                .expect("insert user");
            for r in 0..reviews {
                storage
                    .insert_content(ContentKind::Review, id, &format!("review {}", r), 0, 0)
                    .expect("insert review");
            }
            for w in 0..words {
                storage
                    .insert_content(ContentKind::Words, id, &format!("words {}", w), 0, 0)
                    .expect("insert words");
            }
            id
        })
        .collect()
}

/// Storage wrapper that injects faults for selected users
pub struct FaultyStorage {
    inner: Arc<InMemoryStorage>,
    failing_writes: HashSet<i64>,
    racing_writes: HashSet<i64>,
    slow_users: HashSet<i64>,
    delay: Duration,
}

impl FaultyStorage {
    pub fn new(inner: Arc<InMemoryStorage>) -> Self {
        Self {
            inner,
            failing_writes: HashSet::new(),
            racing_writes: HashSet::new(),
            slow_users: HashSet::new(),
            delay: Duration::from_secs(10),
        }
    }

    /// `update_user` fails for this user
    pub fn fail_writes_for(mut self, user_id: i64) -> Self {
        self.failing_writes.insert(user_id);
        self
    }

    /// Another writer bumps this user's version just before every
    /// versioned `update_user`, leaving the preference sets as they were
    pub fn race_writes_for(mut self, user_id: i64) -> Self {
        self.racing_writes.insert(user_id);
        self
    }

    /// Content counts for this user stall for `delay`
    pub fn slow_for(mut self, user_id: i64, delay: Duration) -> Self {
        self.slow_users.insert(user_id);
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Storage for FaultyStorage {
    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn update_user(
        &self,
        id: i64,
        changes: &UserChanges,
        options: UpdateOptions,
    ) -> StorageResult<()> {
        if self.failing_writes.contains(&id) {
            return Err(StorageError::Unavailable(format!("injected write failure for user {}", id)));
        }
        if options.expected_version.is_some() && self.racing_writes.contains(&id) {
            if let Some(current) = self.inner.get_user(id).await? {
                let rewrite = UserChanges::new().with_favor_tags(current.favor_tags);
                self.inner
                    .update_user(id, &rewrite, UpdateOptions::default())
                    .await?;
            }
        }
        self.inner.update_user(id, changes, options).await
    }

    async fn list_users(&self, offset: i64, limit: i64) -> StorageResult<(Vec<User>, i64)> {
        self.inner.list_users(offset, limit).await
    }

    async fn list_user_ids(&self, after_id: i64, limit: i64) -> StorageResult<Vec<i64>> {
        self.inner.list_user_ids(after_id, limit).await
    }

    async fn count_content_by_user(&self, user_id: i64, kind: ContentKind) -> StorageResult<i64> {
        if self.slow_users.contains(&user_id) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.count_content_by_user(user_id, kind).await
    }

    async fn list_content_by_user(
        &self,
        user_id: i64,
        kind: ContentKind,
    ) -> StorageResult<Vec<ContentItem>> {
        self.inner.list_content_by_user(user_id, kind).await
    }

    async fn find_content(&self, kind: ContentKind, id: i64) -> StorageResult<Option<ContentItem>> {
        self.inner.find_content(kind, id).await
    }

    async fn increment_like_num(&self, kind: ContentKind, id: i64) -> StorageResult<bool> {
        self.inner.increment_like_num(kind, id).await
    }

    async fn create_like_event(&self, fields: NewLikeEvent) -> StorageResult<LikeEvent> {
        self.inner.create_like_event(fields).await
    }

    async fn find_like_event(&self, id: i64) -> StorageResult<Option<LikeEvent>> {
        self.inner.find_like_event(id).await
    }

    async fn list_like_events(&self, filter: LikeEventFilter) -> StorageResult<Vec<LikeEvent>> {
        self.inner.list_like_events(filter).await
    }

    async fn update_like_event(&self, id: i64, changes: LikeEventChanges) -> StorageResult<()> {
        self.inner.update_like_event(id, changes).await
    }
}
