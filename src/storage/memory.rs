//! In-Memory Storage
//!
//! Process-local [`Storage`] backend with the same observable semantics as
//! [`PgStorage`](super::PgStorage). Preference sets are kept in their encoded
//! text form, as they are in the `users` table.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ContentItem, ContentKind, LikeEvent, TokenSet, User};

use super::{
    LikeEventChanges, LikeEventFilter, NewLikeEvent, Storage, StorageError, StorageResult,
    UpdateOptions, UserChanges,
};

#[derive(Debug, Clone)]
struct UserRow {
    id: i64,
    name: String,
    avatar: Option<String>,
    cover: Option<String>,
    favor: Option<String>,
    movie_ids: Option<String>,
    review_count: i64,
    words_count: i64,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn to_user(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            cover: self.cover.clone(),
            favor_tags: TokenSet::decode(self.favor.as_deref()),
            liked_movie_ids: TokenSet::decode(self.movie_ids.as_deref()),
            review_count: self.review_count,
            words_count: self.words_count,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, UserRow>,
    content: BTreeMap<(ContentKind, i64), ContentItem>,
    likes: BTreeMap<i64, LikeEvent>,
    next_user_id: i64,
    next_content_id: i64,
    next_like_id: i64,
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Unavailable("in-memory tables poisoned".to_string()))
    }

    /// Register a user and return its id
    pub fn insert_user(&self, name: &str) -> StorageResult<i64> {
        let mut tables = self.lock()?;
        tables.next_user_id += 1;
        let id = tables.next_user_id;
        let now = Utc::now();
        tables.users.insert(
            id,
            UserRow {
                id,
                name: name.to_string(),
                avatar: None,
                cover: None,
                favor: None,
                movie_ids: None,
                review_count: 0,
                words_count: 0,
                version: 0,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    /// Store raw preference text for a user, bypassing the codec
    pub fn set_raw_preferences(
        &self,
        user_id: i64,
        favor: Option<&str>,
        movie_ids: Option<&str>,
    ) -> StorageResult<()> {
        let mut tables = self.lock()?;
        let row = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StorageError::user_not_found(user_id))?;
        row.favor = favor.map(str::to_string);
        row.movie_ids = movie_ids.map(str::to_string);
        Ok(())
    }

    /// Raw stored preference text for a user, as `(favor, movie_ids)`
    pub fn raw_preferences(
        &self,
        user_id: i64,
    ) -> StorageResult<(Option<String>, Option<String>)> {
        let tables = self.lock()?;
        let row = tables
            .users
            .get(&user_id)
            .ok_or_else(|| StorageError::user_not_found(user_id))?;
        Ok((row.favor.clone(), row.movie_ids.clone()))
    }

    /// Add a review or words entry owned by `user_id` and return its id
    pub fn insert_content(
        &self,
        kind: ContentKind,
        user_id: i64,
        title: &str,
        like_num: i64,
        review_num: i64,
    ) -> StorageResult<i64> {
        let mut tables = self.lock()?;
        tables.next_content_id += 1;
        let id = tables.next_content_id;
        let review_num = match kind {
            ContentKind::Review => review_num,
            ContentKind::Words => 0,
        };
        tables.content.insert(
            (kind, id),
            ContentItem {
                id,
                kind,
                user_id,
                title: title.to_string(),
                like_num,
                review_num,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).map(UserRow::to_user))
    }

    async fn update_user(
        &self,
        id: i64,
        changes: &UserChanges,
        options: UpdateOptions,
    ) -> StorageResult<()> {
        let mut tables = self.lock()?;
        let row = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StorageError::user_not_found(id))?;

        if let Some(expected) = options.expected_version {
            if row.version != expected {
                return Err(StorageError::VersionConflict {
                    user_id: id,
                    expected,
                    found: row.version,
                });
            }
        }

        if let Some(tags) = &changes.favor_tags {
            row.favor = Some(tags.encode());
        }
        if let Some(ids) = &changes.liked_movie_ids {
            row.movie_ids = Some(ids.encode());
        }
        if let Some(count) = changes.review_count {
            row.review_count = count;
        }
        if let Some(count) = changes.words_count {
            row.words_count = count;
        }
        if let Some(url) = &changes.avatar {
            row.avatar = Some(url.clone());
        }
        if let Some(url) = &changes.cover {
            row.cover = Some(url.clone());
        }
        if changes.touches_preferences() {
            row.version += 1;
        }
        if !options.silent && !changes.is_empty() {
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_users(&self, offset: i64, limit: i64) -> StorageResult<(Vec<User>, i64)> {
        let tables = self.lock()?;
        let users = tables
            .users
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(UserRow::to_user)
            .collect();
        Ok((users, tables.users.len() as i64))
    }

    async fn list_user_ids(&self, after_id: i64, limit: i64) -> StorageResult<Vec<i64>> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .range(after_id.saturating_add(1)..)
            .take(limit.max(0) as usize)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn count_content_by_user(&self, user_id: i64, kind: ContentKind) -> StorageResult<i64> {
        let tables = self.lock()?;
        Ok(tables
            .content
            .values()
            .filter(|item| item.kind == kind && item.user_id == user_id)
            .count() as i64)
    }

    async fn list_content_by_user(
        &self,
        user_id: i64,
        kind: ContentKind,
    ) -> StorageResult<Vec<ContentItem>> {
        let tables = self.lock()?;
        Ok(tables
            .content
            .values()
            .filter(|item| item.kind == kind && item.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_content(&self, kind: ContentKind, id: i64) -> StorageResult<Option<ContentItem>> {
        Ok(self.lock()?.content.get(&(kind, id)).cloned())
    }

    async fn increment_like_num(&self, kind: ContentKind, id: i64) -> StorageResult<bool> {
        let mut tables = self.lock()?;
        match tables.content.get_mut(&(kind, id)) {
            Some(item) => {
                item.like_num += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_like_event(&self, fields: NewLikeEvent) -> StorageResult<LikeEvent> {
        let mut tables = self.lock()?;
        tables.next_like_id += 1;
        let event = LikeEvent {
            id: tables.next_like_id,
            sender_id: fields.sender_id,
            receiver_id: fields.receiver_id,
            content_id: fields.content_id,
            checked: false,
            created_at: Utc::now(),
        };
        tables.likes.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_like_event(&self, id: i64) -> StorageResult<Option<LikeEvent>> {
        Ok(self.lock()?.likes.get(&id).cloned())
    }

    async fn list_like_events(&self, filter: LikeEventFilter) -> StorageResult<Vec<LikeEvent>> {
        let tables = self.lock()?;
        Ok(tables
            .likes
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }

    async fn update_like_event(&self, id: i64, changes: LikeEventChanges) -> StorageResult<()> {
        let mut tables = self.lock()?;
        let event = tables
            .likes
            .get_mut(&id)
            .ok_or_else(|| StorageError::like_not_found(id))?;
        if let Some(checked) = changes.checked {
            event.checked = event.checked || checked;
        }
        Ok(())
    }
}
