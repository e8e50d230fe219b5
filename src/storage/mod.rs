//! Storage module
//!
//! The narrow persistence interface the engine runs against, and its
//! PostgreSQL and in-memory implementations.

mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{ContentItem, ContentKind, LikeEvent, TokenSet, User};

pub use error::StorageError;
pub use memory::InMemoryStorage;
pub use postgres::PgStorage;

pub type StorageResult<T> = Result<T, StorageError>;

// =========================================================================
// Write models
// =========================================================================

/// Field changes for a user record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub favor_tags: Option<TokenSet>,
    pub liked_movie_ids: Option<TokenSet>,
    pub review_count: Option<i64>,
    pub words_count: Option<i64>,
    pub avatar: Option<String>,
    pub cover: Option<String>,
}

impl UserChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_favor_tags(mut self, tags: TokenSet) -> Self {
        self.favor_tags = Some(tags);
        self
    }

    pub fn with_liked_movie_ids(mut self, ids: TokenSet) -> Self {
        self.liked_movie_ids = Some(ids);
        self
    }

    pub fn with_counters(mut self, review_count: i64, words_count: i64) -> Self {
        self.review_count = Some(review_count);
        self.words_count = Some(words_count);
        self
    }

    pub fn with_avatar(mut self, url: String) -> Self {
        self.avatar = Some(url);
        self
    }

    pub fn with_cover(mut self, url: String) -> Self {
        self.cover = Some(url);
        self
    }

    /// True when a versioned preference field is being written
    pub fn touches_preferences(&self) -> bool {
        self.favor_tags.is_some() || self.liked_movie_ids.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// How a user update is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Leave `updated_at` untouched (cache refresh, not a user action)
    pub silent: bool,

    /// Reject the write unless the stored version still matches
    pub expected_version: Option<i64>,
}

impl UpdateOptions {
    pub fn silent() -> Self {
        Self {
            silent: true,
            expected_version: None,
        }
    }

    pub fn expecting_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Fields of a like event to be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLikeEvent {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content_id: i64,
}

/// Selection over like events; unset fields match anything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeEventFilter {
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub checked: Option<bool>,
}

impl LikeEventFilter {
    /// Unchecked events addressed to `receiver_id`
    pub fn unread_for(receiver_id: i64) -> Self {
        Self {
            sender_id: None,
            receiver_id: Some(receiver_id),
            checked: Some(false),
        }
    }

    pub fn matches(&self, event: &LikeEvent) -> bool {
        self.sender_id.map_or(true, |id| event.sender_id == id)
            && self.receiver_id.map_or(true, |id| event.receiver_id == id)
            && self.checked.map_or(true, |c| event.checked == c)
    }
}

/// Field changes for a like event.
///
/// Backends only ever raise `checked`; a stored `true` is never lowered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeEventChanges {
    pub checked: Option<bool>,
}

impl LikeEventChanges {
    pub fn mark_checked() -> Self {
        Self {
            checked: Some(true),
        }
    }
}

// =========================================================================
// Storage trait
// =========================================================================

/// Persistence interface used by every component.
///
/// Implementations own connections and transactions; callers see one call in
/// and one result out.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load a user; `None` when the id does not resolve.
    async fn get_user(&self, id: i64) -> StorageResult<Option<User>>;

    /// Apply `changes` to a user.
    ///
    /// Fails with `NotFound` for an unknown id and with `VersionConflict`
    /// when `options.expected_version` no longer matches. Writes touching a
    /// preference field bump the version; non-silent writes bump `updated_at`.
    async fn update_user(
        &self,
        id: i64,
        changes: &UserChanges,
        options: UpdateOptions,
    ) -> StorageResult<()>;

    /// Page of users ordered by id, with the total user count
    async fn list_users(&self, offset: i64, limit: i64) -> StorageResult<(Vec<User>, i64)>;

    /// Up to `limit` user ids greater than `after_id`, ascending
    async fn list_user_ids(&self, after_id: i64, limit: i64) -> StorageResult<Vec<i64>>;

    async fn count_content_by_user(&self, user_id: i64, kind: ContentKind) -> StorageResult<i64>;

    async fn list_content_by_user(
        &self,
        user_id: i64,
        kind: ContentKind,
    ) -> StorageResult<Vec<ContentItem>>;

    async fn find_content(&self, kind: ContentKind, id: i64) -> StorageResult<Option<ContentItem>>;

    /// Add one to `like_num`; false when the item does not exist
    async fn increment_like_num(&self, kind: ContentKind, id: i64) -> StorageResult<bool>;

    /// Record a new, unchecked like event
    async fn create_like_event(&self, fields: NewLikeEvent) -> StorageResult<LikeEvent>;

    async fn find_like_event(&self, id: i64) -> StorageResult<Option<LikeEvent>>;

    /// Matching events in insertion order
    async fn list_like_events(&self, filter: LikeEventFilter) -> StorageResult<Vec<LikeEvent>>;

    async fn update_like_event(&self, id: i64, changes: LikeEventChanges) -> StorageResult<()>;
}
