//! Preference Store
//!
//! Accumulates a user's favor tags and liked movie ids.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{TokenSet, User};
use crate::error::{AppError, AppResult};
use crate::storage::{Storage, UpdateOptions, UserChanges};

use super::UserLocks;

/// Outcome of a preference update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    /// Favor tags that were not yet present, in input order
    pub added_tags: Vec<String>,
    /// Whether the movie id was new
    pub movie_added: bool,
}

impl PreferenceUpdate {
    pub fn is_noop(&self) -> bool {
        self.added_tags.is_empty() && !self.movie_added
    }
}

/// Preference Store
///
/// Every call re-reads the user. Mutations on the same user are serialized
/// in-process, and each write carries the version it was computed from, so a
/// concurrent writer in another process surfaces as [`AppError::Conflict`]
/// instead of a lost update.
pub struct PreferenceStore {
    storage: Arc<dyn Storage>,
    locks: UserLocks,
}

impl PreferenceStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            locks: UserLocks::new(),
        }
    }

    /// Add favor tags. Each input may itself be whitespace-delimited free
    /// text; existing tags keep their position and new ones are appended in
    /// first-seen order. Returns the tags that were added.
    pub async fn add_favor_tags<I, S>(&self, user_id: i64, tags: I) -> AppResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: Vec<String> = tags.into_iter().map(|t| t.as_ref().to_string()).collect();
        let update = self.record(user_id, &tags, None).await?;
        Ok(update.added_tags)
    }

    /// Add a liked movie id. Returns false when it was already liked.
    pub async fn add_liked_movie(&self, user_id: i64, movie_id: i64) -> AppResult<bool> {
        let update = self.record(user_id, &[], Some(movie_id)).await?;
        Ok(update.movie_added)
    }

    /// Add favor tags and a liked movie in a single write
    pub async fn record(
        &self,
        user_id: i64,
        tags: &[String],
        movie_id: Option<i64>,
    ) -> AppResult<PreferenceUpdate> {
        let _guard = self.locks.lock(user_id).await;

        let user = self.load_user(user_id).await?;
        let mut favor_tags = user.favor_tags.clone();
        let mut liked_movie_ids = user.liked_movie_ids.clone();

        let update = PreferenceUpdate {
            added_tags: favor_tags.extend(tags),
            movie_added: movie_id.map_or(false, |id| liked_movie_ids.insert(&id.to_string())),
        };

        if update.is_noop() {
            tracing::debug!(user_id = user_id, "Preferences already up to date");
            return Ok(update);
        }

        let mut changes = UserChanges::new();
        if !update.added_tags.is_empty() {
            changes = changes.with_favor_tags(favor_tags);
        }
        if update.movie_added {
            changes = changes.with_liked_movie_ids(liked_movie_ids);
        }

        self.write(&user, &changes).await?;

        tracing::info!(
            user_id = user_id,
            added_tags = ?update.added_tags,
            movie_added = update.movie_added,
            "Preferences updated"
        );

        Ok(update)
    }

    /// Current favor tags
    pub async fn favor_tags(&self, user_id: i64) -> AppResult<TokenSet> {
        Ok(self.load_user(user_id).await?.favor_tags)
    }

    /// Current liked movie ids
    pub async fn liked_movie_ids(&self, user_id: i64) -> AppResult<TokenSet> {
        Ok(self.load_user(user_id).await?.liked_movie_ids)
    }

    async fn load_user(&self, user_id: i64) -> AppResult<User> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound(user_id))
    }

    async fn write(&self, user: &User, changes: &UserChanges) -> AppResult<()> {
        let options = UpdateOptions::default().expecting_version(user.version);
        self.storage
            .update_user(user.id, changes, options)
            .await
            .map_err(|e| {
                if e.is_version_conflict() {
                    tracing::warn!(user_id = user.id, error = %e, "Concurrent preference write");
                }
                AppError::from(e)
            })
    }
}
