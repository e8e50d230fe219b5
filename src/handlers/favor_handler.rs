//! Favor Collection Handler
//!
//! Records the genres and movie of a "favor" action in one preference write.

use std::sync::Arc;

use crate::error::AppError;
use crate::preferences::PreferenceStore;

use super::{CollectFavorCommand, CollectFavorResult};

/// Handler for favor collection
pub struct CollectFavorHandler {
    preferences: Arc<PreferenceStore>,
}

impl CollectFavorHandler {
    pub fn new(preferences: Arc<PreferenceStore>) -> Self {
        Self { preferences }
    }

    /// Execute the collect favor command
    pub async fn execute(
        &self,
        command: CollectFavorCommand,
    ) -> Result<CollectFavorResult, AppError> {
        let update = self
            .preferences
            .record(command.user_id, &command.tags(), Some(command.movie_id))
            .await?;

        Ok(CollectFavorResult {
            user_id: command.user_id,
            added_tags: update.added_tags,
            movie_added: update.movie_added,
        })
    }
}
