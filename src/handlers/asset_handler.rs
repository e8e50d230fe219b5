//! Profile Asset Handler
//!
//! Points a user's avatar or cover at an already-stored image.

use std::sync::Arc;

use crate::domain::AssetKind;
use crate::error::AppError;
use crate::storage::{Storage, UpdateOptions, UserChanges};

use super::{UpdateAssetCommand, UpdateAssetResult};

/// Handler for avatar/cover updates
pub struct UpdateAssetHandler {
    storage: Arc<dyn Storage>,
    base_url: String,
}

impl UpdateAssetHandler {
    pub fn new(storage: Arc<dyn Storage>, base_url: impl Into<String>) -> Self {
        Self {
            storage,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Execute the update asset command
    pub async fn execute(
        &self,
        command: UpdateAssetCommand,
    ) -> Result<UpdateAssetResult, AppError> {
        command.validate()?;

        let url = format!("{}/images/{}", self.base_url, command.filename);
        let changes = match command.kind {
            AssetKind::Avatar => UserChanges::new().with_avatar(url.clone()),
            AssetKind::Cover => UserChanges::new().with_cover(url.clone()),
        };

        self.storage
            .update_user(command.user_id, &changes, UpdateOptions::default())
            .await?;

        tracing::info!(user_id = command.user_id, kind = ?command.kind, "Profile asset updated");

        Ok(UpdateAssetResult {
            user_id: command.user_id,
            kind: command.kind,
            url,
        })
    }
}
