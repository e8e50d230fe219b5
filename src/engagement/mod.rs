//! Engagement module
//!
//! On-demand engagement totals over the content a user owns. Read-only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ContentKind;
use crate::error::{AppError, AppResult};
use crate::storage::Storage;

/// Engagement totals for one user's content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementTotals {
    /// Sum of `like_num` over the user's reviews
    pub review_like_total: i64,
    /// Sum of `review_num` over the user's reviews
    pub review_count_total: i64,
    /// Sum of `like_num` over the user's words
    pub words_like_total: i64,
}

/// Engagement Aggregator
pub struct EngagementAggregator {
    storage: Arc<dyn Storage>,
}

impl EngagementAggregator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Sum engagement over everything `user_id` owns.
    ///
    /// A user without content gets zero totals; only an unknown user is an
    /// error.
    pub async fn aggregate_for_user(&self, user_id: i64) -> AppResult<EngagementTotals> {
        self.ensure_user(user_id).await?;

        let reviews = self
            .storage
            .list_content_by_user(user_id, ContentKind::Review)
            .await?;
        let words = self
            .storage
            .list_content_by_user(user_id, ContentKind::Words)
            .await?;

        let totals = EngagementTotals {
            review_like_total: reviews.iter().map(|r| r.like_num).sum(),
            review_count_total: reviews.iter().map(|r| r.review_num).sum(),
            words_like_total: words.iter().map(|w| w.like_num).sum(),
        };

        tracing::debug!(
            user_id = user_id,
            reviews = reviews.len(),
            words = words.len(),
            "Engagement aggregated"
        );

        Ok(totals)
    }

    /// Live number of items of `kind` owned by `user_id`
    pub async fn content_count(&self, user_id: i64, kind: ContentKind) -> AppResult<i64> {
        self.ensure_user(user_id).await?;
        Ok(self.storage.count_content_by_user(user_id, kind).await?)
    }

    async fn ensure_user(&self, user_id: i64) -> AppResult<()> {
        match self.storage.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::UserNotFound(user_id)),
        }
    }
}
