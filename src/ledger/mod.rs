//! Notification Ledger
//!
//! Like events between users, kept as ledger entries with a read flag.
//!
//! Recording does not deduplicate and does not reject self-likes. Self-likes
//! are persisted but filtered out when unread notifications are read.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ContentKind, LikeEvent, UserSummary};
use crate::error::{AppError, AppResult};
use crate::storage::{LikeEventChanges, LikeEventFilter, NewLikeEvent, Storage};

/// Ledger entry denormalized for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeEntry {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content_id: i64,
    pub checked: bool,
    pub created_at: DateTime<Utc>,
    /// `None` when the sender no longer exists
    pub sender: Option<UserSummary>,
    /// `None` when the review no longer exists
    pub content_title: Option<String>,
}

/// Unread notifications for one receiver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnreadLikes {
    pub count: usize,
    pub entries: Vec<LikeEntry>,
}

/// Notification Ledger
pub struct NotificationLedger {
    storage: Arc<dyn Storage>,
}

impl NotificationLedger {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Record that `sender_id` liked review `content_id` owned by
    /// `receiver_id`. Always creates a new unread entry.
    pub async fn record_like(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content_id: i64,
    ) -> AppResult<LikeEvent> {
        let event = self
            .storage
            .create_like_event(NewLikeEvent {
                sender_id,
                receiver_id,
                content_id,
            })
            .await?;

        // The entry is the record of the like; the counter on the review is
        // secondary and its failure does not undo the entry.
        match self
            .storage
            .increment_like_num(ContentKind::Review, content_id)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(content_id = content_id, "Liked review not found, like_num unchanged");
            }
            Err(e) => {
                tracing::warn!(content_id = content_id, error = %e, "Failed to bump like_num");
            }
        }

        tracing::info!(
            like_id = event.id,
            sender_id = sender_id,
            receiver_id = receiver_id,
            content_id = content_id,
            "Like recorded"
        );

        Ok(event)
    }

    /// Unchecked entries addressed to `receiver_id`, excluding self-likes,
    /// in insertion order
    pub async fn list_unread(&self, receiver_id: i64) -> AppResult<UnreadLikes> {
        let events = self.unread_events(receiver_id).await?;

        let mut senders: HashMap<i64, Option<UserSummary>> = HashMap::new();
        let mut titles: HashMap<i64, Option<String>> = HashMap::new();
        let mut entries = Vec::with_capacity(events.len());

        for event in events {
            if !senders.contains_key(&event.sender_id) {
                let sender = self.storage.get_user(event.sender_id).await?;
                senders.insert(event.sender_id, sender.map(|u| u.summary()));
            }
            if !titles.contains_key(&event.content_id) {
                let content = self
                    .storage
                    .find_content(ContentKind::Review, event.content_id)
                    .await?;
                titles.insert(event.content_id, content.map(|c| c.title));
            }

            entries.push(LikeEntry {
                id: event.id,
                sender_id: event.sender_id,
                receiver_id: event.receiver_id,
                content_id: event.content_id,
                checked: event.checked,
                created_at: event.created_at,
                sender: senders.get(&event.sender_id).cloned().flatten(),
                content_title: titles.get(&event.content_id).cloned().flatten(),
            });
        }

        Ok(UnreadLikes {
            count: entries.len(),
            entries,
        })
    }

    /// Number of entries [`list_unread`](Self::list_unread) would return
    pub async fn unread_count(&self, receiver_id: i64) -> AppResult<usize> {
        Ok(self.unread_events(receiver_id).await?.len())
    }

    /// Mark an entry as read. Marking an already-read entry is a no-op.
    pub async fn mark_checked(&self, entry_id: i64) -> AppResult<()> {
        let event = self
            .storage
            .find_like_event(entry_id)
            .await?
            .ok_or(AppError::LikeNotFound(entry_id))?;

        if event.checked {
            tracing::debug!(like_id = entry_id, "Like already checked");
            return Ok(());
        }

        self.storage
            .update_like_event(entry_id, LikeEventChanges::mark_checked())
            .await?;

        tracing::debug!(like_id = entry_id, "Like checked");
        Ok(())
    }

    async fn unread_events(&self, receiver_id: i64) -> AppResult<Vec<LikeEvent>> {
        let events = self
            .storage
            .list_like_events(LikeEventFilter::unread_for(receiver_id))
            .await?;
        Ok(events.into_iter().filter(|e| !e.is_self_like()).collect())
    }
}
