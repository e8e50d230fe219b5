//! User Listing Handler
//!
//! Serves a page of users and refreshes their counters in the background.

use std::sync::Arc;

use crate::error::AppError;
use crate::projection::CounterReconciler;
use crate::storage::Storage;

use super::{ListUsersQuery, UserPage};

/// Handler for user listing
pub struct ListUsersHandler {
    storage: Arc<dyn Storage>,
    reconciler: CounterReconciler,
}

impl ListUsersHandler {
    pub fn new(storage: Arc<dyn Storage>, reconciler: CounterReconciler) -> Self {
        Self {
            storage,
            reconciler,
        }
    }

    /// Execute the listing query.
    ///
    /// The returned counters are whatever is cached at read time; the
    /// reconcile for the listed users runs detached and is not awaited.
    pub async fn execute(&self, query: ListUsersQuery) -> Result<UserPage, AppError> {
        query.validate()?;

        let (users, count) = self
            .storage
            .list_users(query.offset(), i64::from(query.limit))
            .await?;

        let user_ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        if !user_ids.is_empty() {
            tracing::debug!(users = user_ids.len(), "Scheduling counter reconcile for listing");
            drop(self.reconciler.spawn_reconcile(user_ids));
        }

        Ok(UserPage { count, users })
    }
}
