//! Counter Reconciler
//!
//! Refreshes the cached `review_count` / `words_count` on user records from
//! the content tables. The counters are a projection: they may lag behind the
//! content tables between passes, and a pass always converges them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::ContentKind;
use crate::storage::{Storage, StorageError, UpdateOptions, UserChanges};

/// Reconciler settings
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Deadline for one user's count-and-write
    pub timeout: Duration,
    /// Users reconciled in parallel
    pub concurrency: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            concurrency: 8,
        }
    }
}

impl From<&Config> for ReconcilerConfig {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.reconcile_timeout,
            concurrency: config.reconcile_concurrency,
        }
    }
}

/// Counter values written for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserCounters {
    pub review_count: i64,
    pub words_count: i64,
}

/// A user whose reconcile did not complete
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileFailure {
    pub user_id: i64,
    pub error: String,
    /// The next pass may succeed without intervention
    pub retryable: bool,
}

/// Result of one reconcile pass
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub run_id: Uuid,
    /// Successfully reconciled users, ascending
    pub reconciled: Vec<i64>,
    pub failures: Vec<ReconcileFailure>,
    pub completed_at: DateTime<Utc>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Counter Reconciler
///
/// Each user is reconciled independently. A failure or timeout for one user
/// is logged and recorded in the report; it never aborts the rest of the page
/// and is never returned as an error. No retries.
#[derive(Clone)]
pub struct CounterReconciler {
    storage: Arc<dyn Storage>,
    config: ReconcilerConfig,
}

impl CounterReconciler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_config(storage, ReconcilerConfig::default())
    }

    pub fn with_config(storage: Arc<dyn Storage>, config: ReconcilerConfig) -> Self {
        Self { storage, config }
    }

    /// Count a user's content and write the counters back silently
    pub async fn reconcile_user(&self, user_id: i64) -> Result<UserCounters, StorageError> {
        let counters = UserCounters {
            review_count: self
                .storage
                .count_content_by_user(user_id, ContentKind::Review)
                .await?,
            words_count: self
                .storage
                .count_content_by_user(user_id, ContentKind::Words)
                .await?,
        };

        let changes = UserChanges::new().with_counters(counters.review_count, counters.words_count);
        self.storage
            .update_user(user_id, &changes, UpdateOptions::silent())
            .await?;

        tracing::debug!(
            user_id = user_id,
            review_count = counters.review_count,
            words_count = counters.words_count,
            "Counters reconciled"
        );

        Ok(counters)
    }

    async fn reconcile_with_timeout(&self, user_id: i64) -> Result<UserCounters, StorageError> {
        match tokio::time::timeout(self.config.timeout, self.reconcile_user(user_id)).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout),
        }
    }

    /// Reconcile every user in `user_ids`, at most `concurrency` at a time
    pub async fn reconcile_all(&self, user_ids: &[i64]) -> ReconcileReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("reconcile", run_id = %run_id, users = user_ids.len());
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let handles: Vec<(i64, JoinHandle<Result<UserCounters, StorageError>>)> = user_ids
            .iter()
            .map(|&user_id| {
                let this = self.clone();
                let permits = permits.clone();
                let task = async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|_| StorageError::Unavailable("reconcile pool closed".to_string()))?;
                    this.reconcile_with_timeout(user_id).await
                };
                (user_id, tokio::spawn(task.instrument(span.clone())))
            })
            .collect();

        let mut reconciled = Vec::with_capacity(handles.len());
        let mut failures = Vec::new();

        for (user_id, handle) in handles {
            let (error, retryable) = match handle.await {
                Ok(Ok(_)) => {
                    reconciled.push(user_id);
                    continue;
                }
                Ok(Err(e)) => (e.to_string(), e.is_retryable()),
                Err(e) => (format!("reconcile task failed: {}", e), false),
            };
            span.in_scope(|| {
                tracing::warn!(
                    user_id = user_id,
                    error = %error,
                    retryable = retryable,
                    "Counter reconcile failed"
                );
            });
            failures.push(ReconcileFailure {
                user_id,
                error,
                retryable,
            });
        }

        reconciled.sort_unstable();

        span.in_scope(|| {
            tracing::info!(
                reconciled = reconciled.len(),
                failed = failures.len(),
                "Reconcile pass finished"
            );
        });

        ReconcileReport {
            run_id,
            reconciled,
            failures,
            completed_at: Utc::now(),
        }
    }

    /// Start a detached reconcile pass.
    ///
    /// The caller does not wait; the outcome is only logged. The handle may be
    /// dropped without cancelling the pass.
    pub fn spawn_reconcile(&self, user_ids: Vec<i64>) -> JoinHandle<ReconcileReport> {
        let this = self.clone();
        tokio::spawn(async move { this.reconcile_all(&user_ids).await })
    }
}
