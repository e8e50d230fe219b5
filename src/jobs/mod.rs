//! Scheduled Jobs
//!
//! Background sweep that reconciles the cached counters of every user,
//! page by page, on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::projection::{CounterReconciler, ReconcileFailure, ReconcilerConfig};
use crate::storage::{Storage, StorageError};

// =========================================================================
// Counter sweep
// =========================================================================

/// Walk all users by ascending id and reconcile each page.
///
/// Per-user failures are collected in the report. Only a failure to list the
/// next page stops the sweep.
pub async fn sweep_counters(
    storage: &dyn Storage,
    reconciler: &CounterReconciler,
    page_size: i64,
) -> Result<SweepReport, JobError> {
    let mut report = SweepReport::default();
    let mut after_id = 0;

    loop {
        let ids = storage.list_user_ids(after_id, page_size).await?;
        let Some(&last) = ids.last() else {
            break;
        };

        let page = reconciler.reconcile_all(&ids).await;
        report.pages += 1;
        report.users_reconciled += page.reconciled.len();
        report.failures.extend(page.failures);

        after_id = last;
        if (ids.len() as i64) < page_size {
            break;
        }
    }

    report.completed_at = Utc::now();

    tracing::info!(
        pages = report.pages,
        users_reconciled = report.users_reconciled,
        failed = report.failures.len(),
        "Counter sweep finished"
    );

    Ok(report)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval between counter sweeps (default: 5 minutes)
    pub sweep_interval: Duration,
    /// Users per reconcile page (default: 100)
    pub page_size: i64,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
            page_size: 100,
        }
    }
}

impl From<&Config> for JobSchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            sweep_interval: config.reconcile_interval,
            page_size: config.reconcile_page_size,
        }
    }
}

/// Job Scheduler - runs the periodic counter sweep
pub struct JobScheduler {
    storage: Arc<dyn Storage>,
    reconciler: CounterReconciler,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a new job scheduler with default settings
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let reconciler = CounterReconciler::new(storage.clone());
        Self {
            storage,
            reconciler,
            config: JobSchedulerConfig::default(),
        }
    }

    /// Create from application configuration
    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        let reconciler =
            CounterReconciler::with_config(storage.clone(), ReconcilerConfig::from(config));
        Self {
            storage,
            reconciler,
            config: JobSchedulerConfig::from(config),
        }
    }

    /// Create with custom configuration
    pub fn with_config(
        storage: Arc<dyn Storage>,
        reconciler: CounterReconciler,
        config: JobSchedulerConfig,
    ) -> Self {
        Self {
            storage,
            reconciler,
            config,
        }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            page_size = self.config.page_size,
            "Job scheduler started"
        );

        let mut sweep_interval = interval(self.config.sweep_interval);
        sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            sweep_interval.tick().await;
            if let Err(e) =
                sweep_counters(self.storage.as_ref(), &self.reconciler, self.config.page_size).await
            {
                tracing::error!(error = %e, "Counter sweep failed");
            }
        }
    }

    /// Run one sweep (for manual trigger or testing)
    pub async fn run_once(&self) -> SweepReport {
        match sweep_counters(self.storage.as_ref(), &self.reconciler, self.config.page_size).await
        {
            Ok(report) => report,
            Err(e) => SweepReport {
                errors: vec![format!("Counter sweep: {}", e)],
                completed_at: Utc::now(),
                ..SweepReport::default()
            },
        }
    }
}

/// Report from a counter sweep
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub pages: usize,
    pub users_reconciled: usize,
    pub failures: Vec<ReconcileFailure>,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =========================================================================
// Tests
// =========================================================================
