//! Integration tests for counter reconciliation under failures

use std::sync::Arc;
use std::time::Duration;

use film_social::jobs::{JobScheduler, JobSchedulerConfig};
use film_social::projection::{CounterReconciler, ReconcilerConfig};
use film_social::storage::{InMemoryStorage, Storage, UpdateOptions, UserChanges};

mod common;

#[tokio::test]
async fn test_failed_write_does_not_stop_the_page() {
    let inner = Arc::new(InMemoryStorage::new());
    let ids = common::seed_users(&inner, 3, 2, 1);

    let storage = Arc::new(common::FaultyStorage::new(inner.clone()).fail_writes_for(ids[1]));
    let reconciler = CounterReconciler::new(storage);

    let report = reconciler.reconcile_all(&ids).await;

    assert_eq!(report.reconciled, vec![ids[0], ids[2]]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, ids[1]);
    assert!(report.failures[0].error.contains("injected write failure"));
    assert!(report.failures[0].retryable);

    for id in [ids[0], ids[2]] {
        let user = inner.get_user(id).await.unwrap().unwrap();
        assert_eq!((user.review_count, user.words_count), (2, 1));
    }
    let skipped = inner.get_user(ids[1]).await.unwrap().unwrap();
    assert_eq!((skipped.review_count, skipped.words_count), (0, 0));
}

#[tokio::test]
async fn test_slow_user_times_out_alone() {
    let inner = Arc::new(InMemoryStorage::new());
    let ids = common::seed_users(&inner, 3, 1, 0);

    let storage = Arc::new(
        common::FaultyStorage::new(inner.clone()).slow_for(ids[0], Duration::from_secs(10)),
    );
    let reconciler = CounterReconciler::with_config(
        storage,
        ReconcilerConfig {
            timeout: Duration::from_millis(50),
            concurrency: 3,
        },
    );

    let report = reconciler.reconcile_all(&ids).await;

    assert_eq!(report.reconciled, vec![ids[1], ids[2]]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, ids[0]);
    assert!(report.failures[0].error.contains("timed out"));
    assert!(report.failures[0].retryable);
}

#[tokio::test]
async fn test_reconcile_converges_regardless_of_prior_values() {
    let storage = Arc::new(InMemoryStorage::new());
    let ids = common::seed_users(&storage, 4, 3, 2);

    for (i, id) in ids.iter().enumerate() {
        let junk = UserChanges::new().with_counters(i as i64 * 17, -1);
        storage
            .update_user(*id, &junk, UpdateOptions::silent())
            .await
            .unwrap();
    }

    let reconciler = CounterReconciler::with_config(
        storage.clone(),
        ReconcilerConfig {
            timeout: Duration::from_secs(1),
            concurrency: 2,
        },
    );
    let report = reconciler.reconcile_all(&ids).await;
    assert!(report.is_clean());

    for id in ids {
        let user = storage.get_user(id).await.unwrap().unwrap();
        assert_eq!((user.review_count, user.words_count), (3, 2));
    }
}

#[tokio::test]
async fn test_sweep_reports_failures_and_keeps_going() {
    let inner = Arc::new(InMemoryStorage::new());
    let ids = common::seed_users(&inner, 5, 1, 1);

    let storage: Arc<dyn Storage> =
        Arc::new(common::FaultyStorage::new(inner.clone()).fail_writes_for(ids[2]));
    let scheduler = JobScheduler::with_config(
        storage.clone(),
        CounterReconciler::new(storage),
        JobSchedulerConfig {
            sweep_interval: Duration::from_secs(3600),
            page_size: 2,
        },
    );

    let report = scheduler.run_once().await;
    assert_eq!(report.pages, 3);
    assert_eq!(report.users_reconciled, 4);
    assert_eq!(report.failures.len(), 1);
    assert!(report.errors.is_empty());

    let last = inner.get_user(ids[4]).await.unwrap().unwrap();
    assert_eq!((last.review_count, last.words_count), (1, 1));
}
