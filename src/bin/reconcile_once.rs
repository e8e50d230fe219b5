//! One-shot counter sweep
//!
//! Run with: cargo run --bin reconcile_once -- [--page-size 500]

use std::sync::Arc;
use std::time::Instant;

use film_social::jobs::{JobScheduler, JobSchedulerConfig};
use film_social::projection::ReconcilerConfig;
use film_social::{db, logging, Config, CounterReconciler, PgStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    logging::init_tracing(config.log_format);

    let args: Vec<String> = std::env::args().collect();
    let page_size = page_size_arg(&args, config.reconcile_page_size)?;

    let pool = db::connect(&config).await?;
    db::verify_connection(&pool).await?;

    let storage: Arc<dyn Storage> = Arc::new(PgStorage::new(pool.clone()));
    let reconciler = CounterReconciler::with_config(storage.clone(), ReconcilerConfig::from(&config));
    let scheduler = JobScheduler::with_config(
        storage,
        reconciler,
        JobSchedulerConfig {
            sweep_interval: config.reconcile_interval,
            page_size,
        },
    );

    let start = Instant::now();
    let report = scheduler.run_once().await;
    let elapsed = start.elapsed();

    println!("Pages:        {}", report.pages);
    println!("Reconciled:   {}", report.users_reconciled);
    println!("Failed users: {}", report.failures.len());
    for failure in &report.failures {
        println!("  user {}: {}", failure.user_id, failure.error);
    }
    for error in &report.errors {
        println!("Error: {}", error);
    }
    println!("Elapsed:      {:.2?}", elapsed);

    pool.close().await;

    if !report.errors.is_empty() {
        return Err(anyhow::anyhow!("Counter sweep aborted"));
    }
    Ok(())
}

/// `--page-size N`, falling back to `default` when absent
fn page_size_arg(args: &[String], default: i64) -> anyhow::Result<i64> {
    let Some(i) = args.iter().position(|a| a == "--page-size") else {
        return Ok(default);
    };
    let raw = args
        .get(i + 1)
        .ok_or_else(|| anyhow::anyhow!("--page-size requires a value"))?;
    let page_size: i64 = raw
        .parse()
        .map_err(|_| anyhow::anyhow!("--page-size must be an integer, got {:?}", raw))?;
    if page_size <= 0 {
        anyhow::bail!("--page-size must be positive, got {}", page_size);
    }
    Ok(page_size)
}
