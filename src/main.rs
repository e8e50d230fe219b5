//! film_social - counter reconciliation worker
//!
//! Keeps the cached per-user review/words counters fresh by sweeping all
//! users on a fixed period. Runs until Ctrl+C or SIGTERM.

use std::sync::Arc;

use film_social::jobs::JobScheduler;
use film_social::{db, logging, Config, PgStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    logging::init_tracing(config.log_format);

    tracing::info!(environment = %config.environment, "Starting film_social worker");
    tracing::info!("Connecting to database...");

    let pool = db::connect(&config).await?;

    // Verify database schema
    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");

    let storage: Arc<dyn Storage> = Arc::new(PgStorage::new(pool.clone()));
    let scheduler = JobScheduler::from_config(storage, &config).start();

    shutdown_signal().await;

    // Cleanup
    tracing::info!("Worker shutting down...");
    scheduler.abort();
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
