//! Standalone queue consumer
//!
//! Runs pipeline jobs pushed by API servers in `QUEUE_MODE=queue`.

use anyhow::{Context, Result};
use etl_common::logging::{init_logging, LogConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use etl_server::{
    config::Config,
    db::{self, PgStore},
    pipeline::{PipelineWorker, ResourceReader},
    queue::{self, JobScheduler},
    storage::S3Storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("etl-worker")
        .filter_directives("etl_server=debug,sqlx=warn,apalis=info")
        .build()
        .merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    info!("Starting ETL Worker");

    let config = Config::load().context("Failed to load config")?;

    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    db::health_check(&db_pool).await?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    let queue_pool = queue::connect_queue(&config.queue, &config.database, &db_pool).await?;
    queue::setup_queue(&queue_pool).await?;

    let worker = Arc::new(PipelineWorker::new(
        Arc::new(PgStore::new(db_pool, &config.database.user_role)),
        Arc::new(S3Storage::new(config.storage.clone())),
        ResourceReader::new().with_limit(config.queue.max_asset_bytes),
    ));

    let handle = JobScheduler::new(queue_pool, worker).start().await?;

    tokio::select! {
        result = handle => {
            if let Err(e) = result {
                error!("Worker task panicked: {}", e);
            }
        },
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping worker");
        },
    }

    info!("ETL Worker stopped");
    Ok(())
}
