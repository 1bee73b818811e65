//! Job dispatch
//!
//! `POST /jobs/:id/run` hands a job id to a [`JobDispatcher`] and returns
//! without waiting. Two dispatchers exist:
//!
//! - [`QueueDispatcher`]: pushes a [`RunPipelineTask`] onto the apalis queue in
//!   PostgreSQL, consumed by [`scheduler::JobScheduler`]
//! - [`InlineDispatcher`]: runs the pipeline on a spawned tokio task in this
//!   process (development and tests)

pub mod scheduler;

use apalis::prelude::*;
use apalis_postgres::PostgresStorage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{DatabaseConfig, QueueConfig};
use crate::pipeline::PipelineWorker;

pub use scheduler::JobScheduler;

const QUEUE_POOL_CONNECTIONS: u32 = 5;

/// Failure to hand a job to the queue
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to enqueue job: {0}")]
    Queue(String),
}

/// Queue message: the job id and nothing else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPipelineTask {
    pub job_id: Uuid,
}

#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn enqueue(&self, job_id: Uuid) -> Result<(), DispatchError>;
}

/// Pool for the queue tables
///
/// Shares the entity store pool when the queue lives in the same database.
pub async fn connect_queue(
    queue: &QueueConfig,
    database: &DatabaseConfig,
    db_pool: &PgPool,
) -> Result<PgPool, sqlx::Error> {
    if queue.url == database.url {
        return Ok(db_pool.clone());
    }

    let pool = PgPoolOptions::new()
        .max_connections(QUEUE_POOL_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(database.connect_timeout_secs))
        .connect(&queue.url)
        .await?;

    info!("Job queue connection pool created");
    Ok(pool)
}

/// Create the apalis tables if they do not exist yet
pub async fn setup_queue(pool: &PgPool) -> Result<(), sqlx::Error> {
    PostgresStorage::setup(pool).await?;
    info!("Job queue storage ready");
    Ok(())
}

/// Dispatcher backed by the PostgreSQL task queue
#[derive(Clone)]
pub struct QueueDispatcher {
    storage: PostgresStorage<RunPipelineTask>,
}

impl QueueDispatcher {
    pub fn new(pool: &PgPool) -> Self {
        Self {
            storage: PostgresStorage::new(pool),
        }
    }
}

#[async_trait]
impl JobDispatcher for QueueDispatcher {
    #[tracing::instrument(skip(self))]
    async fn enqueue(&self, job_id: Uuid) -> Result<(), DispatchError> {
        let mut storage = self.storage.clone();
        storage
            .push(RunPipelineTask { job_id })
            .await
            .map_err(|e| DispatchError::Queue(e.to_string()))?;

        info!(%job_id, "Pipeline task enqueued");
        Ok(())
    }
}

/// Dispatcher that runs the pipeline in-process
pub struct InlineDispatcher {
    worker: Arc<PipelineWorker>,
}

impl InlineDispatcher {
    pub fn new(worker: Arc<PipelineWorker>) -> Self {
        Self { worker }
    }
}

#[async_trait]
impl JobDispatcher for InlineDispatcher {
    async fn enqueue(&self, job_id: Uuid) -> Result<(), DispatchError> {
        let worker = self.worker.clone();
        tokio::spawn(async move {
            if let Err(e) = worker.run(job_id).await {
                error!(%job_id, error = %e, "Pipeline run aborted");
            }
        });

        info!(%job_id, "Pipeline run spawned in-process");
        Ok(())
    }
}
