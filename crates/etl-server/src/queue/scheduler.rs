//! Queue consumer
//!
//! Pulls [`RunPipelineTask`]s from the apalis queue in PostgreSQL and runs
//! them through the [`PipelineWorker`].

use anyhow::Result;
use apalis::prelude::*;
use apalis_postgres::PostgresStorage;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::RunPipelineTask;
use crate::pipeline::{PipelineError, PipelineWorker};

pub const WORKER_NAME: &str = "etl-pipeline-worker";

/// Job scheduler
pub struct JobScheduler {
    db: PgPool,
    worker: Arc<PipelineWorker>,
}

impl JobScheduler {
    pub fn new(db: PgPool, worker: Arc<PipelineWorker>) -> Self {
        Self { db, worker }
    }

    /// Start consuming tasks on a background task
    ///
    /// The queue tables must already exist (see [`super::setup_queue`]).
    pub async fn start(self) -> Result<JoinHandle<()>> {
        info!("Starting job scheduler");

        let storage: PostgresStorage<RunPipelineTask> = PostgresStorage::new(&self.db);
        let worker = self.worker;

        let handle = tokio::spawn(async move {
            info!(worker = WORKER_NAME, "Job worker started");
            if let Err(e) = Monitor::new()
                .register(move |_index| {
                    WorkerBuilder::new(WORKER_NAME)
                        .backend(storage.clone())
                        .data(worker.clone())
                        .build(process_pipeline_task)
                })
                .run()
                .await
            {
                error!("Job worker error: {:?}", e);
            }
            info!("Job worker stopped");
        });

        Ok(handle)
    }
}

/// Run one dequeued task
///
/// A fatal pipeline error is handed back to the queue, which records the
/// task as failed; the job row itself stays `running`.
async fn process_pipeline_task(
    task: RunPipelineTask,
    worker: Data<Arc<PipelineWorker>>,
) -> Result<(), PipelineError> {
    info!(job_id = %task.job_id, "Processing pipeline task");

    match worker.run(task.job_id).await {
        Ok(Some(report)) => {
            info!(
                job_id = %report.job_id,
                processed = report.processed,
                failed = report.failed,
                "Pipeline task finished"
            );
            Ok(())
        },
        Ok(None) => Ok(()),
        Err(e) => {
            error!(job_id = %task.job_id, error = %e, "Pipeline task aborted");
            Err(e)
        },
    }
}
