//! Run job command
//!
//! Marks the job `running` and hands it to the dispatcher. Completion is
//! observed by polling the job, its assets and its version.

use etl_common::types::JobStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::queue::{DispatchError, JobDispatcher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunJobResponse {
    pub status: String,
    pub job_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum RunJobError {
    #[error("Job not found")]
    JobNotFound,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

impl From<RunJobError> for AppError {
    fn from(err: RunJobError) -> Self {
        match err {
            RunJobError::JobNotFound => AppError::NotFound(err.to_string()),
            RunJobError::Store(e) => AppError::Store(e),
            RunJobError::Dispatch(e) => AppError::Dispatch(e),
        }
    }
}

/// A dispatch failure leaves the job `running`
#[tracing::instrument(skip(store, dispatcher))]
pub async fn handle(
    store: &dyn EntityStore,
    dispatcher: &dyn JobDispatcher,
    job_id: Uuid,
) -> Result<RunJobResponse, RunJobError> {
    if store.get_job(job_id).await?.is_none() {
        return Err(RunJobError::JobNotFound);
    }

    if !store.set_job_status(job_id, JobStatus::Running).await? {
        return Err(RunJobError::JobNotFound);
    }

    dispatcher.enqueue(job_id).await?;

    tracing::info!("Job dispatched");
    Ok(RunJobResponse {
        status: "started".to_string(),
        job_id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::features::shared::test_helpers::RecordingDispatcher;
    use crate::models::NewJob;
    use etl_common::types::PIPELINE_RUN;

    async fn queued_job(store: &MemoryStore) -> Uuid {
        store
            .insert_job(NewJob {
                dataset_id: Uuid::new_v4(),
                version_id: Uuid::new_v4(),
                job_type: PIPELINE_RUN.to_string(),
            })
            .await
            .unwrap()
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_run_marks_running_and_dispatches() {
        let store = MemoryStore::new();
        let dispatcher = RecordingDispatcher::default();
        let job_id = queued_job(&store).await;

        let response = handle(&store, &dispatcher, job_id).await.unwrap();
        assert_eq!(
            response,
            RunJobResponse {
                status: "started".to_string(),
                job_id
            }
        );
        assert_eq!(store.get_job(job_id).await.unwrap().unwrap().status, JobStatus::Running);
        assert_eq!(*dispatcher.enqueued.lock().unwrap(), vec![job_id]);
    }

    #[tokio::test]
    async fn test_run_missing_job() {
        let store = MemoryStore::new();
        let dispatcher = RecordingDispatcher::default();

        let err = handle(&store, &dispatcher, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RunJobError::JobNotFound));
        assert!(dispatcher.enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_leaves_job_running() {
        let store = MemoryStore::new();
        let dispatcher = RecordingDispatcher {
            fail: true,
            ..Default::default()
        };
        let job_id = queued_job(&store).await;

        let err = handle(&store, &dispatcher, job_id).await.unwrap_err();
        assert!(matches!(err, RunJobError::Dispatch(_)));
        assert_eq!(store.get_job(job_id).await.unwrap().unwrap().status, JobStatus::Running);
    }
}
