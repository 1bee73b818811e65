use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::models::Job;

#[derive(Debug, thiserror::Error)]
pub enum GetJobError {
    #[error("Job not found")]
    NotFound,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<GetJobError> for AppError {
    fn from(err: GetJobError) -> Self {
        match err {
            GetJobError::NotFound => AppError::NotFound(err.to_string()),
            GetJobError::Store(e) => AppError::Store(e),
        }
    }
}

/// Jobs of a version, newest first
#[tracing::instrument(skip(store))]
pub async fn list(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
) -> Result<Vec<Job>, StoreError> {
    store.list_jobs(dataset_id, version_id).await
}

#[tracing::instrument(skip(store))]
pub async fn get(store: &dyn EntityStore, job_id: Uuid) -> Result<Job, GetJobError> {
    store.get_job(job_id).await?.ok_or(GetJobError::NotFound)
}
