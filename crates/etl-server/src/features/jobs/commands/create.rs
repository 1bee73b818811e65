//! Create job command

use etl_common::types::PIPELINE_RUN;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::features::shared::{validate_required, ValidationError};
use crate::models::{Job, NewJob};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobCommand {
    #[serde(rename = "type", default = "default_job_type")]
    pub job_type: String,
}

fn default_job_type() -> String {
    PIPELINE_RUN.to_string()
}

impl Default for CreateJobCommand {
    fn default() -> Self {
        Self {
            job_type: default_job_type(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateJobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Version not found")]
    VersionNotFound,

    #[error("Failed to create job")]
    NotCreated,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<CreateJobError> for AppError {
    fn from(err: CreateJobError) -> Self {
        match err {
            CreateJobError::Validation(e) => e.into(),
            CreateJobError::VersionNotFound => AppError::NotFound(err.to_string()),
            CreateJobError::NotCreated => AppError::Validation(err.to_string()),
            CreateJobError::Store(e) => AppError::Store(e),
        }
    }
}

/// Insert a `queued` job for the version
#[tracing::instrument(skip(store, command), fields(job_type = %command.job_type))]
pub async fn handle(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
    command: CreateJobCommand,
) -> Result<Job, CreateJobError> {
    validate_required("type", &command.job_type)?;

    if store.get_version(dataset_id, version_id).await?.is_none() {
        return Err(CreateJobError::VersionNotFound);
    }

    let job = store
        .insert_job(NewJob {
            dataset_id,
            version_id,
            job_type: command.job_type,
        })
        .await?
        .ok_or(CreateJobError::NotCreated)?;

    tracing::info!(job_id = %job.id, "Job created");
    Ok(job)
}
