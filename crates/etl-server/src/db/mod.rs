//! Entity store
//!
//! [`EntityStore`] is the single seam between the API/worker and the relational
//! store. Two implementations share the same semantics:
//!
//! - [`PgStore`]: PostgreSQL via SQLx; user-scoped handles run under row-level
//!   security
//! - [`MemoryStore`]: in-process tables for tests and local development
//!
//! Every method is one statement that commits on its own. Listings are newest
//! first by `created_at`, except versions which are ordered by `version`
//! descending.

use async_trait::async_trait;
use etl_common::types::{AssetStatus, JobStatus, VersionStatus};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Identity;
use crate::config::DatabaseConfig;
use crate::models::{
    Asset, DataSource, Dataset, DatasetVersion, Job, Label, NewAsset, NewDataset, NewJob,
    NewLabel, NewSource, NewVersion,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Entity store failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Unique constraint still violated after retrying
    #[error("{0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row operations used by the API surface and the pipeline worker
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Handle whose statements run under `identity`'s authorization context
    fn scoped(&self, identity: &Identity) -> Arc<dyn EntityStore>;

    // Datasets
    async fn insert_dataset(&self, new: NewDataset) -> StoreResult<Option<Dataset>>;
    async fn list_datasets(&self) -> StoreResult<Vec<Dataset>>;
    async fn get_dataset(&self, dataset_id: Uuid) -> StoreResult<Option<Dataset>>;

    // Versions
    /// Insert a draft version numbered one past the dataset's current maximum
    async fn insert_next_version(&self, new: NewVersion) -> StoreResult<Option<DatasetVersion>>;
    async fn list_versions(&self, dataset_id: Uuid) -> StoreResult<Vec<DatasetVersion>>;
    async fn get_version(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
    ) -> StoreResult<Option<DatasetVersion>>;
    async fn set_version_status(&self, version_id: Uuid, status: VersionStatus)
        -> StoreResult<()>;

    // Sources
    async fn insert_source(&self, new: NewSource) -> StoreResult<Option<DataSource>>;
    async fn list_sources(&self, dataset_id: Uuid, version_id: Uuid)
        -> StoreResult<Vec<DataSource>>;

    // Assets
    /// Insert all descriptors as `registered` assets of the version
    async fn insert_assets(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
        assets: Vec<NewAsset>,
    ) -> StoreResult<Vec<Asset>>;
    async fn list_assets(&self, dataset_id: Uuid, version_id: Uuid) -> StoreResult<Vec<Asset>>;
    async fn find_asset(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
        asset_id: Uuid,
    ) -> StoreResult<Option<Asset>>;
    async fn update_asset(
        &self,
        asset_id: Uuid,
        metadata: Value,
        status: AssetStatus,
    ) -> StoreResult<()>;

    // Labels
    async fn insert_label(&self, new: NewLabel) -> StoreResult<Option<Label>>;
    async fn insert_labels(&self, labels: Vec<NewLabel>) -> StoreResult<Vec<Label>>;
    async fn list_labels_for_assets(&self, asset_ids: &[Uuid]) -> StoreResult<Vec<Label>>;

    // Jobs
    async fn insert_job(&self, new: NewJob) -> StoreResult<Option<Job>>;
    async fn list_jobs(&self, dataset_id: Uuid, version_id: Uuid) -> StoreResult<Vec<Job>>;
    async fn get_job(&self, job_id: Uuid) -> StoreResult<Option<Job>>;
    /// Returns false when the job does not exist
    async fn set_job_status(&self, job_id: Uuid, status: JobStatus) -> StoreResult<bool>;
    /// Mark the job `running` and hand its lease to `lease_token`
    async fn claim_job(&self, job_id: Uuid, lease_token: Uuid) -> StoreResult<Option<Job>>;
    /// Record the outcome if `lease_token` still holds the lease
    async fn finish_job(
        &self,
        job_id: Uuid,
        lease_token: Uuid,
        status: JobStatus,
        logs: &str,
    ) -> StoreResult<bool>;
}

pub async fn create_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> StoreResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(StoreError::from)
}

/// Check if a SQLx error is a unique constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_conflict_message() {
        let err = StoreError::Conflict("version 3 already exists".to_string());
        assert_eq!(err.to_string(), "version 3 already exists");
    }
}
