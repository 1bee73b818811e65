//! PostgreSQL entity store
//!
//! Each call opens a short transaction. On a user-scoped handle the
//! transaction first publishes the caller's claims and switches to the
//! configured end-user role, so the row-level policies in the schema decide
//! what the statement can see. The unscoped handle keeps the pool's own
//! (service) role and is what the pipeline worker uses.

use async_trait::async_trait;
use etl_common::types::{AssetStatus, JobStatus, VersionStatus};
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{is_unique_violation, EntityStore, StoreError, StoreResult};
use crate::auth::Identity;
use crate::models::{
    Asset, DataSource, Dataset, DatasetVersion, Job, Label, NewAsset, NewDataset, NewJob,
    NewLabel, NewSource, NewVersion,
};

const DATASET_COLUMNS: &str = "id, name, description, data_types, owner_id, created_at";
const VERSION_COLUMNS: &str = "id, dataset_id, version, target_output, status, created_at";
const SOURCE_COLUMNS: &str =
    "id, dataset_id, version_id, source_type, source_uri, options, created_at";
const ASSET_COLUMNS: &str =
    "id, dataset_id, version_id, uri, media_type, metadata, status, created_at";
const LABEL_COLUMNS: &str = "id, asset_id, label_type, payload, annotator, confidence, created_at";
const JOB_COLUMNS: &str =
    "id, dataset_id, version_id, type, status, logs, lease_token, created_at, updated_at";

/// Attempts at assigning the next version number before reporting a conflict
const VERSION_INSERT_ATTEMPTS: u32 = 3;

/// Authorization context applied to a scoped handle
#[derive(Debug)]
struct Scope {
    claims: String,
    role: String,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    user_role: Arc<str>,
    scope: Option<Arc<Scope>>,
}

impl PgStore {
    /// Service-level handle; `user_role` is the role scoped handles switch to
    pub fn new(pool: PgPool, user_role: &str) -> Self {
        Self {
            pool,
            user_role: Arc::from(user_role),
            scope: None,
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;

        if let Some(scope) = &self.scope {
            sqlx::query(
                "SELECT set_config('request.jwt.claims', $1, true), set_config('role', $2, true)",
            )
            .bind(&scope.claims)
            .bind(&scope.role)
            .execute(&mut *tx)
            .await?;
        }

        Ok(tx)
    }
}

#[async_trait]
impl EntityStore for PgStore {
    fn scoped(&self, identity: &Identity) -> Arc<dyn EntityStore> {
        let claims = json!({
            "sub": identity.id,
            "role": identity.role,
            "email": identity.email,
        });

        Arc::new(Self {
            pool: self.pool.clone(),
            user_role: self.user_role.clone(),
            scope: Some(Arc::new(Scope {
                claims: claims.to_string(),
                role: self.user_role.to_string(),
            })),
        })
    }

    // ========================================================================
    // Datasets
    // ========================================================================

    #[instrument(skip(self, new), fields(name = %new.name))]
    async fn insert_dataset(&self, new: NewDataset) -> StoreResult<Option<Dataset>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, Dataset>(&format!(
            "INSERT INTO datasets (name, description, data_types, owner_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {DATASET_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.data_types)
        .bind(new.owner_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_datasets(&self) -> StoreResult<Vec<Dataset>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, Dataset>(&format!(
            "SELECT {DATASET_COLUMNS} FROM datasets ORDER BY created_at DESC"
        ))
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn get_dataset(&self, dataset_id: Uuid) -> StoreResult<Option<Dataset>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, Dataset>(&format!(
            "SELECT {DATASET_COLUMNS} FROM datasets WHERE id = $1"
        ))
        .bind(dataset_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    // ========================================================================
    // Versions
    // ========================================================================

    #[instrument(skip(self, new), fields(dataset_id = %new.dataset_id))]
    async fn insert_next_version(&self, new: NewVersion) -> StoreResult<Option<DatasetVersion>> {
        let sql = format!(
            "INSERT INTO dataset_versions (dataset_id, version, target_output, status)
             SELECT $1, COALESCE(MAX(version), 0) + 1, $2, $3
             FROM dataset_versions WHERE dataset_id = $1
             RETURNING {VERSION_COLUMNS}"
        );

        for attempt in 1..=VERSION_INSERT_ATTEMPTS {
            let mut tx = self.begin().await?;
            let result = sqlx::query_as::<_, DatasetVersion>(&sql)
                .bind(new.dataset_id)
                .bind(&new.target_output)
                .bind(VersionStatus::Draft.as_str())
                .fetch_optional(&mut *tx)
                .await;

            match result {
                Ok(row) => {
                    tx.commit().await?;
                    return Ok(row);
                },
                Err(e) if is_unique_violation(&e) => {
                    debug!(attempt, "Version number taken concurrently, retrying");
                },
                Err(e) => return Err(e.into()),
            }
        }

        warn!("Gave up assigning a version number");
        Err(StoreError::Conflict(format!(
            "Could not assign a version number for dataset {} after {} attempts",
            new.dataset_id, VERSION_INSERT_ATTEMPTS
        )))
    }

    async fn list_versions(&self, dataset_id: Uuid) -> StoreResult<Vec<DatasetVersion>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, DatasetVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM dataset_versions
             WHERE dataset_id = $1 ORDER BY version DESC"
        ))
        .bind(dataset_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn get_version(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
    ) -> StoreResult<Option<DatasetVersion>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, DatasetVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM dataset_versions WHERE id = $1 AND dataset_id = $2"
        ))
        .bind(version_id)
        .bind(dataset_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn set_version_status(
        &self,
        version_id: Uuid,
        status: VersionStatus,
    ) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        sqlx::query("UPDATE dataset_versions SET status = $2 WHERE id = $1")
            .bind(version_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Sources
    // ========================================================================

    async fn insert_source(&self, new: NewSource) -> StoreResult<Option<DataSource>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, DataSource>(&format!(
            "INSERT INTO data_sources (dataset_id, version_id, source_type, source_uri, options)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SOURCE_COLUMNS}"
        ))
        .bind(new.dataset_id)
        .bind(new.version_id)
        .bind(&new.source_type)
        .bind(&new.source_uri)
        .bind(&new.options)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_sources(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
    ) -> StoreResult<Vec<DataSource>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, DataSource>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM data_sources
             WHERE dataset_id = $1 AND version_id = $2 ORDER BY created_at DESC"
        ))
        .bind(dataset_id)
        .bind(version_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows)
    }

    // ========================================================================
    // Assets
    // ========================================================================

    #[instrument(skip(self, assets), fields(count = assets.len()))]
    async fn insert_assets(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
        assets: Vec<NewAsset>,
    ) -> StoreResult<Vec<Asset>> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO assets (dataset_id, version_id, uri, media_type, metadata, status) ",
        );
        builder.push_values(assets, |mut b, asset| {
            b.push_bind(dataset_id)
                .push_bind(version_id)
                .push_bind(asset.uri)
                .push_bind(asset.media_type)
                .push_bind(asset.metadata)
                .push_bind(AssetStatus::Registered.as_str());
        });
        builder.push(" RETURNING ");
        builder.push(ASSET_COLUMNS);

        let mut tx = self.begin().await?;
        let rows = builder.build_query_as::<Asset>().fetch_all(&mut *tx).await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn list_assets(&self, dataset_id: Uuid, version_id: Uuid) -> StoreResult<Vec<Asset>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets
             WHERE dataset_id = $1 AND version_id = $2 ORDER BY created_at DESC"
        ))
        .bind(dataset_id)
        .bind(version_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn find_asset(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
        asset_id: Uuid,
    ) -> StoreResult<Option<Asset>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets
             WHERE id = $1 AND dataset_id = $2 AND version_id = $3"
        ))
        .bind(asset_id)
        .bind(dataset_id)
        .bind(version_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn update_asset(
        &self,
        asset_id: Uuid,
        metadata: Value,
        status: AssetStatus,
    ) -> StoreResult<()> {
        let mut tx = self.begin().await?;
        sqlx::query("UPDATE assets SET metadata = $2, status = $3 WHERE id = $1")
            .bind(asset_id)
            .bind(metadata)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Labels
    // ========================================================================

    async fn insert_label(&self, new: NewLabel) -> StoreResult<Option<Label>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, Label>(&format!(
            "INSERT INTO labels (asset_id, label_type, payload, annotator, confidence)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {LABEL_COLUMNS}"
        ))
        .bind(new.asset_id)
        .bind(&new.label_type)
        .bind(&new.payload)
        .bind(&new.annotator)
        .bind(new.confidence)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    #[instrument(skip(self, labels), fields(count = labels.len()))]
    async fn insert_labels(&self, labels: Vec<NewLabel>) -> StoreResult<Vec<Label>> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO labels (asset_id, label_type, payload, annotator, confidence) ",
        );
        builder.push_values(labels, |mut b, label| {
            b.push_bind(label.asset_id)
                .push_bind(label.label_type)
                .push_bind(label.payload)
                .push_bind(label.annotator)
                .push_bind(label.confidence);
        });
        builder.push(" RETURNING ");
        builder.push(LABEL_COLUMNS);

        let mut tx = self.begin().await?;
        let rows = builder.build_query_as::<Label>().fetch_all(&mut *tx).await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn list_labels_for_assets(&self, asset_ids: &[Uuid]) -> StoreResult<Vec<Label>> {
        if asset_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, Label>(&format!(
            "SELECT {LABEL_COLUMNS} FROM labels WHERE asset_id = ANY($1) ORDER BY created_at"
        ))
        .bind(asset_ids)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows)
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    async fn insert_job(&self, new: NewJob) -> StoreResult<Option<Job>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, Job>(&format!(
            "INSERT INTO jobs (dataset_id, version_id, type, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(new.dataset_id)
        .bind(new.version_id)
        .bind(&new.job_type)
        .bind(JobStatus::Queued.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_jobs(&self, dataset_id: Uuid, version_id: Uuid) -> StoreResult<Vec<Job>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE dataset_id = $1 AND version_id = $2 ORDER BY created_at DESC"
        ))
        .bind(dataset_id)
        .bind(version_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn get_job(&self, job_id: Uuid) -> StoreResult<Option<Job>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn set_job_status(&self, job_id: Uuid, status: JobStatus) -> StoreResult<bool> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("UPDATE jobs SET status = $2, updated_at = now() WHERE id = $1")
            .bind(job_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn claim_job(&self, job_id: Uuid, lease_token: Uuid) -> StoreResult<Option<Job>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, Job>(&format!(
            "UPDATE jobs SET status = $3, lease_token = $2, updated_at = now()
             WHERE id = $1
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(job_id)
        .bind(lease_token)
        .bind(JobStatus::Running.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    #[instrument(skip(self, logs))]
    async fn finish_job(
        &self,
        job_id: Uuid,
        lease_token: Uuid,
        status: JobStatus,
        logs: &str,
    ) -> StoreResult<bool> {
        let mut tx = self.begin().await?;
        let result = sqlx::query(
            "UPDATE jobs SET status = $3, logs = $4, updated_at = now()
             WHERE id = $1 AND lease_token = $2",
        )
        .bind(job_id)
        .bind(lease_token)
        .bind(status.as_str())
        .bind(logs)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scoped_handle_is_distinct_from_service_handle() {
        let pool = PgPool::connect_lazy("postgresql://localhost/etl_test").unwrap();
        let store = PgStore::new(pool, "authenticated");
        assert!(!store.is_scoped());

        // Scoping never touches the database.
        let _scoped = store.scoped(&Identity::new(Uuid::new_v4()));
        assert!(!store.is_scoped());
    }
}
