//! In-process entity store
//!
//! Rows live in insertion-ordered vectors behind one lock, so newest-first
//! listings are reverse iteration. Scoping is a no-op.

use async_trait::async_trait;
use chrono::Utc;
use etl_common::types::{AssetStatus, JobStatus, VersionStatus};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EntityStore, StoreResult};
use crate::auth::Identity;
use crate::models::{
    Asset, DataSource, Dataset, DatasetVersion, Job, Label, NewAsset, NewDataset, NewJob,
    NewLabel, NewSource, NewVersion,
};

#[derive(Debug, Default)]
struct Tables {
    datasets: Vec<Dataset>,
    versions: Vec<DatasetVersion>,
    sources: Vec<DataSource>,
    assets: Vec<Asset>,
    labels: Vec<Label>,
    jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn scoped(&self, _identity: &Identity) -> Arc<dyn EntityStore> {
        Arc::new(self.clone())
    }

    async fn insert_dataset(&self, new: NewDataset) -> StoreResult<Option<Dataset>> {
        let dataset = Dataset {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            data_types: new.data_types,
            owner_id: new.owner_id,
            created_at: Utc::now(),
        };
        self.tables.write().await.datasets.push(dataset.clone());
        Ok(Some(dataset))
    }

    async fn list_datasets(&self) -> StoreResult<Vec<Dataset>> {
        let tables = self.tables.read().await;
        Ok(tables.datasets.iter().rev().cloned().collect())
    }

    async fn get_dataset(&self, dataset_id: Uuid) -> StoreResult<Option<Dataset>> {
        let tables = self.tables.read().await;
        Ok(tables.datasets.iter().find(|d| d.id == dataset_id).cloned())
    }

    async fn insert_next_version(&self, new: NewVersion) -> StoreResult<Option<DatasetVersion>> {
        let mut tables = self.tables.write().await;
        let next = tables
            .versions
            .iter()
            .filter(|v| v.dataset_id == new.dataset_id)
            .map(|v| v.version)
            .max()
            .unwrap_or(0)
            + 1;

        let version = DatasetVersion {
            id: Uuid::new_v4(),
            dataset_id: new.dataset_id,
            version: next,
            target_output: new.target_output,
            status: VersionStatus::Draft,
            created_at: Utc::now(),
        };
        tables.versions.push(version.clone());
        Ok(Some(version))
    }

    async fn list_versions(&self, dataset_id: Uuid) -> StoreResult<Vec<DatasetVersion>> {
        let tables = self.tables.read().await;
        let mut versions: Vec<DatasetVersion> = tables
            .versions
            .iter()
            .filter(|v| v.dataset_id == dataset_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn get_version(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
    ) -> StoreResult<Option<DatasetVersion>> {
        let tables = self.tables.read().await;
        Ok(tables
            .versions
            .iter()
            .find(|v| v.id == version_id && v.dataset_id == dataset_id)
            .cloned())
    }

    async fn set_version_status(
        &self,
        version_id: Uuid,
        status: VersionStatus,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(version) = tables.versions.iter_mut().find(|v| v.id == version_id) {
            version.status = status;
        }
        Ok(())
    }

    async fn insert_source(&self, new: NewSource) -> StoreResult<Option<DataSource>> {
        let source = DataSource {
            id: Uuid::new_v4(),
            dataset_id: new.dataset_id,
            version_id: new.version_id,
            source_type: new.source_type,
            source_uri: new.source_uri,
            options: new.options,
            created_at: Utc::now(),
        };
        self.tables.write().await.sources.push(source.clone());
        Ok(Some(source))
    }

    async fn list_sources(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
    ) -> StoreResult<Vec<DataSource>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sources
            .iter()
            .rev()
            .filter(|s| s.dataset_id == dataset_id && s.version_id == version_id)
            .cloned()
            .collect())
    }

    async fn insert_assets(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
        assets: Vec<NewAsset>,
    ) -> StoreResult<Vec<Asset>> {
        let now = Utc::now();
        let created: Vec<Asset> = assets
            .into_iter()
            .map(|asset| Asset {
                id: Uuid::new_v4(),
                dataset_id,
                version_id,
                uri: asset.uri,
                media_type: asset.media_type,
                metadata: asset.metadata,
                status: AssetStatus::Registered,
                created_at: now,
            })
            .collect();

        self.tables.write().await.assets.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_assets(&self, dataset_id: Uuid, version_id: Uuid) -> StoreResult<Vec<Asset>> {
        let tables = self.tables.read().await;
        Ok(tables
            .assets
            .iter()
            .rev()
            .filter(|a| a.dataset_id == dataset_id && a.version_id == version_id)
            .cloned()
            .collect())
    }

    async fn find_asset(
        &self,
        dataset_id: Uuid,
        version_id: Uuid,
        asset_id: Uuid,
    ) -> StoreResult<Option<Asset>> {
        let tables = self.tables.read().await;
        Ok(tables
            .assets
            .iter()
            .find(|a| a.id == asset_id && a.dataset_id == dataset_id && a.version_id == version_id)
            .cloned())
    }

    async fn update_asset(
        &self,
        asset_id: Uuid,
        metadata: Value,
        status: AssetStatus,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(asset) = tables.assets.iter_mut().find(|a| a.id == asset_id) {
            asset.metadata = metadata;
            asset.status = status;
        }
        Ok(())
    }

    async fn insert_label(&self, new: NewLabel) -> StoreResult<Option<Label>> {
        let mut labels = self.insert_labels(vec![new]).await?;
        Ok(labels.pop())
    }

    async fn insert_labels(&self, labels: Vec<NewLabel>) -> StoreResult<Vec<Label>> {
        let now = Utc::now();
        let created: Vec<Label> = labels
            .into_iter()
            .map(|label| Label {
                id: Uuid::new_v4(),
                asset_id: label.asset_id,
                label_type: label.label_type,
                payload: label.payload,
                annotator: label.annotator,
                confidence: label.confidence,
                created_at: now,
            })
            .collect();

        self.tables.write().await.labels.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_labels_for_assets(&self, asset_ids: &[Uuid]) -> StoreResult<Vec<Label>> {
        let tables = self.tables.read().await;
        Ok(tables
            .labels
            .iter()
            .filter(|l| asset_ids.contains(&l.asset_id))
            .cloned()
            .collect())
    }

    async fn insert_job(&self, new: NewJob) -> StoreResult<Option<Job>> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            dataset_id: new.dataset_id,
            version_id: new.version_id,
            job_type: new.job_type,
            status: JobStatus::Queued,
            logs: None,
            lease_token: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.jobs.push(job.clone());
        Ok(Some(job))
    }

    async fn list_jobs(&self, dataset_id: Uuid, version_id: Uuid) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .iter()
            .rev()
            .filter(|j| j.dataset_id == dataset_id && j.version_id == version_id)
            .cloned()
            .collect())
    }

    async fn get_job(&self, job_id: Uuid) -> StoreResult<Option<Job>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn set_job_status(&self, job_id: Uuid, status: JobStatus) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.jobs.iter_mut().find(|j| j.id == job_id) {
            Some(job) => {
                job.status = status;
                job.updated_at = Utc::now();
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn claim_job(&self, job_id: Uuid, lease_token: Uuid) -> StoreResult<Option<Job>> {
        let mut tables = self.tables.write().await;
        Ok(tables.jobs.iter_mut().find(|j| j.id == job_id).map(|job| {
            job.status = JobStatus::Running;
            job.lease_token = Some(lease_token);
            job.updated_at = Utc::now();
            job.clone()
        }))
    }

    async fn finish_job(
        &self,
        job_id: Uuid,
        lease_token: Uuid,
        status: JobStatus,
        logs: &str,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.lease_token == Some(lease_token))
        {
            Some(job) => {
                job.status = status;
                job.logs = Some(logs.to_string());
                job.updated_at = Utc::now();
                Ok(true)
            },
            None => Ok(false),
        }
    }
}
