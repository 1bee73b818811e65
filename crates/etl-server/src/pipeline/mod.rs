//! Pipeline worker
//!
//! Runs one dataset version through the enrichment pipeline:
//!
//! 1. **Claim**: mark the job `running` under a fresh lease token
//! 2. **Ingest**: one placeholder asset per declared source ([`ingest`])
//! 3. **Process**: per-asset metadata extraction by content kind ([`content`])
//! 4. **Export**: newline-delimited JSON manifest to the object store ([`manifest`])
//! 5. **Finish**: version `processed`, job `completed` with the per-asset log
//!
//! A failing asset is marked `failed` and logged; the run carries on. Store and
//! object store failures abort the run and leave the job `running`.

pub mod content;
pub mod image;
pub mod ingest;
pub mod manifest;
pub mod resource;
pub mod tabular;
pub mod text;

use etl_common::types::{AssetStatus, ContentKind, JobStatus, VersionStatus};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::models::{Asset, Job};
use crate::storage::ObjectStore;

pub use content::{extract_metadata, AssetProcessingError};
pub use resource::ResourceReader;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunReport {
    pub job_id: Uuid,
    pub dataset_id: Uuid,
    pub version_id: Uuid,
    /// Placeholder assets created from sources
    pub ingested: usize,
    pub processed: usize,
    pub failed: usize,
    /// Assets already `processed` or `failed` before this run
    pub skipped: usize,
    pub manifest_key: String,
    pub logs: Vec<String>,
    /// False when another run took over the job lease before this one finished
    pub outcome_recorded: bool,
}

/// Consumer side of dispatched jobs
///
/// Holds an unscoped (service-level) store handle: the worker acts on behalf
/// of the job, not of the user who started it.
pub struct PipelineWorker {
    store: Arc<dyn EntityStore>,
    objects: Arc<dyn ObjectStore>,
    resources: ResourceReader,
}

impl PipelineWorker {
    pub fn new(
        store: Arc<dyn EntityStore>,
        objects: Arc<dyn ObjectStore>,
        resources: ResourceReader,
    ) -> Self {
        Self {
            store,
            objects,
            resources,
        }
    }

    /// Run the pipeline for `job_id`
    ///
    /// Returns `Ok(None)` when the job row does not exist.
    #[tracing::instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run(&self, job_id: Uuid) -> Result<Option<RunReport>, PipelineError> {
        let lease = Uuid::new_v4();
        let Some(job) = self.store.claim_job(job_id, lease).await? else {
            warn!("Job not found, skipping");
            return Ok(None);
        };

        info!(
            dataset_id = %job.dataset_id,
            version_id = %job.version_id,
            job_type = %job.job_type,
            "Pipeline run started"
        );

        let ingested = self.ingest(&job).await?;

        let assets = self.store.list_assets(job.dataset_id, job.version_id).await?;
        let mut logs = Vec::new();
        let (mut processed, mut failed, mut skipped) = (0, 0, 0);

        for asset in &assets {
            if asset.status.is_terminal() {
                skipped += 1;
                continue;
            }

            match self.process_asset(asset).await? {
                Ok(()) => {
                    processed += 1;
                    logs.push(format!("Processed {}", asset.id));
                },
                Err(e) => {
                    failed += 1;
                    logs.push(format!("Failed {}: {}", asset.id, e));
                },
            }
        }

        let manifest_key = self.export_manifest(&job).await?;

        self.store
            .set_version_status(job.version_id, VersionStatus::Processed)
            .await?;

        let outcome_recorded = self
            .store
            .finish_job(job.id, lease, JobStatus::Completed, &logs.join("\n"))
            .await?;
        if !outcome_recorded {
            warn!("Job lease was taken over by another run, outcome not recorded");
        }

        info!(
            ingested,
            processed,
            failed,
            skipped,
            manifest_key = %manifest_key,
            "Pipeline run finished"
        );

        Ok(Some(RunReport {
            job_id: job.id,
            dataset_id: job.dataset_id,
            version_id: job.version_id,
            ingested,
            processed,
            failed,
            skipped,
            manifest_key,
            logs,
            outcome_recorded,
        }))
    }

    async fn ingest(&self, job: &Job) -> Result<usize, PipelineError> {
        let sources = self.store.list_sources(job.dataset_id, job.version_id).await?;
        if sources.is_empty() {
            return Ok(0);
        }

        let placeholders = sources.iter().map(ingest::placeholder_asset).collect();
        let created = self
            .store
            .insert_assets(job.dataset_id, job.version_id, placeholders)
            .await?;

        debug!(count = created.len(), "Placeholder assets ingested");
        Ok(created.len())
    }

    /// Enrich one asset and record its outcome
    ///
    /// The inner result is the per-asset outcome; the outer one carries store
    /// failures that abort the run.
    async fn process_asset(
        &self,
        asset: &Asset,
    ) -> Result<Result<(), AssetProcessingError>, PipelineError> {
        let kind = ContentKind::from_media_type(&asset.media_type);

        match extract_metadata(kind, asset, &self.resources).await {
            Ok(patch) => {
                let mut metadata = asset.metadata_map();
                metadata.extend(patch);
                self.store
                    .update_asset(asset.id, Value::Object(metadata), AssetStatus::Processed)
                    .await?;
                debug!(asset_id = %asset.id, kind = %kind, "Asset processed");
                Ok(Ok(()))
            },
            Err(e) => {
                self.store
                    .update_asset(asset.id, asset.metadata.clone(), AssetStatus::Failed)
                    .await?;
                warn!(asset_id = %asset.id, kind = %kind, error = %e, "Asset processing failed");
                Ok(Err(e))
            },
        }
    }

    async fn export_manifest(&self, job: &Job) -> Result<String, PipelineError> {
        let assets = self.store.list_assets(job.dataset_id, job.version_id).await?;
        let asset_ids: Vec<Uuid> = assets.iter().map(|asset| asset.id).collect();
        let labels = if asset_ids.is_empty() {
            Vec::new()
        } else {
            self.store.list_labels_for_assets(&asset_ids).await?
        };

        let body = manifest::render(&assets, labels)?;
        let key = manifest::manifest_key(job.dataset_id, job.version_id);
        let upload = self
            .objects
            .put(&key, body.into_bytes(), manifest::MANIFEST_CONTENT_TYPE)
            .await?;

        debug!(key = %upload.key, size = upload.size, checksum = %upload.checksum, "Manifest uploaded");
        Ok(key)
    }
}
