//! Create version command
//!
//! Versions are numbered per dataset, starting at 1. The store assigns the
//! number atomically, so concurrent creations never share one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::models::{empty_object, DatasetVersion, NewVersion};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVersionCommand {
    /// Free-form description of what the version should produce
    #[serde(default = "empty_object")]
    pub target_output: Value,
}

impl Default for CreateVersionCommand {
    fn default() -> Self {
        Self {
            target_output: empty_object(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateVersionError {
    #[error("Dataset not found")]
    DatasetNotFound,

    #[error("Failed to create version")]
    NotCreated,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<CreateVersionError> for AppError {
    fn from(err: CreateVersionError) -> Self {
        match err {
            CreateVersionError::DatasetNotFound => AppError::NotFound(err.to_string()),
            CreateVersionError::NotCreated => AppError::Validation(err.to_string()),
            CreateVersionError::Store(e) => AppError::Store(e),
        }
    }
}

#[tracing::instrument(skip(store, command))]
pub async fn handle(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    command: CreateVersionCommand,
) -> Result<DatasetVersion, CreateVersionError> {
    if store.get_dataset(dataset_id).await?.is_none() {
        return Err(CreateVersionError::DatasetNotFound);
    }

    let version = store
        .insert_next_version(NewVersion {
            dataset_id,
            target_output: command.target_output,
        })
        .await?
        .ok_or(CreateVersionError::NotCreated)?;

    tracing::info!(version_id = %version.id, version = version.version, "Version created");
    Ok(version)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewDataset;
    use etl_common::types::VersionStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_versions_count_up_from_one() {
        let store = MemoryStore::new();
        let dataset = store
            .insert_dataset(NewDataset {
                name: "d".to_string(),
                description: None,
                data_types: vec![],
                owner_id: Uuid::new_v4(),
            })
            .await
            .unwrap()
            .unwrap();

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let version = handle(&store, dataset.id, CreateVersionCommand::default())
                .await
                .unwrap();
            assert_eq!(version.status, VersionStatus::Draft);
            numbers.push(version.version);
        }
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_not_found() {
        let store = MemoryStore::new();
        let err = handle(&store, Uuid::new_v4(), CreateVersionCommand::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CreateVersionError::DatasetNotFound));
    }

    #[test]
    fn test_target_output_defaults_to_empty_object() {
        let command: CreateVersionCommand = serde_json::from_value(json!({})).unwrap();
        assert_eq!(command.target_output, json!({}));
    }
}
