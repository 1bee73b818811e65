//! Add source command

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::features::shared::{validate_required, ValidationError};
use crate::models::{empty_object, DataSource, NewSource};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSourceCommand {
    /// Connector kind, e.g. `s3`, `http`, `upload`
    pub source_type: String,
    pub source_uri: String,
    /// Connector-specific settings
    #[serde(default = "empty_object")]
    pub options: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AddSourceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Version not found")]
    VersionNotFound,

    #[error("Failed to add source")]
    NotCreated,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<AddSourceError> for AppError {
    fn from(err: AddSourceError) -> Self {
        match err {
            AddSourceError::Validation(e) => e.into(),
            AddSourceError::VersionNotFound => AppError::NotFound(err.to_string()),
            AddSourceError::NotCreated => AppError::Validation(err.to_string()),
            AddSourceError::Store(e) => AppError::Store(e),
        }
    }
}

impl AddSourceCommand {
    pub fn validate(&self) -> Result<(), AddSourceError> {
        validate_required("source_type", &self.source_type)?;
        validate_required("source_uri", &self.source_uri)?;
        Ok(())
    }
}

#[tracing::instrument(skip(store, command), fields(source_type = %command.source_type))]
pub async fn handle(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
    command: AddSourceCommand,
) -> Result<DataSource, AddSourceError> {
    command.validate()?;

    if store.get_version(dataset_id, version_id).await?.is_none() {
        return Err(AddSourceError::VersionNotFound);
    }

    let source = store
        .insert_source(NewSource {
            dataset_id,
            version_id,
            source_type: command.source_type,
            source_uri: command.source_uri,
            options: command.options,
        })
        .await?
        .ok_or(AddSourceError::NotCreated)?;

    tracing::info!(source_id = %source.id, "Source added");
    Ok(source)
}
