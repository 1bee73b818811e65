//! Create dataset command

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::features::shared::{validate_required, ValidationError};
use crate::models::{Dataset, NewDataset};

/// Command to create a new dataset owned by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetCommand {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Kinds of data the dataset holds (`text`, `image`, `tabular`, ...)
    pub data_types: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateDatasetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to create dataset")]
    NotCreated,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<CreateDatasetError> for AppError {
    fn from(err: CreateDatasetError) -> Self {
        match err {
            CreateDatasetError::Validation(e) => e.into(),
            CreateDatasetError::NotCreated => AppError::Validation(err.to_string()),
            CreateDatasetError::Store(e) => AppError::Store(e),
        }
    }
}

impl CreateDatasetCommand {
    pub fn validate(&self) -> Result<(), CreateDatasetError> {
        validate_required("name", &self.name)?;
        Ok(())
    }
}

#[tracing::instrument(skip(store, command), fields(owner_id = %owner_id, name = %command.name))]
pub async fn handle(
    store: &dyn EntityStore,
    owner_id: Uuid,
    command: CreateDatasetCommand,
) -> Result<Dataset, CreateDatasetError> {
    command.validate()?;

    let dataset = store
        .insert_dataset(NewDataset {
            name: command.name,
            description: command.description,
            data_types: command.data_types,
            owner_id,
        })
        .await?
        .ok_or(CreateDatasetError::NotCreated)?;

    tracing::info!(dataset_id = %dataset.id, "Dataset created");
    Ok(dataset)
}
