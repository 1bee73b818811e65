//! Add a manual label to one asset

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::features::shared::{validate_confidence, validate_required, ValidationError};
use crate::models::{Label, NewLabel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLabelCommand {
    pub label_type: String,
    pub payload: Value,
    pub annotator: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum AddLabelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Asset not found")]
    AssetNotFound,

    #[error("Failed to create label")]
    NotCreated,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<AddLabelError> for AppError {
    fn from(err: AddLabelError) -> Self {
        match err {
            AddLabelError::Validation(e) => e.into(),
            AddLabelError::AssetNotFound => AppError::NotFound(err.to_string()),
            AddLabelError::NotCreated => AppError::Validation(err.to_string()),
            AddLabelError::Store(e) => AppError::Store(e),
        }
    }
}

impl AddLabelCommand {
    pub fn validate(&self) -> Result<(), AddLabelError> {
        validate_required("label_type", &self.label_type)?;
        validate_confidence(self.confidence)?;
        Ok(())
    }
}

/// Insert the label if `asset_id` belongs to the given dataset version
#[tracing::instrument(skip(store, command), fields(label_type = %command.label_type))]
pub async fn handle(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
    asset_id: Uuid,
    command: AddLabelCommand,
) -> Result<Label, AddLabelError> {
    command.validate()?;

    if store
        .find_asset(dataset_id, version_id, asset_id)
        .await?
        .is_none()
    {
        return Err(AddLabelError::AssetNotFound);
    }

    let label = store
        .insert_label(NewLabel {
            asset_id,
            label_type: command.label_type,
            payload: command.payload,
            annotator: command.annotator,
            confidence: command.confidence,
        })
        .await?
        .ok_or(AddLabelError::NotCreated)?;

    tracing::info!(label_id = %label.id, "Label added");
    Ok(label)
}
