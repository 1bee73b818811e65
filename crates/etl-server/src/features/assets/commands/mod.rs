//! Bulk asset registration

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::features::shared::{validate_required, ValidationError};
use crate::models::{Asset, NewAsset};

/// Request body is a bare JSON array of asset descriptors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddAssetsCommand {
    pub assets: Vec<NewAsset>,
}

#[derive(Debug, thiserror::Error)]
pub enum AddAssetsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Version not found")]
    VersionNotFound,

    #[error("Failed to add assets")]
    NotCreated,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<AddAssetsError> for AppError {
    fn from(err: AddAssetsError) -> Self {
        match err {
            AddAssetsError::Validation(e) => e.into(),
            AddAssetsError::VersionNotFound => AppError::NotFound(err.to_string()),
            AddAssetsError::NotCreated => AppError::Validation(err.to_string()),
            AddAssetsError::Store(e) => AppError::Store(e),
        }
    }
}

impl AddAssetsCommand {
    pub fn validate(&self) -> Result<(), AddAssetsError> {
        for asset in &self.assets {
            validate_required("uri", &asset.uri)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(store, command), fields(count = command.assets.len()))]
pub async fn handle(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
    command: AddAssetsCommand,
) -> Result<Vec<Asset>, AddAssetsError> {
    command.validate()?;

    if store.get_version(dataset_id, version_id).await?.is_none() {
        return Err(AddAssetsError::VersionNotFound);
    }

    if command.assets.is_empty() {
        return Err(AddAssetsError::NotCreated);
    }

    let assets = store
        .insert_assets(dataset_id, version_id, command.assets)
        .await?;
    if assets.is_empty() {
        return Err(AddAssetsError::NotCreated);
    }

    tracing::info!(count = assets.len(), "Assets registered");
    Ok(assets)
}
