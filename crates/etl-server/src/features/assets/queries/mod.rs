use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::models::Asset;

/// Assets of a version, newest first
#[tracing::instrument(skip(store))]
pub async fn list(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
) -> Result<Vec<Asset>, StoreError> {
    store.list_assets(dataset_id, version_id).await
}
