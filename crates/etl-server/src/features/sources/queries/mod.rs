use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::models::DataSource;

/// Sources of a version, newest first
#[tracing::instrument(skip(store))]
pub async fn list(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
) -> Result<Vec<DataSource>, StoreError> {
    store.list_sources(dataset_id, version_id).await
}
