use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::models::Label;

/// Labels of every asset in the version
///
/// Resolves the version's asset ids first; with no assets the label table is
/// not queried at all.
#[tracing::instrument(skip(store))]
pub async fn list(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
) -> Result<Vec<Label>, StoreError> {
    let asset_ids: Vec<Uuid> = store
        .list_assets(dataset_id, version_id)
        .await?
        .into_iter()
        .map(|asset| asset.id)
        .collect();

    if asset_ids.is_empty() {
        return Ok(Vec::new());
    }

    store.list_labels_for_assets(&asset_ids).await
}
