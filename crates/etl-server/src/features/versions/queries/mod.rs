use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::models::DatasetVersion;

/// Versions of a dataset, highest number first
#[tracing::instrument(skip(store))]
pub async fn list(
    store: &dyn EntityStore,
    dataset_id: Uuid,
) -> Result<Vec<DatasetVersion>, StoreError> {
    store.list_versions(dataset_id).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewVersion;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_is_scoped_to_dataset() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        for dataset_id in [a, a, b] {
            store
                .insert_next_version(NewVersion {
                    dataset_id,
                    target_output: json!({}),
                })
                .await
                .unwrap();
        }

        let versions: Vec<i32> = list(&store, a).await.unwrap().iter().map(|v| v.version).collect();
        assert_eq!(versions, vec![2, 1]);
        assert_eq!(list(&store, b).await.unwrap().len(), 1);
    }
}
