//! Dataset read operations
//!
//! Both queries see only what the caller's store handle lets them see.

use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::error::AppError;
use crate::models::Dataset;

#[derive(Debug, thiserror::Error)]
pub enum GetDatasetError {
    #[error("Dataset not found")]
    NotFound,

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<GetDatasetError> for AppError {
    fn from(err: GetDatasetError) -> Self {
        match err {
            GetDatasetError::NotFound => AppError::NotFound(err.to_string()),
            GetDatasetError::Store(e) => AppError::Store(e),
        }
    }
}

/// Newest first
#[tracing::instrument(skip(store))]
pub async fn list(store: &dyn EntityStore) -> Result<Vec<Dataset>, StoreError> {
    store.list_datasets().await
}

#[tracing::instrument(skip(store))]
pub async fn get(store: &dyn EntityStore, dataset_id: Uuid) -> Result<Dataset, GetDatasetError> {
    store
        .get_dataset(dataset_id)
        .await?
        .ok_or(GetDatasetError::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewDataset;

    async fn insert(store: &MemoryStore, name: &str) -> Dataset {
        store
            .insert_dataset(NewDataset {
                name: name.to_string(),
                description: None,
                data_types: vec![],
                owner_id: Uuid::new_v4(),
            })
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryStore::new();
        insert(&store, "first").await;
        insert(&store, "second").await;

        let names: Vec<String> = list(&store).await.unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_get_missing_dataset() {
        let store = MemoryStore::new();
        let err = get(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, GetDatasetError::NotFound));
        assert!(matches!(AppError::from(err), AppError::NotFound(m) if m == "Dataset not found"));
    }
}
