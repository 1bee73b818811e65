//! Baseline auto-labelling
//!
//! Attaches the same low-confidence label to every asset of a version,
//! attributed to the caller.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::db::{EntityStore, StoreError};
use crate::models::NewLabel;

pub const AUTO_LABEL_TYPE: &str = "auto";
pub const AUTO_LABEL_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoLabelResponse {
    pub created: usize,
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn EntityStore,
    dataset_id: Uuid,
    version_id: Uuid,
    annotator: Uuid,
) -> Result<AutoLabelResponse, StoreError> {
    let assets = store.list_assets(dataset_id, version_id).await?;
    if assets.is_empty() {
        return Ok(AutoLabelResponse { created: 0 });
    }

    let labels = assets
        .iter()
        .map(|asset| NewLabel {
            asset_id: asset.id,
            label_type: AUTO_LABEL_TYPE.to_string(),
            payload: json!({"label": "auto_label", "source": "baseline"}),
            annotator: annotator.to_string(),
            confidence: Some(AUTO_LABEL_CONFIDENCE),
        })
        .collect();

    let created = store.insert_labels(labels).await?.len();
    tracing::info!(created, "Auto-labels created");
    Ok(AutoLabelResponse { created })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewAsset;

    #[tokio::test]
    async fn test_zero_assets_creates_nothing() {
        let store = MemoryStore::new();
        let response = handle(&store, Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(response, AutoLabelResponse { created: 0 });
    }

    #[tokio::test]
    async fn test_one_label_per_asset() {
        let store = MemoryStore::new();
        let (dataset_id, version_id, annotator) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let assets = store
            .insert_assets(
                dataset_id,
                version_id,
                (0..3)
                    .map(|i| NewAsset {
                        uri: format!("{}.txt", i),
                        media_type: "text/plain".to_string(),
                        metadata: json!({}),
                    })
                    .collect(),
            )
            .await
            .unwrap();

        let response = handle(&store, dataset_id, version_id, annotator).await.unwrap();
        assert_eq!(response.created, 3);

        let ids: Vec<Uuid> = assets.iter().map(|a| a.id).collect();
        let labels = store.list_labels_for_assets(&ids).await.unwrap();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().all(|l| l.label_type == "auto"
            && l.confidence == Some(0.5)
            && l.annotator == annotator.to_string()
            && l.payload == json!({"label": "auto_label", "source": "baseline"})));
    }
}
