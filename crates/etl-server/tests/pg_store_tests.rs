//! PostgreSQL entity store against a real database
//!
//! Covers what the in-memory store cannot: the schema, version numbering under
//! the unique constraint, the job lease and row-level security for scoped
//! handles.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::TestPostgres;
use etl_common::types::{AssetStatus, JobStatus, VersionStatus, PIPELINE_RUN};
use etl_server::{
    auth::Identity,
    db::{EntityStore, PgStore},
    models::{Dataset, DatasetVersion, NewAsset, NewDataset, NewJob, NewLabel, NewVersion},
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const USER_ROLE: &str = "authenticated";

async fn store() -> (TestPostgres, PgStore) {
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let store = PgStore::new(pg.pool_clone(), USER_ROLE);
    (pg, store)
}

async fn dataset(store: &dyn EntityStore, owner_id: Uuid) -> Dataset {
    store
        .insert_dataset(NewDataset {
            name: "pg".to_string(),
            description: Some("store test".to_string()),
            data_types: vec!["text".to_string(), "image".to_string()],
            owner_id,
        })
        .await
        .unwrap()
        .unwrap()
}

async fn version(store: &dyn EntityStore, dataset_id: Uuid) -> DatasetVersion {
    store
        .insert_next_version(NewVersion {
            dataset_id,
            target_output: json!({"format": "jsonl"}),
        })
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_dataset_round_trip() {
    let (_pg, store) = store().await;
    let owner = Uuid::new_v4();

    let created = dataset(&store, owner).await;
    assert_eq!(created.owner_id, owner);
    assert_eq!(created.data_types, vec!["text", "image"]);

    let fetched = store.get_dataset(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "pg");
    assert!(store.get_dataset(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_versions_numbered_under_contention() {
    let (_pg, store) = store().await;
    let dataset_id = dataset(&store, Uuid::new_v4()).await.id;
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for _ in 0..3 {
        let store = store.clone();
        handles.push(tokio::spawn(async move { version(store.as_ref(), dataset_id).await }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let numbers: Vec<i32> = store
        .list_versions(dataset_id)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version)
        .collect();
    assert_eq!(numbers, vec![3, 2, 1]);

    let first = store.list_versions(dataset_id).await.unwrap().pop().unwrap();
    assert_eq!(first.status, VersionStatus::Draft);
    store
        .set_version_status(first.id, VersionStatus::Processed)
        .await
        .unwrap();
    let updated = store.get_version(dataset_id, first.id).await.unwrap().unwrap();
    assert_eq!(updated.status, VersionStatus::Processed);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_assets_and_labels() {
    let (_pg, store) = store().await;
    let dataset = dataset(&store, Uuid::new_v4()).await;
    let version = version(&store, dataset.id).await;

    let assets = store
        .insert_assets(
            dataset.id,
            version.id,
            vec![
                NewAsset {
                    uri: "file:///a.txt".to_string(),
                    media_type: "text/plain".to_string(),
                    metadata: json!({}),
                },
                NewAsset {
                    uri: "file:///b.png".to_string(),
                    media_type: "image/png".to_string(),
                    metadata: json!({"camera": "x"}),
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(assets.len(), 2);
    assert!(assets.iter().all(|a| a.status == AssetStatus::Registered));

    let asset = &assets[0];
    store
        .update_asset(asset.id, json!({"text_length": 3}), AssetStatus::Processed)
        .await
        .unwrap();
    let found = store
        .find_asset(dataset.id, version.id, asset.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, AssetStatus::Processed);
    assert_eq!(found.metadata, json!({"text_length": 3}));
    assert!(store
        .find_asset(dataset.id, Uuid::new_v4(), asset.id)
        .await
        .unwrap()
        .is_none());

    let label = store
        .insert_label(NewLabel {
            asset_id: asset.id,
            label_type: "topic".to_string(),
            payload: json!({"label": "x"}),
            annotator: "reviewer".to_string(),
            confidence: Some(0.25),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(label.confidence, Some(0.25));

    let many = store
        .insert_labels(
            assets
                .iter()
                .map(|a| NewLabel {
                    asset_id: a.id,
                    label_type: "auto".to_string(),
                    payload: json!({"label": "auto_label", "source": "baseline"}),
                    annotator: "service".to_string(),
                    confidence: Some(0.5),
                })
                .collect(),
        )
        .await
        .unwrap();
    assert_eq!(many.len(), 2);

    let ids: Vec<Uuid> = assets.iter().map(|a| a.id).collect();
    assert_eq!(store.list_labels_for_assets(&ids).await.unwrap().len(), 3);
    assert!(store.list_labels_for_assets(&[]).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_confidence_out_of_range_rejected_by_schema() {
    let (_pg, store) = store().await;
    let dataset = dataset(&store, Uuid::new_v4()).await;
    let version = version(&store, dataset.id).await;
    let asset = store
        .insert_assets(
            dataset.id,
            version.id,
            vec![NewAsset {
                uri: "file:///a.txt".to_string(),
                media_type: "text/plain".to_string(),
                metadata: json!({}),
            }],
        )
        .await
        .unwrap()
        .remove(0);

    let result = store
        .insert_label(NewLabel {
            asset_id: asset.id,
            label_type: "x".to_string(),
            payload: json!({}),
            annotator: "a".to_string(),
            confidence: Some(1.5),
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_version_status_limited_to_known_values() {
    let (pg, store) = store().await;
    let dataset = dataset(&store, Uuid::new_v4()).await;
    let version = version(&store, dataset.id).await;

    for status in ["published", "archived"] {
        let result = sqlx::query("UPDATE dataset_versions SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(version.id)
            .execute(pg.pool())
            .await;
        assert!(result.is_err(), "status '{}' should violate the CHECK", status);
    }

    let stored = store.get_version(dataset.id, version.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VersionStatus::Draft);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_job_lease() {
    let (_pg, store) = store().await;
    let dataset = dataset(&store, Uuid::new_v4()).await;
    let version = version(&store, dataset.id).await;

    let job = store
        .insert_job(NewJob {
            dataset_id: dataset.id,
            version_id: version.id,
            job_type: PIPELINE_RUN.to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.job_type, "PIPELINE_RUN");

    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let claimed = store.claim_job(job.id, first).await.unwrap().unwrap();
    assert_eq!(claimed.status, JobStatus::Running);
    store.claim_job(job.id, second).await.unwrap().unwrap();

    assert!(!store
        .finish_job(job.id, first, JobStatus::Completed, "stale")
        .await
        .unwrap());
    assert!(store
        .finish_job(job.id, second, JobStatus::Completed, "Processed a")
        .await
        .unwrap());

    let finished = store.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.logs.as_deref(), Some("Processed a"));

    assert!(store.claim_job(Uuid::new_v4(), first).await.unwrap().is_none());
    assert!(!store.set_job_status(Uuid::new_v4(), JobStatus::Running).await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_scoped_handle_sees_only_own_datasets() {
    let (_pg, store) = store().await;
    let alice = Identity::new(Uuid::new_v4());
    let bob = Identity::new(Uuid::new_v4());

    let alice_store = store.scoped(&alice);
    let bob_store = store.scoped(&bob);

    let owned = dataset(alice_store.as_ref(), alice.id).await;
    let alice_version = version(alice_store.as_ref(), owned.id).await;
    dataset(bob_store.as_ref(), bob.id).await;

    let visible = alice_store.list_datasets().await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, owned.id);

    assert!(bob_store.get_dataset(owned.id).await.unwrap().is_none());
    assert!(bob_store
        .get_version(owned.id, alice_version.id)
        .await
        .unwrap()
        .is_none());
    assert!(bob_store.list_versions(owned.id).await.unwrap().is_empty());

    // The unscoped service handle sees everything
    assert_eq!(store.list_datasets().await.unwrap().len(), 2);
}
