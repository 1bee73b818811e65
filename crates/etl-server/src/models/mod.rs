//! Database models

use chrono::{DateTime, Utc};
use etl_common::types::{AssetStatus, JobStatus, VersionStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// Dataset model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub data_types: Vec<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Dataset version model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DatasetVersion {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub version: i32,
    pub target_output: Value,
    #[sqlx(try_from = "String")]
    pub status: VersionStatus,
    pub created_at: DateTime<Utc>,
}

/// Declared origin from which assets are ingested
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DataSource {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub version_id: Uuid,
    pub source_type: String,
    pub source_uri: String,
    pub options: Value,
    pub created_at: DateTime<Utc>,
}

/// Asset model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Asset {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub version_id: Uuid,
    pub uri: String,
    pub media_type: String,
    pub metadata: Value,
    #[sqlx(try_from = "String")]
    pub status: AssetStatus,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Metadata as a mapping; anything that is not a JSON object reads as empty
    pub fn metadata_map(&self) -> Map<String, Value> {
        match &self.metadata {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }
}

/// Label model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Label {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub label_type: String,
    pub payload: Value,
    pub annotator: String,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Pipeline job model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub version_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub job_type: String,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub logs: Option<String>,
    /// Token of the run currently allowed to record the job outcome
    #[serde(skip)]
    pub lease_token: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Insert inputs
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewDataset {
    pub name: String,
    pub description: Option<String>,
    pub data_types: Vec<String>,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewVersion {
    pub dataset_id: Uuid,
    pub target_output: Value,
}

#[derive(Debug, Clone)]
pub struct NewSource {
    pub dataset_id: Uuid,
    pub version_id: Uuid,
    pub source_type: String,
    pub source_uri: String,
    pub options: Value,
}

/// Asset descriptor; every new asset starts out `registered`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAsset {
    pub uri: String,
    pub media_type: String,
    #[serde(default = "empty_object")]
    pub metadata: Value,
}

#[derive(Debug, Clone)]
pub struct NewLabel {
    pub asset_id: Uuid,
    pub label_type: String,
    pub payload: Value,
    pub annotator: String,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub dataset_id: Uuid,
    pub version_id: Uuid,
    pub job_type: String,
}

/// Serde default for free-form mapping fields
pub fn empty_object() -> Value {
    Value::Object(Map::new())
}
