//! Ingestion stage
//!
//! Every declared source contributes one placeholder asset per run. Source
//! types are not distinguished yet; a connector for a given `source_type`
//! would replace [`placeholder_asset`] with a real extractor.

use serde_json::json;

use crate::models::{DataSource, NewAsset};

pub const PLACEHOLDER_MEDIA_TYPE: &str = "text/plain";
pub const INGEST_NOTE: &str = "Connector ingest placeholder. Replace with actual extractor.";

pub fn placeholder_asset(source: &DataSource) -> NewAsset {
    NewAsset {
        uri: source.source_uri.clone(),
        media_type: PLACEHOLDER_MEDIA_TYPE.to_string(),
        metadata: json!({
            "source_type": source.source_type,
            "source_id": source.id,
            "ingest_note": INGEST_NOTE,
        }),
    }
}
