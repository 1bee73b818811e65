//! Version manifest: one JSON line per asset with its labels

use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{empty_object, Asset, Label};

pub const MANIFEST_CONTENT_TYPE: &str = "application/json";

/// Object key of the manifest for a dataset version
pub fn manifest_key(dataset_id: Uuid, version_id: Uuid) -> String {
    format!("datasets/{}/versions/{}/manifest.jsonl", dataset_id, version_id)
}

/// Newline-joined JSON objects `{id, uri, media_type, metadata, labels}`
///
/// Assets keep the order they are given in; labels are grouped under their asset.
pub fn render(assets: &[Asset], labels: Vec<Label>) -> Result<String, serde_json::Error> {
    let mut by_asset: HashMap<Uuid, Vec<Label>> = HashMap::new();
    for label in labels {
        by_asset.entry(label.asset_id).or_default().push(label);
    }

    let mut lines = Vec::with_capacity(assets.len());
    for asset in assets {
        let labels = by_asset.remove(&asset.id).unwrap_or_default();
        let metadata = match &asset.metadata {
            Value::Null => empty_object(),
            other => other.clone(),
        };
        let line = json!({
            "id": asset.id,
            "uri": asset.uri,
            "media_type": asset.media_type,
            "metadata": metadata,
            "labels": labels,
        });
        lines.push(serde_json::to_string(&line)?);
    }

    Ok(lines.join("\n"))
}
