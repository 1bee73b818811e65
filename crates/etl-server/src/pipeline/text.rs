//! Text enrichment

use serde_json::{json, Map, Value};

/// Characters kept in `text_preview`
pub const PREVIEW_CHARS: usize = 200;

/// Metadata key holding text supplied with the asset itself
pub const INLINE_TEXT_KEY: &str = "text_inline";

/// Collapse every whitespace run to one space and drop leading/trailing whitespace
pub fn clean(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Inline text supplied with the asset, if any
///
/// Any value other than `null`, `false`, `0`, `""`, `[]` or `{}` counts.
/// Strings are used as-is; numbers, booleans, arrays and objects are
/// summarized from their JSON rendering. Empty values fall back to the URI.
pub fn inline_text(metadata: &Map<String, Value>) -> Option<String> {
    match metadata.get(INLINE_TEXT_KEY)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        other => Some(other.to_string()),
    }
}

pub fn summarize(raw: &str) -> Map<String, Value> {
    let cleaned = clean(raw);
    let preview: String = cleaned.chars().take(PREVIEW_CHARS).collect();

    let mut metadata = Map::new();
    metadata.insert("text_length".to_string(), json!(cleaned.chars().count()));
    metadata.insert("text_preview".to_string(), json!(preview));
    metadata
}
