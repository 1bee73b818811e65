//! Per-kind metadata extraction
//!
//! The content kind is decided once from the stored media type; each kind
//! knows how to turn the asset into a metadata patch.

use etl_common::types::ContentKind;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{image, resource::ResourceReader, tabular, text};
use crate::models::Asset;

/// Failure to enrich a single asset
///
/// Recorded on the asset and in the job log; never aborts the run.
#[derive(Debug, Error)]
pub enum AssetProcessingError {
    #[error("failed to read {uri}: {source}")]
    Read {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{uri} is larger than {limit} bytes")]
    TooLarge { uri: String, limit: u64 },

    #[error("unsupported resource scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("resource is not valid UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to parse delimited data: {0}")]
    Csv(#[from] csv::Error),

    #[error("no header row")]
    MissingHeader,

    #[error("line {line} has {found} fields, header has {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("unrecognized image format")]
    UnknownImageFormat,

    #[cfg(feature = "image-decode")]
    #[error("failed to decode image: {0}")]
    Image(#[from] ::image::ImageError),
}

/// Metadata patch for `asset`, to be merged over its existing metadata
#[tracing::instrument(skip(asset, resources), fields(asset_id = %asset.id))]
pub async fn extract_metadata(
    kind: ContentKind,
    asset: &Asset,
    resources: &ResourceReader,
) -> Result<Map<String, Value>, AssetProcessingError> {
    match kind {
        ContentKind::Text => {
            let metadata = asset.metadata_map();
            match text::inline_text(&metadata) {
                Some(inline) => Ok(text::summarize(&inline)),
                None => {
                    let bytes = resources.read(&asset.uri).await?;
                    Ok(text::summarize(&String::from_utf8(bytes)?))
                },
            }
        },
        ContentKind::Image => {
            if !image::is_supported() {
                return Ok(image::unavailable());
            }
            let bytes = resources.read(&asset.uri).await?;
            image::describe(&bytes)
        },
        ContentKind::Tabular => {
            let bytes = resources.read(&asset.uri).await?;
            tabular::summarize(&bytes)
        },
    }
}
