//! Resolve an asset URI to its bytes
//!
//! `file://` URIs and bare paths are read from the local filesystem;
//! `http://` and `https://` URIs are fetched, up to a byte limit.

use std::time::Duration;
use tracing::debug;

use super::content::AssetProcessingError;
use crate::config::DEFAULT_ASSET_MAX_BYTES;

const FETCH_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ResourceReader {
    http: reqwest::Client,
    max_bytes: u64,
}

impl Default for ResourceReader {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
            max_bytes: DEFAULT_ASSET_MAX_BYTES,
        }
    }
}

impl ResourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse remote bodies larger than `max_bytes`
    pub fn with_limit(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[tracing::instrument(skip(self))]
    pub async fn read(&self, uri: &str) -> Result<Vec<u8>, AssetProcessingError> {
        match ResourceLocation::parse(uri)? {
            ResourceLocation::Path(path) => {
                debug!(path, "Reading local resource");
                tokio::fs::read(path).await.map_err(|source| AssetProcessingError::Read {
                    uri: uri.to_string(),
                    source,
                })
            },
            ResourceLocation::Http(url) => {
                debug!(%url, "Fetching remote resource");
                let fetch_error = |source: reqwest::Error| AssetProcessingError::Fetch {
                    uri: uri.to_string(),
                    source,
                };

                let mut response = self
                    .http
                    .get(url)
                    .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(fetch_error)?;

                let too_large = || AssetProcessingError::TooLarge {
                    uri: uri.to_string(),
                    limit: self.max_bytes,
                };
                if response.content_length().is_some_and(|len| len > self.max_bytes) {
                    return Err(too_large());
                }

                // Content-Length can be missing or understated
                let mut body = Vec::new();
                while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
                    if (body.len() + chunk.len()) as u64 > self.max_bytes {
                        return Err(too_large());
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(body)
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ResourceLocation<'a> {
    Path(&'a str),
    Http(url::Url),
}

impl<'a> ResourceLocation<'a> {
    fn parse(uri: &'a str) -> Result<Self, AssetProcessingError> {
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(ResourceLocation::Path(path));
        }

        match url::Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(ResourceLocation::Http(url)),
            // Single-letter schemes are Windows drive letters
            Ok(url) if url.scheme().len() > 1 => {
                Err(AssetProcessingError::UnsupportedScheme(url.scheme().to_string()))
            },
            _ => Ok(ResourceLocation::Path(uri)),
        }
    }
}
