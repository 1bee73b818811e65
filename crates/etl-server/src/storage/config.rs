//! Object store settings (`S3_*` variables)

use serde::{Deserialize, Serialize};
use std::env;

/// Bucket that receives generated manifests unless `S3_BUCKET` says otherwise
pub const DEFAULT_MANIFEST_BUCKET: &str = "processed";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Local MinIO credentials, used when nothing else is configured
const DEV_CREDENTIAL: &str = "minioadmin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible services; `None` means AWS
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub path_style: bool,
}

/// First non-empty value among `keys`
fn first_var(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

impl StorageConfig {
    /// `S3_ACCESS_KEY`/`S3_SECRET_KEY` fall back to the standard AWS variables
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bucket = match env::var("S3_BUCKET") {
            Ok(bucket) if bucket.trim().is_empty() => anyhow::bail!("S3_BUCKET cannot be empty"),
            Ok(bucket) => bucket,
            Err(_) => defaults.bucket,
        };

        Ok(Self {
            endpoint: first_var(&["S3_ENDPOINT"]),
            region: first_var(&["S3_REGION", "AWS_REGION"]).unwrap_or(defaults.region),
            bucket,
            access_key: first_var(&["S3_ACCESS_KEY", "AWS_ACCESS_KEY_ID"])
                .unwrap_or(defaults.access_key),
            secret_key: first_var(&["S3_SECRET_KEY", "AWS_SECRET_ACCESS_KEY"])
                .unwrap_or(defaults.secret_key),
            path_style: first_var(&["S3_PATH_STYLE"])
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.path_style),
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            bucket: DEFAULT_MANIFEST_BUCKET.to_string(),
            access_key: DEV_CREDENTIAL.to_string(),
            secret_key: DEV_CREDENTIAL.to_string(),
            path_style: false,
        }
    }
}
