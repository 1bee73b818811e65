//! Shared domain types
//!
//! Statuses are persisted as lowercase strings; the enums here are the only
//! place those strings are spelled out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EtlError;

macro_rules! string_status {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = EtlError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(EtlError::invalid_status($kind, other)),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = EtlError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// Lifecycle of a dataset version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    #[default]
    Draft,
    Processed,
}

string_status!(VersionStatus, "version", {
    Draft => "draft",
    Processed => "processed",
});

/// Lifecycle of an asset; only moves forward from `Registered`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Registered,
    Processed,
    Failed,
}

string_status!(AssetStatus, "asset", {
    Registered => "registered",
    Processed => "processed",
    Failed => "failed",
});

impl AssetStatus {
    /// Whether the pipeline has already reached a final outcome for the asset
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetStatus::Processed | AssetStatus::Failed)
    }
}

/// Lifecycle of a pipeline job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
}

string_status!(JobStatus, "job", {
    Queued => "queued",
    Running => "running",
    Completed => "completed",
    Failed => "failed",
});

/// Default job type created by the API
pub const PIPELINE_RUN: &str = "PIPELINE_RUN";

/// Closed set of content families the pipeline knows how to enrich
///
/// Selected once from an asset's stored media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Text,
    Tabular,
}

impl ContentKind {
    /// Classify a media type string such as `image/png` or `text/plain; charset=utf-8`
    ///
    /// `image/*` and `text/*` map to their families. Everything else is
    /// tabular, including empty and malformed strings such as `csv`.
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type.trim();
        match media_type.parse::<mime::Mime>() {
            Ok(parsed) if parsed.type_() == mime::IMAGE => ContentKind::Image,
            Ok(parsed) if parsed.type_() == mime::TEXT => ContentKind::Text,
            Ok(_) => ContentKind::Tabular,
            Err(_) => {
                let lowered = media_type.to_ascii_lowercase();
                if lowered.starts_with("image/") {
                    ContentKind::Image
                } else if lowered.starts_with("text/") {
                    ContentKind::Text
                } else {
                    ContentKind::Tabular
                }
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Image => "image",
            ContentKind::Text => "text",
            ContentKind::Tabular => "tabular",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_strings() {
        assert_eq!(JobStatus::Running.as_str(), "running");
        assert_eq!("completed".parse::<JobStatus>().unwrap(), JobStatus::Completed);
        assert_eq!(AssetStatus::try_from("failed".to_string()).unwrap(), AssetStatus::Failed);
        assert_eq!(VersionStatus::default(), VersionStatus::Draft);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = "archived".parse::<VersionStatus>().unwrap_err();
        assert!(matches!(err, EtlError::InvalidStatus { kind: "version", .. }));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Queued).unwrap();
        assert_eq!(json, "\"queued\"");
    }

    #[test]
    fn test_asset_terminal_states() {
        assert!(!AssetStatus::Registered.is_terminal());
        assert!(AssetStatus::Processed.is_terminal());
        assert!(AssetStatus::Failed.is_terminal());
    }

    #[test]
    fn test_content_kind_from_media_type() {
        assert_eq!(ContentKind::from_media_type("image/png"), ContentKind::Image);
        assert_eq!(ContentKind::from_media_type("IMAGE/JPEG"), ContentKind::Image);
        assert_eq!(ContentKind::from_media_type("text/plain"), ContentKind::Text);
        assert_eq!(
            ContentKind::from_media_type("text/plain; charset=utf-8"),
            ContentKind::Text
        );
        assert_eq!(ContentKind::from_media_type("text/csv"), ContentKind::Text);
        assert_eq!(ContentKind::from_media_type("application/octet-stream"), ContentKind::Tabular);
        assert_eq!(ContentKind::from_media_type("application/vnd.ms-excel"), ContentKind::Tabular);
    }

    #[test]
    fn test_content_kind_falls_back_to_tabular() {
        assert_eq!(ContentKind::from_media_type("csv"), ContentKind::Tabular);
        assert_eq!(ContentKind::from_media_type(""), ContentKind::Tabular);
        assert_eq!(ContentKind::from_media_type("   "), ContentKind::Tabular);
        assert_eq!(ContentKind::from_media_type("application"), ContentKind::Tabular);
    }

    #[test]
    fn test_content_kind_prefix_survives_malformed_parameters() {
        assert_eq!(ContentKind::from_media_type("image/png; ="), ContentKind::Image);
        assert_eq!(ContentKind::from_media_type("Text/plain;;"), ContentKind::Text);
    }
}
