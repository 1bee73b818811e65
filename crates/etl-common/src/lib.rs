//! Unified ETL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the ETL workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`EtlError`] for status strings that fail to decode
//! - **Logging**: centralized `tracing` subscriber setup
//! - **Types**: lifecycle statuses for versions, assets and jobs, and the
//!   [`types::ContentKind`] selected from an asset's media type
//!
//! # Example
//!
//! ```
//! use etl_common::types::{AssetStatus, ContentKind};
//!
//! assert_eq!(ContentKind::from_media_type("image/png"), ContentKind::Image);
//! assert_eq!("processed".parse::<AssetStatus>().unwrap(), AssetStatus::Processed);
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::EtlError;
