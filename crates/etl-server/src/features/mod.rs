//! Feature modules implementing the ETL API
//!
//! Each feature is a vertical slice with its own commands, queries, and routes.
//!
//! # Features
//!
//! - **datasets**: create, list and fetch datasets owned by the caller
//! - **versions**: sequentially numbered versions of a dataset
//! - **sources**: declared origins that seed placeholder assets at ingest
//! - **assets**: bulk registration and listing of assets in a version
//! - **labels**: manual labels, baseline auto-labelling and label listing
//! - **jobs**: pipeline job creation, listing, polling and dispatch
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//!
//! Handlers are plain async functions taking the caller-scoped
//! [`EntityStore`] handle from [`crate::auth::AuthContext`].

pub mod assets;
pub mod datasets;
pub mod jobs;
pub mod labels;
pub mod shared;
pub mod sources;
pub mod versions;

use axum::Router;
use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::db::EntityStore;
use crate::queue::JobDispatcher;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Service-level store handle; requests use the handle scoped to their caller
    pub store: Arc<dyn EntityStore>,
    /// Hands run requests to the pipeline worker
    pub dispatcher: Arc<dyn JobDispatcher>,
    /// Validates bearer tokens
    pub identity: Arc<dyn IdentityVerifier>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/datasets` and `/datasets/:dataset_id` - Datasets
/// - `/datasets/:dataset_id/versions` - Versions
/// - `/datasets/:dataset_id/versions/:version_id/sources` - Sources
/// - `/datasets/:dataset_id/versions/:version_id/assets` - Assets
/// - `/datasets/:dataset_id/versions/:version_id/labels`, `.../auto-label` - Labels
/// - `/datasets/:dataset_id/versions/:version_id/jobs`, `/jobs/:job_id` - Jobs
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(datasets::datasets_routes())
        .merge(versions::versions_routes())
        .merge(sources::sources_routes())
        .merge(assets::assets_routes())
        .merge(labels::labels_routes())
        .merge(jobs::jobs_routes())
        .with_state(state)
}
