//! Unified ETL Server Library
#![recursion_limit = "256"]
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Dataset management and enrichment backend.
//!
//! # Overview
//!
//! - **API Endpoints**: REST surface for datasets, versions, sources, assets,
//!   labels and pipeline jobs
//! - **Entity Store**: PostgreSQL via SQLx, row-level security applied per caller
//! - **Object Store**: S3-compatible bucket receiving the per-version manifest
//! - **Job Queue**: apalis on PostgreSQL, or an in-process dispatcher for development
//! - **Pipeline Worker**: per-asset enrichment by content kind (text, image, tabular)
//!
//! # Architecture
//!
//! Requests flow through feature slices (`features/<name>/{commands,queries,routes}`).
//! Commands write through the [`db::EntityStore`] handle scoped to the caller;
//! `POST /jobs/:id/run` hands the job id to a [`queue::JobDispatcher`], and the
//! [`pipeline::PipelineWorker`] picks it up on the other side of the queue.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use etl_server::{
//!     auth::HttpIdentityClient, config::Config, db::PgStore, features::FeatureState,
//!     queue::QueueDispatcher,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = etl_server::db::create_pool(&config.database).await?;
//!     let state = FeatureState {
//!         store: Arc::new(PgStore::new(pool.clone(), &config.database.user_role)),
//!         dispatcher: Arc::new(QueueDispatcher::new(&pool)),
//!         identity: Arc::new(HttpIdentityClient::new(&config.auth)?),
//!     };
//!     let app = etl_server::api::create_router(state, &config.cors);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod storage;

// Re-export commonly used types
pub use error::AppError;
