//! Job API routes
//!
//! - `POST /datasets/:dataset_id/versions/:version_id/jobs` - Create a queued job
//! - `GET /datasets/:dataset_id/versions/:version_id/jobs` - List jobs of the version
//! - `GET /jobs/:job_id` - Get a job
//! - `POST /jobs/:job_id/run` - Start the pipeline for a job

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::{commands, queries};
use crate::auth::AuthContext;
use crate::error::AppError;
use crate::features::{shared::json_or_default, FeatureState};

pub fn jobs_routes() -> Router<FeatureState> {
    Router::new()
        .route(
            "/datasets/:dataset_id/versions/:version_id/jobs",
            get(list_jobs).post(create_job),
        )
        .route("/jobs/:job_id", get(get_job))
        .route("/jobs/:job_id/run", post(run_job))
}

/// `201 Created` with the job row; the body is optional
#[tracing::instrument(skip(auth, body), fields(user_id = %auth.identity.id))]
async fn create_job(
    auth: AuthContext,
    Path((dataset_id, version_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<Response, AppError> {
    let command: commands::CreateJobCommand = json_or_default(&body)?;
    let job =
        commands::create::handle(auth.store.as_ref(), dataset_id, version_id, command).await?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn list_jobs(
    auth: AuthContext,
    Path((dataset_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let jobs = queries::list(auth.store.as_ref(), dataset_id, version_id).await?;
    Ok(Json(jobs).into_response())
}

#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn get_job(auth: AuthContext, Path(job_id): Path<Uuid>) -> Result<Response, AppError> {
    let job = queries::get(auth.store.as_ref(), job_id).await?;
    Ok(Json(job).into_response())
}

/// `202 Accepted` with `{"status": "started", "job_id": ...}`
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.identity.id))]
async fn run_job(
    State(state): State<FeatureState>,
    auth: AuthContext,
    Path(job_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response =
        commands::run::handle(auth.store.as_ref(), state.dispatcher.as_ref(), job_id).await?;
    Ok((StatusCode::ACCEPTED, Json(response)).into_response())
}
