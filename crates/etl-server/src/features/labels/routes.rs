//! Label API routes
//!
//! - `POST /datasets/:dataset_id/versions/:version_id/labels/:asset_id` - Label one asset
//! - `GET /datasets/:dataset_id/versions/:version_id/labels` - List labels of the version
//! - `POST /datasets/:dataset_id/versions/:version_id/auto-label` - Baseline label for every asset

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::{commands, queries};
use crate::auth::AuthContext;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn labels_routes() -> Router<FeatureState> {
    Router::new()
        .route(
            "/datasets/:dataset_id/versions/:version_id/labels",
            get(list_labels),
        )
        .route(
            "/datasets/:dataset_id/versions/:version_id/labels/:asset_id",
            post(add_label),
        )
        .route(
            "/datasets/:dataset_id/versions/:version_id/auto-label",
            post(auto_label),
        )
}

/// `201 Created` with the label row, `404` if the asset is not in the version
#[tracing::instrument(skip(auth, command), fields(user_id = %auth.identity.id))]
async fn add_label(
    auth: AuthContext,
    Path((dataset_id, version_id, asset_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(command): Json<commands::AddLabelCommand>,
) -> Result<Response, AppError> {
    let label =
        commands::add::handle(auth.store.as_ref(), dataset_id, version_id, asset_id, command)
            .await?;
    Ok((StatusCode::CREATED, Json(label)).into_response())
}

#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn list_labels(
    auth: AuthContext,
    Path((dataset_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let labels = queries::list(auth.store.as_ref(), dataset_id, version_id).await?;
    Ok(Json(labels).into_response())
}

/// `200 OK` with `{"created": n}`
#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn auto_label(
    auth: AuthContext,
    Path((dataset_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let response = commands::auto_label::handle(
        auth.store.as_ref(),
        dataset_id,
        version_id,
        auth.identity.id,
    )
    .await?;
    Ok(Json(response).into_response())
}
