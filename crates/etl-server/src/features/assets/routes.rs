//! Asset API routes
//!
//! - `POST /datasets/:dataset_id/versions/:version_id/assets` - Register assets in bulk
//! - `GET /datasets/:dataset_id/versions/:version_id/assets` - List assets

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::{commands, queries};
use crate::auth::AuthContext;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn assets_routes() -> Router<FeatureState> {
    Router::new().route(
        "/datasets/:dataset_id/versions/:version_id/assets",
        get(list_assets).post(add_assets),
    )
}

#[tracing::instrument(skip(auth, command), fields(user_id = %auth.identity.id))]
async fn add_assets(
    auth: AuthContext,
    Path((dataset_id, version_id)): Path<(Uuid, Uuid)>,
    Json(command): Json<commands::AddAssetsCommand>,
) -> Result<Response, AppError> {
    let assets = commands::handle(auth.store.as_ref(), dataset_id, version_id, command).await?;
    Ok((StatusCode::CREATED, Json(assets)).into_response())
}

#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn list_assets(
    auth: AuthContext,
    Path((dataset_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let assets = queries::list(auth.store.as_ref(), dataset_id, version_id).await?;
    Ok(Json(assets).into_response())
}
