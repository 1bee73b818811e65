//! Source API routes
//!
//! - `POST /datasets/:dataset_id/versions/:version_id/sources` - Declare a source
//! - `GET /datasets/:dataset_id/versions/:version_id/sources` - List sources

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

pub fn sources_routes() -> Router<FeatureState> {
    Router::new().route(
        "/datasets/:dataset_id/versions/:version_id/sources",
        get(list_sources).post(add_source),
    )
}

#[tracing::instrument(skip(auth, command), fields(user_id = %auth.identity.id))]
async fn add_source(
    auth: AuthContext,
    Path((dataset_id, version_id)): Path<(Uuid, Uuid)>,
    Json(command): Json<commands::AddSourceCommand>,
) -> Result<Response, AppError> {
    let source =
        commands::handle(auth.store.as_ref(), dataset_id, version_id, command).await?;
    Ok((StatusCode::CREATED, Json(source)).into_response())
}

#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn list_sources(
    auth: AuthContext,
    Path((dataset_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let sources = queries::list(auth.store.as_ref(), dataset_id, version_id).await?;
    Ok(Json(sources).into_response())
}
