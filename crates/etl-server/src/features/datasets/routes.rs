//! Dataset API routes
//!
//! - `POST /datasets` - Create a dataset owned by the caller
//! - `GET /datasets` - List datasets, newest first
//! - `GET /datasets/:dataset_id` - Get a single dataset

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

pub fn datasets_routes() -> Router<FeatureState> {
    Router::new()
        .route("/datasets", get(list_datasets).post(create_dataset))
        .route("/datasets/:dataset_id", get(get_dataset))
}

/// `201 Created` with the dataset row, `400` on a blank name
#[tracing::instrument(skip(auth, command), fields(user_id = %auth.identity.id))]
async fn create_dataset(
    auth: AuthContext,
    Json(command): Json<commands::CreateDatasetCommand>,
) -> Result<Response, AppError> {
    let dataset = commands::create::handle(auth.store.as_ref(), auth.identity.id, command).await?;
    Ok((StatusCode::CREATED, Json(dataset)).into_response())
}

#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn list_datasets(auth: AuthContext) -> Result<Response, AppError> {
    let datasets = queries::list(auth.store.as_ref()).await?;
    Ok(Json(datasets).into_response())
}

#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn get_dataset(
    auth: AuthContext,
    Path(dataset_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let dataset = queries::get(auth.store.as_ref(), dataset_id).await?;
    Ok(Json(dataset).into_response())
}
