//! Version API routes
//!
//! - `POST /datasets/:dataset_id/versions` - Create the next version
//! - `GET /datasets/:dataset_id/versions` - List versions, newest first

use axum::{
    body::Bytes,
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
use crate::features::{shared::json_or_default, FeatureState};

pub fn versions_routes() -> Router<FeatureState> {
    Router::new().route(
        "/datasets/:dataset_id/versions",
        get(list_versions).post(create_version),
    )
}

/// `201 Created` with the version row, `404` if the dataset is not visible
#[tracing::instrument(skip(auth, body), fields(user_id = %auth.identity.id))]
async fn create_version(
    auth: AuthContext,
    Path(dataset_id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, AppError> {
    let command: commands::CreateVersionCommand = json_or_default(&body)?;
    let version = commands::create::handle(auth.store.as_ref(), dataset_id, command).await?;
    Ok((StatusCode::CREATED, Json(version)).into_response())
}

#[tracing::instrument(skip(auth), fields(user_id = %auth.identity.id))]
async fn list_versions(
    auth: AuthContext,
    Path(dataset_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let versions = queries::list(auth.store.as_ref(), dataset_id).await?;
    Ok(Json(versions).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::features::shared::test_helpers::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_create_versions_sequentially() {
        let app = TestApp::new();
        let dataset = app.dataset().await;
        let uri = format!("/datasets/{}/versions", dataset.id);

        let (status, first) = app
            .send(Method::POST, &uri, Some(json!({"target_output": {"format": "jsonl"}})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["version"], json!(1));
        assert_eq!(first["status"], json!("draft"));
        assert_eq!(first["target_output"]["format"], json!("jsonl"));

        let (status, second) = app.send(Method::POST, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(second["version"], json!(2));
        assert_eq!(second["target_output"], json!({}));

        let (status, listed) = app.send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let numbers: Vec<i64> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["version"].as_i64().unwrap())
            .collect();
        assert_eq!(numbers, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_create_version_without_body() {
        let app = TestApp::new();
        let dataset = app.dataset().await;

        let (status, body) = app
            .send(Method::POST, &format!("/datasets/{}/versions", dataset.id), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["version"], json!(1));
        assert_eq!(body["target_output"], json!({}));
    }

    #[tokio::test]
    async fn test_create_version_rejects_malformed_body() {
        let app = TestApp::new();
        let dataset = app.dataset().await;
        let uri = format!("/datasets/{}/versions", dataset.id);

        let (status, body) = app.send(Method::POST, &uri, Some(json!("jsonl"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], json!(400));

        let (_, listed) = app.send(Method::GET, &uri, None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_version_for_missing_dataset() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                &format!("/datasets/{}/versions", Uuid::new_v4()),
                Some(json!({})),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], json!("Dataset not found"));
    }
}
