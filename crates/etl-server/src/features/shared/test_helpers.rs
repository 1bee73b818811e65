//! Test helpers and fixtures for route tests
//!
//! [`TestApp`] wires the feature router to an in-memory store, a recording
//! dispatcher and an identity verifier that accepts a single token.
//!
//! ```rust,ignore
//! let app = TestApp::new();
//! let dataset = app.dataset().await;
//! let (status, body) = app.send(Method::GET, &format!("/datasets/{}", dataset.id), None).await;
//! ```
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{AuthError, Identity, IdentityVerifier};
use crate::db::{EntityStore, MemoryStore};
use crate::features::{router, FeatureState};
use crate::models::{Asset, Dataset, DatasetVersion, NewAsset, NewDataset, NewVersion};
use crate::queue::{DispatchError, JobDispatcher};

/// The only bearer token [`StaticIdentity`] accepts
pub const TEST_TOKEN: &str = "test-token";

pub struct StaticIdentity {
    identity: Identity,
}

#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if token == TEST_TOKEN {
            Ok(self.identity.clone())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

/// Dispatcher that records job ids instead of running them
#[derive(Default)]
pub struct RecordingDispatcher {
    pub enqueued: Mutex<Vec<Uuid>>,
    pub fail: bool,
}

#[async_trait]
impl JobDispatcher for RecordingDispatcher {
    async fn enqueue(&self, job_id: Uuid) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError::Queue("queue unreachable".to_string()));
        }
        self.enqueued.lock().unwrap().push(job_id);
        Ok(())
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub identity: Identity,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_dispatcher(RecordingDispatcher::default())
    }

    pub fn with_failing_dispatcher() -> Self {
        Self::with_dispatcher(RecordingDispatcher {
            fail: true,
            ..Default::default()
        })
    }

    fn with_dispatcher(dispatcher: RecordingDispatcher) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            dispatcher: Arc::new(dispatcher),
            identity: Identity::new(Uuid::new_v4()),
        }
    }

    pub fn state(&self) -> FeatureState {
        FeatureState {
            store: self.store.clone(),
            dispatcher: self.dispatcher.clone(),
            identity: Arc::new(StaticIdentity {
                identity: self.identity.clone(),
            }),
        }
    }

    pub fn router(&self) -> Router {
        router(self.state())
    }

    pub fn enqueued(&self) -> Vec<Uuid> {
        self.dispatcher.enqueued.lock().unwrap().clone()
    }

    /// Authenticated request; returns the status and the JSON body (`null` when empty)
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_with_token(Some(TEST_TOKEN), method, uri, body).await
    }

    pub async fn send_with_token(
        &self,
        token: Option<&str>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn dataset(&self) -> Dataset {
        self.store
            .insert_dataset(NewDataset {
                name: "reviews".to_string(),
                description: Some("product reviews".to_string()),
                data_types: vec!["text".to_string()],
                owner_id: self.identity.id,
            })
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn version(&self, dataset_id: Uuid) -> DatasetVersion {
        self.store
            .insert_next_version(NewVersion {
                dataset_id,
                target_output: json!({}),
            })
            .await
            .unwrap()
            .unwrap()
    }

    /// A dataset with one version
    pub async fn dataset_version(&self) -> (Dataset, DatasetVersion) {
        let dataset = self.dataset().await;
        let version = self.version(dataset.id).await;
        (dataset, version)
    }

    pub async fn asset(&self, dataset_id: Uuid, version_id: Uuid, uri: &str) -> Asset {
        self.store
            .insert_assets(
                dataset_id,
                version_id,
                vec![NewAsset {
                    uri: uri.to_string(),
                    media_type: "text/plain".to_string(),
                    metadata: json!({}),
                }],
            )
            .await
            .unwrap()
            .remove(0)
    }
}
