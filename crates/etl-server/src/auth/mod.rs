//! Bearer-token authentication
//!
//! Tokens are never decoded locally. Each request presents its token to the
//! identity service (`GET {AUTH_URL}/auth/v1/user`), and the returned user
//! becomes the request [`Identity`].

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::EntityStore;
use crate::features::FeatureState;

/// Path of the "who am I" endpoint on the identity service
pub const USER_ENDPOINT: &str = "/auth/v1/user";

const IDENTITY_TIMEOUT_SECS: u64 = 10;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "authenticated".to_string()
}

impl Identity {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            email: None,
            role: default_role(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Authorization header must use the Bearer scheme")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a bearer token to the identity it was issued for
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Identity service client
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    http: reqwest::Client,
    user_url: String,
    api_key: String,
}

impl HttpIdentityClient {
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        let (Some(base_url), Some(api_key)) = (&config.url, &config.api_key) else {
            anyhow::bail!("AUTH_URL and AUTH_API_KEY must be set");
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(IDENTITY_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            user_url: format!("{}{}", base_url.trim_end_matches('/'), USER_ENDPOINT),
            api_key: api_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityClient {
    #[tracing::instrument(skip_all)]
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let response = self
            .http
            .get(&self.user_url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(%status, "Identity service rejected token");
            return Err(AuthError::InvalidToken);
        }
        if status.is_server_error() {
            return Err(AuthError::Unavailable(format!("identity service returned {}", status)));
        }
        if !status.is_success() {
            debug!(%status, "Unexpected identity service status");
            return Err(AuthError::InvalidToken);
        }

        response.json::<Identity>().await.map_err(|e| {
            warn!(error = %e, "Invalid user response from identity service");
            AuthError::InvalidToken
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// Verified caller plus an entity store handle scoped to it
///
/// Every data route takes this extractor; the store handle it carries is the
/// only one handlers use.
#[derive(Clone)]
pub struct AuthContext {
    pub identity: Identity,
    pub store: Arc<dyn EntityStore>,
}

#[axum::async_trait]
impl FromRequestParts<FeatureState> for AuthContext {
    type Rejection = crate::error::AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FeatureState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let identity = state.identity.verify(token).await?;
        let store = state.store.scoped(&identity);

        Ok(Self { identity, store })
    }
}
