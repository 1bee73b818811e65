//! Optional JSON request bodies

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use super::validation::ValidationError;

/// Decode a body that may be omitted
///
/// An empty (or whitespace-only) body yields `T::default()`. Anything else
/// must be valid JSON for `T`.
pub fn json_or_default<T>(body: &Bytes) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ValidationError::InvalidBody(e.to_string()))
}
