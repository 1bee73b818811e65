//! Shared validation utilities

use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required and cannot be empty")]
    Required { field: &'static str },

    #[error("confidence must be between 0 and 1, got {0}")]
    ConfidenceOutOfRange(f64),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Reject empty or whitespace-only strings
pub fn validate_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

/// Label confidence, when present, must be a finite value in `[0, 1]`
pub fn validate_confidence(confidence: Option<f64>) -> Result<(), ValidationError> {
    match confidence {
        Some(value) if !(0.0..=1.0).contains(&value) => {
            Err(ValidationError::ConfidenceOutOfRange(value))
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "reviews").is_ok());
        assert_eq!(
            validate_required("name", "   "),
            Err(ValidationError::Required { field: "name" })
        );
        assert_eq!(
            validate_required("name", "").unwrap_err().to_string(),
            "name is required and cannot be empty"
        );
    }

    #[test]
    fn test_validate_confidence_bounds() {
        assert!(validate_confidence(None).is_ok());
        assert!(validate_confidence(Some(0.0)).is_ok());
        assert!(validate_confidence(Some(0.5)).is_ok());
        assert!(validate_confidence(Some(1.0)).is_ok());
        assert!(validate_confidence(Some(1.01)).is_err());
        assert!(validate_confidence(Some(-0.1)).is_err());
        assert!(validate_confidence(Some(f64::NAN)).is_err());
        assert!(validate_confidence(Some(f64::INFINITY)).is_err());
    }
}
