//! Shared utilities and types for feature modules
//!
//! - **body**: Optional JSON request bodies
//! - **validation**: Input validation utilities
//! - **test_helpers**: In-memory application state for route tests (test-only)

pub mod body;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use body::json_or_default;
pub use validation::{validate_confidence, validate_required, ValidationError};
