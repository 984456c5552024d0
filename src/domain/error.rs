//! Domain Error Types
//!
//! Record validation errors raised at the storage boundary.

use thiserror::Error;

/// Reasons a record is rejected before it is written or after it is read
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// A numeric field that must not go below zero
    #[error("Field '{field}' must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// A floating point field that is NaN or infinite
    #[error("Field '{0}' must be a finite number")]
    NotFinite(&'static str),
}

/// Reject empty or whitespace-only text
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

/// Reject negative numbers
pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite(field));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}
