//! Workspace error type.
//!
//! Sub-crates define their own error enums and wrap `NavError` as one
//! variant where they need to surface a core failure.

use thiserror::Error;

/// The top-level error type for `nav-core`.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{what} must be finite and non-negative, got {value}")]
    InvalidQuantity { what: &'static str, value: f64 },
}

/// Shorthand result type for `nav-core`.
pub type NavResult<T> = Result<T, NavError>;

/// Reject NaN, infinities, and negative values for a named quantity.
pub fn ensure_non_negative(what: &'static str, value: f64) -> NavResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(NavError::InvalidQuantity { what, value })
    }
}
