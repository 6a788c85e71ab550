use thiserror::Error;

use nav_core::RouteId;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("route progress is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("leg {leg} out of range for route {route} ({legs} legs)")]
    LegOutOfRange { route: RouteId, leg: usize, legs: usize },

    #[error("fraction traveled {0} outside [0, 1]")]
    FractionOutOfRange(f64),
}

pub type ProgressResult<T> = Result<T, ProgressError>;
