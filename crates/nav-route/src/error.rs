//! Route-model error type.

use thiserror::Error;

use nav_core::{NavError, RouteId};

/// Errors produced while building or validating a route.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route {0} has no legs")]
    NoLegs(RouteId),

    #[error("leg {leg} of route {route} has no steps")]
    EmptyLeg { route: RouteId, leg: usize },

    #[error("route {route} has {waypoints} waypoints for {legs} legs (expected legs + 1)")]
    WaypointMismatch {
        route:     RouteId,
        legs:      usize,
        waypoints: usize,
    },

    #[error("invalid route quantity: {0}")]
    Quantity(#[from] NavError),
}

pub type RouteResult<T> = Result<T, RouteError>;
