//! The external positioning and routing engine, as seen by the session.
//!
//! The engine is an injected collaborator.  It produces status snapshots by
//! pushing them into the session's [`StatusSink`](crate::StatusSink); the
//! session calls back into it for location fixes and route changes.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use nav_core::{Location, RouteId};
use nav_route::NavigationRoute;

use crate::TransactionReason;

/// An error message returned by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An alternative route as tracked by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteAlternative {
    pub route_id: RouteId,

    /// Distance from the primary route's origin to where the alternative forks off.
    pub fork_distance: f64,
}

/// Operations the session needs from the engine.
///
/// Implementations must be cheap to share: the session holds one
/// `Arc<dyn NavigationEngine>` and calls it from several tasks.
#[async_trait]
pub trait NavigationEngine: Send + Sync {
    /// Begin producing statuses.  Called once per `start()`.
    async fn start_session(&self) {}

    /// Stop producing statuses.
    async fn stop_session(&self) {}

    /// Feed a raw positioning fix.
    async fn update_location(&self, location: Location);

    async fn set_routes(
        &self,
        primary:      Option<Arc<NavigationRoute>>,
        leg_index:    usize,
        alternatives: Vec<Arc<NavigationRoute>>,
        reason:       TransactionReason,
    ) -> Result<Vec<RouteAlternative>, EngineError>;

    async fn set_alternative_routes(&self, routes: Vec<Arc<NavigationRoute>>) -> Vec<RouteAlternative>;

    async fn refresh_route(&self, route: Arc<NavigationRoute>) -> Result<Vec<RouteAlternative>, EngineError>;

    /// Switch to leg `leg_index` of the active route.  `true` on success.
    async fn update_leg_index(&self, leg_index: usize) -> bool;
}

// ── SetRoutes ─────────────────────────────────────────────────────────────────

/// Why the route list is being replaced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SetRoutes {
    /// Drop every route.
    CleanUp,
    NewRoutes { initial_leg_index: usize },
    Reroute { initial_leg_index: usize },
    /// Replace only the alternatives; the primary route stays active.
    Alternatives,
    /// Same routes, different primary.
    Reorder { leg_index: usize },
    /// Updated annotations for the routes already set.
    RefreshRoutes,
}

impl SetRoutes {
    pub fn transaction_reason(self) -> TransactionReason {
        match self {
            SetRoutes::CleanUp          => TransactionReason::CleanUp,
            SetRoutes::NewRoutes { .. } => TransactionReason::NewRoute,
            SetRoutes::Reroute { .. }   => TransactionReason::Reroute,
            SetRoutes::Alternatives     => TransactionReason::AlternativesOnly,
            SetRoutes::Reorder { .. }   => TransactionReason::Reorder,
            SetRoutes::RefreshRoutes    => TransactionReason::Refresh,
        }
    }

    /// Leg the engine should start tracking on the new primary route.
    pub fn initial_leg_index(self) -> usize {
        match self {
            SetRoutes::NewRoutes { initial_leg_index } | SetRoutes::Reroute { initial_leg_index } => {
                initial_leg_index
            }
            SetRoutes::Reorder { leg_index } => leg_index,
            SetRoutes::CleanUp | SetRoutes::Alternatives | SetRoutes::RefreshRoutes => 0,
        }
    }
}

/// A route replacement that took effect.
#[derive(Clone, Debug)]
pub struct SetRoutesValue {
    pub routes:       Vec<Arc<NavigationRoute>>,
    pub alternatives: Vec<RouteAlternative>,
}
