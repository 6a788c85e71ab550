//! In-process engine for the replay.
//!
//! Statuses come from the script, so this engine only tracks what the
//! session tells it: the primary route, the current leg, and call counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use nav_core::Location;
use nav_route::NavigationRoute;
use nav_session::{EngineError, NavigationEngine, RouteAlternative, TransactionReason};

#[derive(Default)]
pub struct ReplayEngine {
    primary:       Mutex<Option<Arc<NavigationRoute>>>,
    leg:           AtomicUsize,
    fixes:         AtomicUsize,
    route_changes: AtomicUsize,
    refreshes:     AtomicUsize,
}

impl ReplayEngine {
    pub fn fixes(&self) -> usize {
        self.fixes.load(Ordering::Relaxed)
    }

    pub fn route_changes(&self) -> usize {
        self.route_changes.load(Ordering::Relaxed)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::Relaxed)
    }

    pub fn leg(&self) -> usize {
        self.leg.load(Ordering::Relaxed)
    }

    fn alternatives_of(routes: &[Arc<NavigationRoute>]) -> Vec<RouteAlternative> {
        // The replay has no geometry to fork on; alternatives fork at the origin.
        routes
            .iter()
            .map(|r| RouteAlternative { route_id: r.id, fork_distance: 0.0 })
            .collect()
    }
}

#[async_trait]
impl NavigationEngine for ReplayEngine {
    async fn update_location(&self, location: Location) {
        self.fixes.fetch_add(1, Ordering::Relaxed);
        debug!(lat = location.point.lat, lon = location.point.lon, "engine received fix");
    }

    async fn set_routes(
        &self,
        primary:      Option<Arc<NavigationRoute>>,
        leg_index:    usize,
        alternatives: Vec<Arc<NavigationRoute>>,
        reason:       TransactionReason,
    ) -> Result<Vec<RouteAlternative>, EngineError> {
        if let Some(route) = &primary {
            if leg_index >= route.legs.len() {
                return Err(EngineError::new(format!(
                    "leg {leg_index} out of range for {} ({} legs)",
                    route.id,
                    route.legs.len()
                )));
            }
        }
        debug!(%reason, route = ?primary.as_ref().map(|r| r.id), leg_index, "engine routes set");
        *self.primary.lock() = primary;
        self.leg.store(leg_index, Ordering::Relaxed);
        self.route_changes.fetch_add(1, Ordering::Relaxed);
        Ok(Self::alternatives_of(&alternatives))
    }

    async fn set_alternative_routes(&self, routes: Vec<Arc<NavigationRoute>>) -> Vec<RouteAlternative> {
        Self::alternatives_of(&routes)
    }

    async fn refresh_route(&self, route: Arc<NavigationRoute>) -> Result<Vec<RouteAlternative>, EngineError> {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        let mut primary = self.primary.lock();
        match primary.as_ref() {
            Some(current) if current.id == route.id => {
                *primary = Some(route);
                Ok(Vec::new())
            }
            // Alternatives are accepted as-is.
            Some(_) => Ok(Vec::new()),
            None => Err(EngineError::new("no primary route to refresh")),
        }
    }

    async fn update_leg_index(&self, leg_index: usize) -> bool {
        let legs = self.primary.lock().as_ref().map_or(0, |r| r.legs.len());
        if leg_index >= legs {
            debug!(leg_index, legs, "engine rejected leg index");
            return false;
        }
        self.leg.store(leg_index, Ordering::Relaxed);
        true
    }
}
