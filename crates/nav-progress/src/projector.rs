//! Pure status → progress projection.

use std::sync::Arc;

use nav_route::{BannerInstruction, NavigationRoute, UpcomingRoadObject, VoiceInstruction, Waypoint};

use crate::{
    RouteLegProgress, RouteProgress, RouteProgressParts, RouteProgressState, RouteStepProgress,
    TripStatus,
};

/// Session-side inputs to a projection, gathered by the caller before the
/// call so the projection itself reads no shared state.
#[derive(Clone, Debug, Default)]
pub struct ProjectionContext<'a> {
    pub remaining_waypoints: usize,

    /// The latest delivered banner and its stable index.
    pub banner:       Option<&'a BannerInstruction>,
    pub banner_index: Option<u32>,

    /// Used when the status itself carries no voice instruction.
    pub last_voice: Option<&'a VoiceInstruction>,

    pub upcoming_road_objects:   Vec<UpcomingRoadObject>,
    pub current_leg_destination: Option<Waypoint>,
}

/// Builds a [`RouteProgress`] from a status and the active route.
///
/// Stateless; every call is independent.
#[derive(Copy, Clone, Debug, Default)]
pub struct RouteProgressProjector;

impl RouteProgressProjector {
    /// Project `status` onto `route`.
    ///
    /// Returns `None` (no progress this cycle, not an error) when:
    /// - there is no active route,
    /// - the route state is `Invalid`,
    /// - the status references a different route than the active one,
    /// - the status's leg or step index is not on the active route.
    pub fn project(
        &self,
        status: &TripStatus,
        route:  Option<&Arc<NavigationRoute>>,
        ctx:    ProjectionContext<'_>,
    ) -> Option<RouteProgress> {
        let route = route?;
        let state = RouteProgressState::from_route_state(status.route_state)?;
        if status.route_id != Some(route.id) {
            return None;
        }

        let leg = route.leg(status.leg_index)?;
        let step_index = status.step_index;
        let current_step = leg.step(step_index)?;

        // Positional lookups; out-of-range yields None.
        let previous_step = step_index.checked_sub(1).and_then(|i| leg.step(i)).cloned();
        let upcoming_step = leg.step(step_index + 1).cloned();
        let follow_on_step = leg.step(step_index + 2).cloned();

        let step_progress = RouteStepProgress::new(
            step_index,
            ctx.banner_index,
            current_step,
            status.step_distance_remaining,
        );
        let leg_progress = RouteLegProgress::new(
            status.leg_index,
            leg.distance,
            leg.duration,
            status.leg_distance_remaining,
        );

        let voice_instruction = status
            .voice_instruction
            .clone()
            .or_else(|| ctx.last_voice.cloned());

        RouteProgress::from_parts(RouteProgressParts {
            route: Some(Arc::clone(route)),
            state: Some(state),
            route_distance_remaining: status.route_distance_remaining,
            leg_progress: Some(leg_progress),
            step_progress: Some(step_progress),
            current_step: Some(current_step.clone()),
            previous_step,
            upcoming_step,
            follow_on_step,
            banner_instruction: ctx.banner.cloned(),
            banner_index: ctx.banner_index,
            voice_instruction,
            in_tunnel: status.in_tunnel,
            remaining_waypoints: ctx.remaining_waypoints,
            upcoming_road_objects: ctx.upcoming_road_objects,
            current_leg_destination: ctx.current_leg_destination,
        })
        .ok()
    }
}
