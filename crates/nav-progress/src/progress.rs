//! Immutable route-progress snapshots.
//!
//! Route, leg, and step progress are three separate values computed from
//! the same status.  None of them holds or mutates another.

use std::sync::Arc;
use std::time::Duration;

use nav_route::{
    BannerInstruction, LegStep, NavigationRoute, UpcomingRoadObject, VoiceInstruction, Waypoint,
};

use crate::{ProgressError, ProgressResult, RouteState};

// ── RouteProgressState ────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteProgressState {
    Initialized,
    Tracking,
    Complete,
    OffRoute,
    Uncertain,
}

impl RouteProgressState {
    /// Map the engine's route state.  `Invalid` has no progress equivalent.
    pub fn from_route_state(state: RouteState) -> Option<Self> {
        match state {
            RouteState::Invalid     => None,
            RouteState::Initialized => Some(Self::Initialized),
            RouteState::Tracking    => Some(Self::Tracking),
            RouteState::Complete    => Some(Self::Complete),
            RouteState::OffRoute    => Some(Self::OffRoute),
            RouteState::Uncertain   => Some(Self::Uncertain),
        }
    }
}

// ── TravelMetrics ─────────────────────────────────────────────────────────────

/// Distance traveled, fraction traveled, and duration remaining over one
/// scope (route, leg, or step).
///
///   distance_traveled  = max(0, total_distance - distance_remaining)
///   fraction_traveled  = distance_traveled / total_distance   (1.0 if total <= 0)
///   duration_remaining = round((1 - fraction_traveled) * total_duration)
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TravelMetrics {
    pub distance_remaining: f64,
    pub distance_traveled:  f64,
    pub fraction_traveled:  f64,
    pub duration_remaining: Duration,
}

impl TravelMetrics {
    pub fn compute(total_distance: f64, distance_remaining: f64, total_duration: f64) -> Self {
        let measurable = total_distance.is_finite() && distance_remaining.is_finite();
        let distance_traveled = if measurable {
            (total_distance - distance_remaining).max(0.0)
        } else {
            0.0
        };
        let fraction_traveled = if !measurable || total_distance <= 0.0 {
            1.0
        } else {
            (distance_traveled / total_distance).clamp(0.0, 1.0)
        };

        let duration_remaining = if total_duration.is_finite() && total_duration > 0.0 {
            let secs = ((1.0 - fraction_traveled) * total_duration).round().max(0.0);
            Duration::from_secs(secs as u64)
        } else {
            Duration::ZERO
        };

        Self {
            distance_remaining,
            distance_traveled,
            fraction_traveled,
            duration_remaining,
        }
    }
}

// ── RouteStepProgress ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct RouteStepProgress {
    pub step_index: usize,

    /// Index of the banner instruction active within this step.
    pub instruction_index: Option<u32>,

    pub metrics: TravelMetrics,
}

impl RouteStepProgress {
    pub fn new(
        step_index:         usize,
        instruction_index:  Option<u32>,
        step:               &LegStep,
        distance_remaining: f64,
    ) -> Self {
        Self {
            step_index,
            instruction_index,
            metrics: TravelMetrics::compute(step.distance, distance_remaining, step.duration),
        }
    }
}

// ── RouteLegProgress ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct RouteLegProgress {
    pub leg_index: usize,
    pub metrics:   TravelMetrics,
}

impl RouteLegProgress {
    pub fn new(leg_index: usize, leg_distance: f64, leg_duration: f64, distance_remaining: f64) -> Self {
        Self {
            leg_index,
            metrics: TravelMetrics::compute(leg_distance, distance_remaining, leg_duration),
        }
    }
}

// ── RouteProgressParts ────────────────────────────────────────────────────────

/// Inputs to [`RouteProgress::from_parts`].
///
/// `route`, `state`, `leg_progress`, `step_progress`, and `current_step` are
/// required; every other field defaults to empty.
#[derive(Clone, Debug, Default)]
pub struct RouteProgressParts {
    pub route:                    Option<Arc<NavigationRoute>>,
    pub state:                    Option<RouteProgressState>,
    pub route_distance_remaining: f64,
    pub leg_progress:            Option<RouteLegProgress>,
    pub step_progress:           Option<RouteStepProgress>,
    pub current_step:            Option<LegStep>,
    pub previous_step:           Option<LegStep>,
    pub upcoming_step:           Option<LegStep>,
    pub follow_on_step:          Option<LegStep>,
    pub banner_instruction:      Option<BannerInstruction>,
    pub banner_index:            Option<u32>,
    pub voice_instruction:       Option<VoiceInstruction>,
    pub in_tunnel:               bool,
    pub remaining_waypoints:     usize,
    pub upcoming_road_objects:   Vec<UpcomingRoadObject>,
    pub current_leg_destination: Option<Waypoint>,
}

// ── RouteProgress ─────────────────────────────────────────────────────────────

/// Snapshot of the vehicle's progress along the active route.
///
/// Built once per accepted status and never mutated.  Construct only via
/// [`RouteProgress::from_parts`].
#[derive(Clone, Debug, PartialEq)]
pub struct RouteProgress {
    route:                   Arc<NavigationRoute>,
    state:                   RouteProgressState,
    metrics:                 TravelMetrics,
    leg_progress:            RouteLegProgress,
    step_progress:           RouteStepProgress,
    current_step:            LegStep,
    previous_step:           Option<LegStep>,
    upcoming_step:           Option<LegStep>,
    follow_on_step:          Option<LegStep>,
    banner_instruction:      Option<BannerInstruction>,
    banner_index:            Option<u32>,
    voice_instruction:       Option<VoiceInstruction>,
    in_tunnel:               bool,
    remaining_waypoints:     usize,
    upcoming_road_objects:   Vec<UpcomingRoadObject>,
    current_leg_destination: Option<Waypoint>,
}

impl RouteProgress {
    /// Validate `parts` and build the snapshot.
    ///
    /// # Errors
    ///
    /// - [`ProgressError::MissingField`] for an absent required field.
    /// - [`ProgressError::LegOutOfRange`] if the leg index is not a leg of the route.
    /// - [`ProgressError::FractionOutOfRange`] if any scope's fraction is outside `[0, 1]`.
    pub fn from_parts(parts: RouteProgressParts) -> ProgressResult<Self> {
        let route = parts.route.ok_or(ProgressError::MissingField("route"))?;
        let state = parts.state.ok_or(ProgressError::MissingField("state"))?;
        let leg_progress = parts.leg_progress.ok_or(ProgressError::MissingField("leg_progress"))?;
        let step_progress = parts
            .step_progress
            .ok_or(ProgressError::MissingField("step_progress"))?;
        let current_step = parts
            .current_step
            .ok_or(ProgressError::MissingField("current_step"))?;

        if leg_progress.leg_index >= route.legs.len() {
            return Err(ProgressError::LegOutOfRange {
                route: route.id,
                leg:   leg_progress.leg_index,
                legs:  route.legs.len(),
            });
        }

        let metrics = TravelMetrics::compute(
            route.distance,
            parts.route_distance_remaining,
            route.duration,
        );
        for fraction in [
            metrics.fraction_traveled,
            leg_progress.metrics.fraction_traveled,
            step_progress.metrics.fraction_traveled,
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(ProgressError::FractionOutOfRange(fraction));
            }
        }

        Ok(Self {
            route,
            state,
            metrics,
            leg_progress,
            step_progress,
            current_step,
            previous_step: parts.previous_step,
            upcoming_step: parts.upcoming_step,
            follow_on_step: parts.follow_on_step,
            banner_instruction: parts.banner_instruction,
            banner_index: parts.banner_index,
            voice_instruction: parts.voice_instruction,
            in_tunnel: parts.in_tunnel,
            remaining_waypoints: parts.remaining_waypoints,
            upcoming_road_objects: parts.upcoming_road_objects,
            current_leg_destination: parts.current_leg_destination,
        })
    }

    // ── Route scope ───────────────────────────────────────────────────────

    pub fn route(&self) -> &Arc<NavigationRoute> { &self.route }
    pub fn state(&self) -> RouteProgressState { self.state }
    pub fn distance_remaining(&self) -> f64 { self.metrics.distance_remaining }
    pub fn distance_traveled(&self) -> f64 { self.metrics.distance_traveled }
    pub fn fraction_traveled(&self) -> f64 { self.metrics.fraction_traveled }
    pub fn duration_remaining(&self) -> Duration { self.metrics.duration_remaining }
    pub fn remaining_waypoints(&self) -> usize { self.remaining_waypoints }
    pub fn in_tunnel(&self) -> bool { self.in_tunnel }

    // ── Leg and step scope ────────────────────────────────────────────────

    pub fn leg_index(&self) -> usize { self.leg_progress.leg_index }
    pub fn current_leg_progress(&self) -> &RouteLegProgress { &self.leg_progress }
    pub fn current_step_progress(&self) -> &RouteStepProgress { &self.step_progress }
    pub fn current_step(&self) -> &LegStep { &self.current_step }
    pub fn previous_step(&self) -> Option<&LegStep> { self.previous_step.as_ref() }
    pub fn upcoming_step(&self) -> Option<&LegStep> { self.upcoming_step.as_ref() }
    pub fn follow_on_step(&self) -> Option<&LegStep> { self.follow_on_step.as_ref() }
    pub fn current_leg_destination(&self) -> Option<&Waypoint> {
        self.current_leg_destination.as_ref()
    }

    // ── Instructions and road objects ─────────────────────────────────────

    pub fn banner_instruction(&self) -> Option<&BannerInstruction> {
        self.banner_instruction.as_ref()
    }
    pub fn banner_index(&self) -> Option<u32> { self.banner_index }
    pub fn voice_instruction(&self) -> Option<&VoiceInstruction> {
        self.voice_instruction.as_ref()
    }
    pub fn upcoming_road_objects(&self) -> &[UpcomingRoadObject] { &self.upcoming_road_objects }
}
