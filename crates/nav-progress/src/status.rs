//! Status snapshots as ingested from the positioning engine.

use nav_core::{Location, RouteId};
use nav_route::{BannerInstruction, RoadObjectUpdate, VoiceInstruction};

/// Route-tracking state reported by the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteState {
    /// No route, or the engine has not resolved its route reference yet.
    #[default]
    Invalid,
    Initialized,
    Tracking,
    Complete,
    OffRoute,
    Uncertain,
}

/// One status snapshot from the positioning engine.
///
/// The session only reads it.  Distances are metres remaining, measured by
/// the engine against the route identified by `route_id`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TripStatus {
    /// Map-matched position.
    pub location: Location,

    /// Predicted positions ahead of `location`.
    pub key_points: Vec<Location>,

    /// The route the engine computed this status against.  `None` while no
    /// route is set.
    pub route_id: Option<RouteId>,

    pub route_state: RouteState,

    pub leg_index:  usize,
    pub step_index: usize,

    pub route_distance_remaining: f64,
    pub leg_distance_remaining:   f64,
    pub step_distance_remaining:  f64,

    /// Banner the engine considers current, with its stable index within the step.
    pub banner_instruction: Option<BannerInstruction>,
    pub banner_index:       Option<u32>,

    /// Present only on the status where the engine triggers a new announcement.
    pub voice_instruction: Option<VoiceInstruction>,

    /// Index into the route's waypoints of the next waypoint to reach.
    pub next_waypoint_index: usize,

    /// Fresh distances for road objects still ahead.
    pub upcoming_alert_updates: Vec<RoadObjectUpdate>,

    pub in_tunnel: bool,

    /// Z-level of the matched road, for stacked roads.
    pub layer: Option<i32>,

    pub off_road_probability:        f32,
    pub road_edge_match_probability: f32,
    pub is_teleport:                 bool,

    /// The engine matched against fallback map data.
    pub is_fallback: bool,
}

impl TripStatus {
    /// A status with no route: `Invalid` state and zeroed progress fields.
    pub fn at(location: Location) -> Self {
        Self {
            location,
            key_points: Vec::new(),
            route_id: None,
            route_state: RouteState::Invalid,
            leg_index: 0,
            step_index: 0,
            route_distance_remaining: 0.0,
            leg_distance_remaining: 0.0,
            step_distance_remaining: 0.0,
            banner_instruction: None,
            banner_index: None,
            voice_instruction: None,
            next_waypoint_index: 0,
            upcoming_alert_updates: Vec::new(),
            in_tunnel: false,
            layer: None,
            off_road_probability: 0.0,
            road_edge_match_probability: 0.0,
            is_teleport: false,
            is_fallback: false,
        }
    }

    #[inline]
    pub fn is_off_route(&self) -> bool {
        self.route_state == RouteState::OffRoute
    }
}

// ── LocationMatcherResult ─────────────────────────────────────────────────────

/// The matched-location view of a status, published on every status.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationMatcherResult {
    pub enhanced_location: Location,
    pub key_points: Vec<Location>,
    pub is_off_road: bool,
    pub off_road_probability: f32,
    pub is_teleport: bool,
    pub road_edge_match_probability: f32,
    pub z_level: Option<i32>,
    pub is_degraded_map_matching: bool,
}

impl LocationMatcherResult {
    /// Off-road is declared above this probability.
    pub const OFF_ROAD_THRESHOLD: f32 = 0.5;

    pub fn from_status(status: &TripStatus) -> Self {
        Self {
            enhanced_location: status.location.clone(),
            key_points: status.key_points.clone(),
            is_off_road: status.off_road_probability > Self::OFF_ROAD_THRESHOLD,
            off_road_probability: status.off_road_probability,
            is_teleport: status.is_teleport,
            road_edge_match_probability: status.road_edge_match_probability,
            z_level: status.layer,
            is_degraded_map_matching: status.is_fallback,
        }
    }
}
