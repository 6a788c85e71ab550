//! The replay file format.
//!
//! A replay is a session config, a set of routes, and a list of events fed
//! to the session in order.  Statuses are written in a compact form and
//! expanded into full `TripStatus` values against the route they name.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use nav_core::{GeoPoint, Location, RoadObjectId, RouteId, SessionConfig};
use nav_progress::{RouteState, TripStatus};
use nav_route::{
    BannerInstruction, LegStep, NavigationRoute, RoadObject, RoadObjectKind, RoadObjectUpdate,
    RouteBuilder, VoiceInstruction,
};
use nav_session::{FallbackVersionsEvent, SetRoutes};

// ── Top level ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub session: SessionConfig,

    pub routes: Vec<RouteSpec>,

    /// Route handed to the session when the reroute trigger fires.
    #[serde(default)]
    pub reroute_to: Option<u64>,

    pub events: Vec<ScriptEvent>,
}

impl ReplayConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing replay config")
    }

    /// Build every route in the file, validating each.
    pub fn build_routes(&self) -> Result<Vec<Arc<NavigationRoute>>> {
        self.routes
            .iter()
            .map(|spec| {
                spec.build()
                    .map(Arc::new)
                    .with_context(|| format!("building route {}", spec.id))
            })
            .collect()
    }
}

// ── Routes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RouteSpec {
    pub id:        u64,
    pub waypoints: Vec<WaypointSpec>,
    pub legs:      Vec<Vec<StepSpec>>,

    #[serde(default)]
    pub road_objects: Vec<RoadObjectSpec>,
}

#[derive(Debug, Deserialize)]
pub struct WaypointSpec {
    pub name: String,
    pub lat:  f64,
    pub lon:  f64,
}

#[derive(Debug, Deserialize)]
pub struct StepSpec {
    pub name:     String,
    pub distance: f64,
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct RoadObjectSpec {
    pub id:       u64,
    pub kind:     RoadObjectKind,
    #[serde(default)]
    pub length:   Option<f64>,
    /// Metres from the route origin.
    pub at:       f64,
}

impl RouteSpec {
    fn build(&self) -> Result<NavigationRoute> {
        let mut b = RouteBuilder::new(RouteId(self.id));
        for w in &self.waypoints {
            b.add_waypoint(w.name.clone(), GeoPoint::new(w.lat, w.lon));
        }
        for steps in &self.legs {
            let leg = b.add_leg();
            for s in steps {
                b.add_step(leg, LegStep::new(s.name.clone(), s.distance, s.duration));
            }
        }
        for o in &self.road_objects {
            b.add_road_object(
                RoadObject { id: RoadObjectId(o.id), kind: o.kind, length: o.length },
                o.at,
            );
        }
        Ok(b.build()?)
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    Start,
    Stop,
    /// Move the session clock forward.
    Wait { secs: u64 },
    SetRoutes {
        routes: Vec<u64>,
        #[serde(default)]
        reason: ReasonSpec,
        #[serde(default)]
        leg_index: usize,
    },
    LegIndex { leg_index: usize },
    Fix { lat: f64, lon: f64 },
    Status(StatusSpec),
    FallbackVersions { update: FallbackVersionsEvent },
}

#[derive(Copy, Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonSpec {
    CleanUp,
    #[default]
    NewRoutes,
    Reroute,
    Alternatives,
    Reorder,
    Refresh,
}

impl ReasonSpec {
    pub fn with_leg_index(self, leg_index: usize) -> SetRoutes {
        match self {
            ReasonSpec::CleanUp      => SetRoutes::CleanUp,
            ReasonSpec::NewRoutes    => SetRoutes::NewRoutes { initial_leg_index: leg_index },
            ReasonSpec::Reroute      => SetRoutes::Reroute { initial_leg_index: leg_index },
            ReasonSpec::Alternatives => SetRoutes::Alternatives,
            ReasonSpec::Reorder      => SetRoutes::Reorder { leg_index },
            ReasonSpec::Refresh      => SetRoutes::RefreshRoutes,
        }
    }
}

/// A status as the engine would report it, minus the fields the replay
/// never varies.
#[derive(Debug, Deserialize)]
pub struct StatusSpec {
    pub route:          u64,
    pub lat:            f64,
    pub lon:            f64,
    pub remaining:      f64,
    #[serde(default)]
    pub leg_index:      usize,
    #[serde(default)]
    pub step_index:     usize,
    pub step_remaining: f64,
    #[serde(default)]
    pub off_route:      bool,
    #[serde(default)]
    pub banner:         Option<String>,
    #[serde(default)]
    pub banner_index:   Option<u32>,
    #[serde(default)]
    pub voice:          Option<String>,
    #[serde(default)]
    pub alerts:         Vec<(u64, f64)>,
    #[serde(default)]
    pub layer:          Option<i32>,
}

impl StatusSpec {
    /// Expand into a full status.  `elapsed` becomes the fix's monotonic
    /// timestamp.
    pub fn to_status(&self, routes: &[Arc<NavigationRoute>], elapsed: Duration) -> Result<TripStatus> {
        let Some(route) = routes.iter().find(|r| r.id == RouteId(self.route)) else {
            bail!("status references unknown route {}", self.route);
        };
        let Some(leg) = route.leg(self.leg_index) else {
            bail!("status references leg {} of route {}", self.leg_index, self.route);
        };
        let before_leg: f64 = route.legs[..self.leg_index].iter().map(|l| l.distance).sum();
        let after_leg = route.distance - before_leg - leg.distance;
        let leg_remaining = (self.remaining - after_leg).max(0.0);

        Ok(TripStatus {
            key_points: Vec::new(),
            route_id: Some(route.id),
            route_state: if self.off_route { RouteState::OffRoute } else { RouteState::Tracking },
            leg_index: self.leg_index,
            step_index: self.step_index,
            route_distance_remaining: self.remaining,
            leg_distance_remaining: leg_remaining,
            step_distance_remaining: self.step_remaining,
            banner_instruction: self
                .banner
                .as_ref()
                .map(|text| BannerInstruction::primary(text.clone(), self.step_remaining)),
            banner_index: self.banner_index,
            voice_instruction: self
                .voice
                .as_ref()
                .map(|text| VoiceInstruction::new(text.clone(), self.step_remaining)),
            next_waypoint_index: self.leg_index + 1,
            upcoming_alert_updates: self
                .alerts
                .iter()
                .map(|&(id, distance_to_start)| RoadObjectUpdate { id: RoadObjectId(id), distance_to_start })
                .collect(),
            layer: self.layer,
            road_edge_match_probability: 1.0,
            ..TripStatus::at(Location::at(GeoPoint::new(self.lat, self.lon), elapsed))
        })
    }
}
