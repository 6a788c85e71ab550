//! Route, leg, and step model.
//!
//! A route is divided into legs (between waypoints); each leg is divided into
//! steps (single maneuvers).  All distances are metres, all durations are
//! seconds.  Do not construct `NavigationRoute` directly; use
//! [`RouteBuilder`][crate::RouteBuilder] so totals and waypoint counts are
//! checked.

use nav_core::{GeoPoint, RouteId};

use crate::{BannerInstruction, UpcomingRoadObject, VoiceInstruction};

// ── Waypoint ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub name:     String,
    pub location: GeoPoint,
}

// ── LegStep ───────────────────────────────────────────────────────────────────

/// A single maneuver and the road stretch leading to the next one.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegStep {
    /// Road name.
    pub name: String,

    /// Length of the step in metres.
    pub distance: f64,

    /// Typical travel time in seconds.
    pub duration: f64,

    /// Banners for this step, in the order the engine indexes them.
    pub banner_instructions: Vec<BannerInstruction>,

    /// Spoken announcements for this step.
    pub voice_instructions: Vec<VoiceInstruction>,
}

impl LegStep {
    /// A step with no instructions attached.
    pub fn new(name: impl Into<String>, distance: f64, duration: f64) -> Self {
        Self {
            name: name.into(),
            distance,
            duration,
            banner_instructions: Vec::new(),
            voice_instructions:  Vec::new(),
        }
    }

    pub fn with_banner(mut self, banner: BannerInstruction) -> Self {
        self.banner_instructions.push(banner);
        self
    }

    pub fn with_voice(mut self, voice: VoiceInstruction) -> Self {
        self.voice_instructions.push(voice);
        self
    }
}

// ── RouteLeg ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteLeg {
    pub steps: Vec<LegStep>,

    /// Sum of step distances, metres.
    pub distance: f64,

    /// Sum of step durations, seconds.
    pub duration: f64,
}

impl RouteLeg {
    /// Step at `index`, or `None` when out of range.
    #[inline]
    pub fn step(&self, index: usize) -> Option<&LegStep> {
        self.steps.get(index)
    }
}

// ── NavigationRoute ───────────────────────────────────────────────────────────

/// A complete route as handed to the navigation engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationRoute {
    pub id: RouteId,

    pub legs: Vec<RouteLeg>,

    /// Total length in metres.
    pub distance: f64,

    /// Total typical travel time in seconds.
    pub duration: f64,

    /// Origin, intermediate stops, and destination.  Either empty or exactly
    /// `legs.len() + 1` entries.
    pub waypoints: Vec<Waypoint>,

    /// Road objects known along the route when it was computed.
    pub upcoming_road_objects: Vec<UpcomingRoadObject>,
}

impl NavigationRoute {
    /// Leg at `index`, or `None` when out of range.
    #[inline]
    pub fn leg(&self, index: usize) -> Option<&RouteLeg> {
        self.legs.get(index)
    }

    /// Step `step_index` of leg `leg_index`.
    #[inline]
    pub fn step(&self, leg_index: usize, step_index: usize) -> Option<&LegStep> {
        self.leg(leg_index).and_then(|leg| leg.step(step_index))
    }

    /// Banner `banner_index` of the given step.
    pub fn banner_at(
        &self,
        leg_index:    usize,
        step_index:   usize,
        banner_index: usize,
    ) -> Option<&BannerInstruction> {
        self.step(leg_index, step_index)
            .and_then(|step| step.banner_instructions.get(banner_index))
    }

    /// The waypoint that ends leg `leg_index`.
    #[inline]
    pub fn leg_destination(&self, leg_index: usize) -> Option<&Waypoint> {
        self.waypoints.get(leg_index + 1)
    }

    /// Number of waypoints still ahead when the next one to reach is
    /// `next_waypoint_index`.  Saturates at 0.
    #[inline]
    pub fn remaining_waypoints(&self, next_waypoint_index: usize) -> usize {
        self.waypoints.len().saturating_sub(next_waypoint_index)
    }
}
