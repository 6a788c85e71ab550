//! Validated construction of a [`NavigationRoute`].

use std::sync::Arc;

use nav_core::{ensure_non_negative, GeoPoint, RouteId};

use crate::{
    LegStep, NavigationRoute, RoadObject, RouteError, RouteLeg, RouteResult, UpcomingRoadObject,
    Waypoint,
};

/// Construct a [`NavigationRoute`] incrementally, then call
/// [`build`](Self::build).
///
/// Leg and route totals are summed from the steps.  `build()` rejects routes
/// without legs, legs without steps, negative or non-finite step quantities,
/// and waypoint lists that do not bracket every leg.
///
/// # Example
///
/// ```
/// use nav_core::{GeoPoint, RouteId};
/// use nav_route::{LegStep, RouteBuilder};
///
/// let mut b = RouteBuilder::new(RouteId(1));
/// b.add_waypoint("home", GeoPoint::new(52.50, 13.40));
/// b.add_waypoint("work", GeoPoint::new(52.52, 13.41));
/// let leg = b.add_leg();
/// b.add_step(leg, LegStep::new("Main St", 400.0, 40.0));
/// b.add_step(leg, LegStep::new("Oak Ave", 600.0, 50.0));
/// let route = b.build().unwrap();
/// assert_eq!(route.distance, 1_000.0);
/// ```
pub struct RouteBuilder {
    id:           RouteId,
    legs:         Vec<Vec<LegStep>>,
    waypoints:    Vec<Waypoint>,
    road_objects: Vec<UpcomingRoadObject>,
}

impl RouteBuilder {
    pub fn new(id: RouteId) -> Self {
        Self {
            id,
            legs:         Vec::new(),
            waypoints:    Vec::new(),
            road_objects: Vec::new(),
        }
    }

    /// Append a waypoint.  Waypoints are optional, but if any are given
    /// there must be exactly one more than there are legs.
    pub fn add_waypoint(&mut self, name: impl Into<String>, location: GeoPoint) -> &mut Self {
        self.waypoints.push(Waypoint { name: name.into(), location });
        self
    }

    /// Open a new leg and return its index.
    pub fn add_leg(&mut self) -> usize {
        self.legs.push(Vec::new());
        self.legs.len() - 1
    }

    /// Append a step to leg `leg`.
    ///
    /// # Panics
    /// Panics if `leg` was not returned by [`add_leg`](Self::add_leg).
    pub fn add_step(&mut self, leg: usize, step: LegStep) -> &mut Self {
        self.legs[leg].push(step);
        self
    }

    /// Record a road object `distance_to_start` metres from the route origin.
    pub fn add_road_object(&mut self, object: RoadObject, distance_to_start: f64) -> &mut Self {
        self.road_objects.push(UpcomingRoadObject {
            road_object: Arc::new(object),
            distance_to_start,
        });
        self
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    /// Consume the builder and produce a [`NavigationRoute`].
    pub fn build(self) -> RouteResult<NavigationRoute> {
        if self.legs.is_empty() {
            return Err(RouteError::NoLegs(self.id));
        }
        if !self.waypoints.is_empty() && self.waypoints.len() != self.legs.len() + 1 {
            return Err(RouteError::WaypointMismatch {
                route:     self.id,
                legs:      self.legs.len(),
                waypoints: self.waypoints.len(),
            });
        }

        let mut legs = Vec::with_capacity(self.legs.len());
        for (i, steps) in self.legs.into_iter().enumerate() {
            if steps.is_empty() {
                return Err(RouteError::EmptyLeg { route: self.id, leg: i });
            }
            let mut distance = 0.0;
            let mut duration = 0.0;
            for step in &steps {
                distance += ensure_non_negative("step distance", step.distance)?;
                duration += ensure_non_negative("step duration", step.duration)?;
            }
            legs.push(RouteLeg { steps, distance, duration });
        }

        let distance = legs.iter().map(|l| l.distance).sum();
        let duration = legs.iter().map(|l| l.duration).sum();

        Ok(NavigationRoute {
            id: self.id,
            legs,
            distance,
            duration,
            waypoints: self.waypoints,
            upcoming_road_objects: self.road_objects,
        })
    }
}
