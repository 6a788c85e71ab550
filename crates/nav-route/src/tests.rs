//! Unit tests for nav-route.

use std::sync::Arc;

use nav_core::{GeoPoint, RoadObjectId, RouteId};

use crate::{
    updated_objects_ahead, BannerInstruction, LegStep, RoadObject, RoadObjectKind,
    RoadObjectUpdate, RouteBuilder, RouteError, UpcomingRoadObject,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Two legs: A → B (2 steps, 300 m), B → C (1 step, 200 m).
fn two_leg_builder() -> RouteBuilder {
    let mut b = RouteBuilder::new(RouteId(1));
    b.add_waypoint("A", GeoPoint::new(0.0, 0.0));
    b.add_waypoint("B", GeoPoint::new(0.0, 0.003));
    b.add_waypoint("C", GeoPoint::new(0.0, 0.005));
    let first = b.add_leg();
    b.add_step(first, LegStep::new("First St", 100.0, 10.0));
    b.add_step(first, LegStep::new("Second St", 200.0, 20.0));
    let second = b.add_leg();
    b.add_step(second, LegStep::new("Third St", 200.0, 25.0));
    b
}

fn object(id: u64, kind: RoadObjectKind) -> UpcomingRoadObject {
    UpcomingRoadObject {
        road_object:       Arc::new(RoadObject { id: RoadObjectId(id), kind, length: None }),
        distance_to_start: 1_000.0,
    }
}

// ── RouteBuilder ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;

    #[test]
    fn totals_are_summed_from_steps() {
        let route = two_leg_builder().build().unwrap();
        assert_eq!(route.legs.len(), 2);
        assert_eq!(route.legs[0].distance, 300.0);
        assert_eq!(route.legs[0].duration, 30.0);
        assert_eq!(route.distance, 500.0);
        assert_eq!(route.duration, 55.0);
    }

    #[test]
    fn no_legs_errors() {
        let result = RouteBuilder::new(RouteId(3)).build();
        assert!(matches!(result, Err(RouteError::NoLegs(RouteId(3)))));
    }

    #[test]
    fn empty_leg_errors() {
        let mut b = RouteBuilder::new(RouteId(1));
        b.add_leg();
        assert!(matches!(b.build(), Err(RouteError::EmptyLeg { leg: 0, .. })));
    }

    #[test]
    fn waypoint_count_must_bracket_legs() {
        let mut b = RouteBuilder::new(RouteId(1));
        b.add_waypoint("only", GeoPoint::new(0.0, 0.0));
        let leg = b.add_leg();
        b.add_step(leg, LegStep::new("x", 10.0, 1.0));
        assert!(matches!(
            b.build(),
            Err(RouteError::WaypointMismatch { legs: 1, waypoints: 1, .. })
        ));
    }

    #[test]
    fn negative_step_distance_errors() {
        let mut b = RouteBuilder::new(RouteId(1));
        let leg = b.add_leg();
        b.add_step(leg, LegStep::new("x", -5.0, 1.0));
        assert!(matches!(b.build(), Err(RouteError::Quantity(_))));
    }

    #[test]
    fn road_objects_are_carried() {
        let mut b = two_leg_builder();
        b.add_road_object(
            RoadObject { id: RoadObjectId(9), kind: RoadObjectKind::Tunnel, length: Some(80.0) },
            150.0,
        );
        let route = b.build().unwrap();
        assert_eq!(route.upcoming_road_objects.len(), 1);
        assert_eq!(route.upcoming_road_objects[0].distance_to_start, 150.0);
    }
}

// ── NavigationRoute lookups ───────────────────────────────────────────────────

#[cfg(test)]
mod lookups {
    use super::*;

    #[test]
    fn out_of_range_lookups_are_none() {
        let route = two_leg_builder().build().unwrap();
        assert!(route.leg(2).is_none());
        assert!(route.step(0, 2).is_none());
        assert!(route.step(5, 0).is_none());
        assert!(route.banner_at(0, 0, 0).is_none());
    }

    #[test]
    fn banner_lookup_by_index() {
        let mut b = RouteBuilder::new(RouteId(1));
        let leg = b.add_leg();
        b.add_step(
            leg,
            LegStep::new("x", 100.0, 10.0)
                .with_banner(BannerInstruction::primary("Turn left", 100.0))
                .with_banner(BannerInstruction::primary("Turn left now", 20.0)),
        );
        let route = b.build().unwrap();
        assert_eq!(route.banner_at(0, 0, 1).unwrap().primary.text, "Turn left now");
    }

    #[test]
    fn leg_destination_is_next_waypoint() {
        let route = two_leg_builder().build().unwrap();
        assert_eq!(route.leg_destination(0).unwrap().name, "B");
        assert_eq!(route.leg_destination(1).unwrap().name, "C");
        assert!(route.leg_destination(2).is_none());
    }

    #[test]
    fn remaining_waypoints_saturates() {
        let route = two_leg_builder().build().unwrap();
        assert_eq!(route.remaining_waypoints(1), 2);
        assert_eq!(route.remaining_waypoints(3), 0);
        assert_eq!(route.remaining_waypoints(10), 0);
    }
}

// ── Road objects ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod road_objects {
    use super::*;

    #[test]
    fn keeps_only_updated_objects_in_update_order() {
        let existing = vec![
            object(0, RoadObjectKind::Incident),
            object(1, RoadObjectKind::Bridge),
            object(2, RoadObjectKind::Tunnel),
        ];
        let updates = [
            RoadObjectUpdate { id: RoadObjectId(0), distance_to_start: 4.0 },
            RoadObjectUpdate { id: RoadObjectId(2), distance_to_start: 8.0 },
        ];

        let ahead = updated_objects_ahead(&existing, &updates);

        assert_eq!(ahead.len(), 2);
        assert_eq!(ahead[0].distance_to_start, 4.0);
        assert_eq!(ahead[1].distance_to_start, 8.0);
        assert!(Arc::ptr_eq(&ahead[0].road_object, &existing[0].road_object));
        assert!(Arc::ptr_eq(&ahead[1].road_object, &existing[2].road_object));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let existing = vec![object(0, RoadObjectKind::Incident)];
        let updates = [RoadObjectUpdate { id: RoadObjectId(77), distance_to_start: 1.0 }];
        assert!(updated_objects_ahead(&existing, &updates).is_empty());
    }
}
