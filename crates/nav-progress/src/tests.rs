//! Unit tests for nav-progress.

use std::sync::Arc;
use std::time::Duration;

use nav_core::{GeoPoint, Location, RouteId};
use nav_route::{BannerInstruction, LegStep, NavigationRoute, RouteBuilder, VoiceInstruction};

use crate::{
    LocationMatcherResult, ProgressError, ProjectionContext, RouteProgress, RouteProgressParts,
    RouteProgressProjector, RouteProgressState, RouteState, TravelMetrics, TripStatus,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Single leg of four 25 m / 10 s steps: 100 m, 40 s total.
fn straight_route() -> Arc<NavigationRoute> {
    let mut b = RouteBuilder::new(RouteId(1));
    b.add_waypoint("start", GeoPoint::new(0.0, 0.0));
    b.add_waypoint("end", GeoPoint::new(0.0, 0.001));
    let leg = b.add_leg();
    for name in ["a", "b", "c", "d"] {
        b.add_step(leg, LegStep::new(name, 25.0, 10.0));
    }
    Arc::new(b.build().unwrap())
}

fn tracking_status(route_remaining: f64, step_index: usize, step_remaining: f64) -> TripStatus {
    TripStatus {
        route_id: Some(RouteId(1)),
        route_state: RouteState::Tracking,
        step_index,
        route_distance_remaining: route_remaining,
        leg_distance_remaining: route_remaining,
        step_distance_remaining: step_remaining,
        next_waypoint_index: 1,
        ..TripStatus::at(Location::at(GeoPoint::new(0.0, 0.0), Duration::ZERO))
    }
}

fn project(status: &TripStatus, route: &Arc<NavigationRoute>) -> Option<RouteProgress> {
    RouteProgressProjector.project(status, Some(route), ProjectionContext::default())
}

// ── TravelMetrics ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod metrics {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn basic_progress() {
        let m = TravelMetrics::compute(100.0, 40.0, 50.0);
        assert_eq!(m.distance_traveled, 60.0);
        assert!((m.fraction_traveled - 0.6).abs() < 1e-12);
        assert_eq!(m.duration_remaining, Duration::from_secs(20));
    }

    #[test]
    fn remaining_above_total_clamps_to_zero_traveled() {
        let m = TravelMetrics::compute(100.0, 140.0, 50.0);
        assert_eq!(m.distance_traveled, 0.0);
        assert_eq!(m.fraction_traveled, 0.0);
        assert_eq!(m.duration_remaining, Duration::from_secs(50));
    }

    #[test]
    fn zero_total_distance_is_fully_traveled() {
        let m = TravelMetrics::compute(0.0, 0.0, 30.0);
        assert_eq!(m.fraction_traveled, 1.0);
        assert_eq!(m.duration_remaining, Duration::ZERO);
    }

    #[test]
    fn unmeasurable_distance_defaults_to_one() {
        let m = TravelMetrics::compute(f64::NAN, 10.0, 30.0);
        assert_eq!(m.fraction_traveled, 1.0);
        assert!(!m.fraction_traveled.is_nan());
    }

    #[test]
    fn missing_duration_defaults_to_zero() {
        let m = TravelMetrics::compute(100.0, 50.0, f64::NAN);
        assert_eq!(m.duration_remaining, Duration::ZERO);
    }

    #[test]
    fn duration_is_rounded_to_whole_seconds() {
        // (1 - 0.25) * 9 = 6.75 → 7
        let m = TravelMetrics::compute(100.0, 75.0, 9.0);
        assert_eq!(m.duration_remaining, Duration::from_secs(7));
    }

    #[test]
    fn random_steps_stay_within_bounds() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let total: f64 = rng.gen_range(0.5..5_000.0);
            let remaining: f64 = rng.gen_range(0.0..=total * 1.5);
            let m = TravelMetrics::compute(total, remaining, 600.0);

            assert!((0.0..=1.0).contains(&m.fraction_traveled));
            if remaining <= total {
                assert!((m.distance_traveled - (total - remaining)).abs() < 1e-9);
            } else {
                assert_eq!(m.distance_traveled, 0.0);
            }
        }
    }
}

// ── RouteProgress factory ─────────────────────────────────────────────────────

#[cfg(test)]
mod factory {
    use super::*;

    #[test]
    fn missing_route_is_named() {
        let err = RouteProgress::from_parts(RouteProgressParts::default()).unwrap_err();
        assert!(matches!(err, ProgressError::MissingField("route")));
    }

    #[test]
    fn missing_leg_progress_is_named() {
        let parts = RouteProgressParts {
            route: Some(straight_route()),
            state: Some(RouteProgressState::Tracking),
            ..RouteProgressParts::default()
        };
        let err = RouteProgress::from_parts(parts).unwrap_err();
        assert!(matches!(err, ProgressError::MissingField("leg_progress")));
    }

    #[test]
    fn leg_out_of_range_rejected() {
        let route = straight_route();
        let step = route.step(0, 0).unwrap().clone();
        let parts = RouteProgressParts {
            route: Some(Arc::clone(&route)),
            state: Some(RouteProgressState::Tracking),
            leg_progress: Some(crate::RouteLegProgress::new(3, 100.0, 40.0, 50.0)),
            step_progress: Some(crate::RouteStepProgress::new(0, None, &step, 10.0)),
            current_step: Some(step),
            ..RouteProgressParts::default()
        };
        assert!(matches!(
            RouteProgress::from_parts(parts),
            Err(ProgressError::LegOutOfRange { leg: 3, legs: 1, .. })
        ));
    }
}

// ── Projector ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod projector {
    use super::*;

    #[test]
    fn projects_route_leg_and_step_scopes() {
        let route = straight_route();
        let progress = project(&tracking_status(40.0, 2, 15.0), &route).unwrap();

        assert_eq!(progress.distance_traveled(), 60.0);
        assert!((progress.fraction_traveled() - 0.6).abs() < 1e-12);
        assert_eq!(progress.duration_remaining(), Duration::from_secs(16));
        assert_eq!(progress.current_leg_progress().metrics.distance_traveled, 60.0);

        let step = progress.current_step_progress();
        assert_eq!(step.step_index, 2);
        assert_eq!(step.metrics.distance_traveled, 10.0);
        assert!((step.metrics.fraction_traveled - 0.4).abs() < 1e-12);
        assert_eq!(step.metrics.duration_remaining, Duration::from_secs(6));
        assert_eq!(progress.state(), RouteProgressState::Tracking);
    }

    #[test]
    fn positional_step_lookups() {
        let route = straight_route();

        let first = project(&tracking_status(100.0, 0, 25.0), &route).unwrap();
        assert!(first.previous_step().is_none());
        assert_eq!(first.upcoming_step().unwrap().name, "b");
        assert_eq!(first.follow_on_step().unwrap().name, "c");

        let third = project(&tracking_status(50.0, 2, 25.0), &route).unwrap();
        assert_eq!(third.previous_step().unwrap().name, "b");
        assert_eq!(third.upcoming_step().unwrap().name, "d");
        assert!(third.follow_on_step().is_none());

        let last = project(&tracking_status(25.0, 3, 25.0), &route).unwrap();
        assert!(last.upcoming_step().is_none());
        assert!(last.follow_on_step().is_none());
    }

    #[test]
    fn no_route_yields_none() {
        let status = tracking_status(40.0, 0, 10.0);
        assert!(RouteProgressProjector
            .project(&status, None, ProjectionContext::default())
            .is_none());
    }

    #[test]
    fn invalid_state_yields_none() {
        let route = straight_route();
        let status = TripStatus {
            route_state: RouteState::Invalid,
            ..tracking_status(40.0, 0, 10.0)
        };
        assert!(project(&status, &route).is_none());
    }

    #[test]
    fn stale_route_reference_yields_none() {
        let route = straight_route();
        let status = TripStatus {
            route_id: Some(RouteId(99)),
            ..tracking_status(40.0, 0, 10.0)
        };
        assert!(project(&status, &route).is_none());
    }

    #[test]
    fn out_of_range_step_yields_none() {
        let route = straight_route();
        assert!(project(&tracking_status(40.0, 9, 10.0), &route).is_none());
    }

    #[test]
    fn context_is_carried_through() {
        let route = straight_route();
        let banner = BannerInstruction::primary("Turn right", 25.0);
        let voice = VoiceInstruction::new("In 25 metres, turn right", 25.0);
        let ctx = ProjectionContext {
            remaining_waypoints: 1,
            banner: Some(&banner),
            banner_index: Some(4),
            last_voice: Some(&voice),
            upcoming_road_objects: Vec::new(),
            current_leg_destination: route.leg_destination(0).cloned(),
        };

        let progress = RouteProgressProjector
            .project(&tracking_status(40.0, 1, 10.0), Some(&route), ctx)
            .unwrap();

        assert_eq!(progress.banner_instruction(), Some(&banner));
        assert_eq!(progress.banner_index(), Some(4));
        assert_eq!(progress.current_step_progress().instruction_index, Some(4));
        assert_eq!(progress.voice_instruction(), Some(&voice));
        assert_eq!(progress.remaining_waypoints(), 1);
        assert_eq!(progress.current_leg_destination().unwrap().name, "end");
    }

    #[test]
    fn status_voice_wins_over_last_delivered() {
        let route = straight_route();
        let old = VoiceInstruction::new("old", 50.0);
        let new = VoiceInstruction::new("new", 20.0);
        let status = TripStatus {
            voice_instruction: Some(new.clone()),
            ..tracking_status(40.0, 1, 10.0)
        };
        let ctx = ProjectionContext { last_voice: Some(&old), ..ProjectionContext::default() };

        let progress = RouteProgressProjector.project(&status, Some(&route), ctx).unwrap();
        assert_eq!(progress.voice_instruction(), Some(&new));
    }
}

// ── Status ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod status {
    use super::*;

    #[test]
    fn negative_distance_still_projects() {
        let route = straight_route();
        let progress = project(&tracking_status(-1.0, 0, 10.0), &route).unwrap();
        assert_eq!(progress.fraction_traveled(), 1.0);
        assert_eq!(progress.duration_remaining(), Duration::ZERO);
    }

    #[test]
    fn nan_distance_still_projects() {
        let route = straight_route();
        let progress = project(&tracking_status(f64::NAN, 0, f64::NAN), &route).unwrap();
        assert_eq!(progress.fraction_traveled(), 1.0);
        assert_eq!(progress.duration_remaining(), Duration::ZERO);
        assert_eq!(progress.current_step_progress().metrics.fraction_traveled, 1.0);
        assert_eq!(progress.current_step_progress().metrics.distance_traveled, 0.0);
    }

    #[test]
    fn off_route_follows_route_state() {
        let status = TripStatus {
            route_state: RouteState::OffRoute,
            ..tracking_status(40.0, 0, 10.0)
        };
        assert!(status.is_off_route());
        assert!(!tracking_status(40.0, 0, 10.0).is_off_route());
    }

    #[test]
    fn matcher_result_off_road_threshold() {
        let mut status = tracking_status(40.0, 0, 10.0);
        status.off_road_probability = 0.7;
        status.layer = Some(2);
        let result = LocationMatcherResult::from_status(&status);
        assert!(result.is_off_road);
        assert_eq!(result.z_level, Some(2));

        status.off_road_probability = 0.5;
        assert!(!LocationMatcherResult::from_status(&status).is_off_road);
    }
}
