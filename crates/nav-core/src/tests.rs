//! Unit tests for nav-core primitives.

#[cfg(test)]
mod ids {
    use crate::{RoadObjectId, RouteId};

    #[test]
    fn ordering() {
        assert!(RouteId(0) < RouteId(1));
        assert!(RoadObjectId(100) > RoadObjectId(99));
    }

    #[test]
    fn next_increments() {
        assert_eq!(RouteId::new(4).next(), RouteId(5));
        assert_eq!(RouteId::from(9).get(), 9);
    }

    #[test]
    fn display() {
        assert_eq!(RouteId(7).to_string(), "RouteId(7)");
    }
}

#[cfg(test)]
mod time {
    use std::time::Duration;

    use crate::{Clock, ManualClock};

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now() - t0, Duration::from_secs(5));
    }

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(other.elapsed(), Duration::from_millis(250));
    }
}

#[cfg(test)]
mod config {
    use std::time::Duration;

    use crate::{RepeatReroute, SessionConfig};

    #[test]
    fn negative_seconds_disable_retries() {
        assert_eq!(RepeatReroute::from_secs(-1), RepeatReroute::Disabled);
        assert_eq!(RepeatReroute::from_secs(-30), RepeatReroute::Disabled);
        assert_eq!(RepeatReroute::Disabled.delay(), None);
    }

    #[test]
    fn zero_and_positive_seconds_enable_retries() {
        assert_eq!(
            RepeatReroute::from_secs(5).delay(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(RepeatReroute::from_secs(0).delay(), Some(Duration::ZERO));
    }

    #[test]
    fn default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.repeat_reroute, RepeatReroute::Disabled);
    }

    #[test]
    fn zero_buffer_rejected() {
        let config = SessionConfig { command_buffer: 0, ..SessionConfig::default() };
        assert!(config.validate().is_err());
    }
}

#[cfg(test)]
mod error {
    use crate::ensure_non_negative;

    #[test]
    fn rejects_nan_and_negative() {
        assert!(ensure_non_negative("distance", f64::NAN).is_err());
        assert!(ensure_non_negative("distance", -1.0).is_err());
        assert!(ensure_non_negative("distance", f64::INFINITY).is_err());
        assert_eq!(ensure_non_negative("distance", 3.5).unwrap(), 3.5);
    }
}
