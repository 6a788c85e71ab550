//! Geographic coordinate and location fix types.

use std::time::Duration;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A single positioning fix, raw or map-matched.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub point: GeoPoint,

    /// Course over ground in degrees, `[0, 360)`.
    pub bearing: Option<f64>,

    /// Speed in metres per second.
    pub speed: Option<f64>,

    /// Monotonic timestamp of the fix, relative to an arbitrary epoch
    /// chosen by the positioning source.
    pub monotonic_timestamp: Duration,
}

impl Location {
    /// A fix with no bearing or speed.
    pub fn at(point: GeoPoint, monotonic_timestamp: Duration) -> Self {
        Self {
            point,
            bearing: None,
            speed: None,
            monotonic_timestamp,
        }
    }
}
