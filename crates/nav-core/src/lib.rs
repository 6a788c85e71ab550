//! `nav-core`: foundational types for the trip-session workspace.
//!
//! This crate is a dependency of every other `nav-*` crate.  It has no
//! `nav-*` dependencies and minimal external ones (`thiserror`,
//! `parking_lot`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                 |
//! |-------------|----------------------------------------------------------|
//! | [`ids`]     | `RouteId`, `RoadObjectId`, `SubscriptionId`              |
//! | [`geo`]     | `GeoPoint`, `Location`                                   |
//! | [`time`]    | `Clock` trait, `MonotonicClock`, `ManualClock`           |
//! | [`config`]  | `SessionConfig`, `RepeatReroute`                         |
//! | [`error`]   | `NavError`, `NavResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.  |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{RepeatReroute, SessionConfig};
pub use error::{ensure_non_negative, NavError, NavResult};
pub use geo::{GeoPoint, Location};
pub use ids::{RoadObjectId, RouteId, SubscriptionId};
pub use time::{Clock, ManualClock, MonotonicClock};
