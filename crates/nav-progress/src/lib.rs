//! `nav-progress`: from engine status snapshots to route progress.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                          |
//! |---------------|-------------------------------------------------------------------|
//! | [`status`]    | `TripStatus`, `RouteState`, `LocationMatcherResult`               |
//! | [`progress`]  | `RouteProgress`, `RouteLegProgress`, `RouteStepProgress`          |
//! | [`projector`] | `RouteProgressProjector`, pure status → progress transformation   |
//! | [`error`]     | `ProgressError`, `ProgressResult<T>`                              |
//!
//! # Projection model
//!
//! A `TripStatus` is an opaque snapshot produced by the positioning engine.
//! The projector resolves it against the active route and produces one
//! immutable `RouteProgress`; the route-, leg-, and step-level values are
//! each computed from the same status and never updated afterwards.  The
//! next accepted status supersedes the snapshot wholesale.

pub mod error;
pub mod progress;
pub mod projector;
pub mod status;

#[cfg(test)]
mod tests;

pub use error::{ProgressError, ProgressResult};
pub use progress::{
    RouteLegProgress, RouteProgress, RouteProgressParts, RouteProgressState, RouteStepProgress,
    TravelMetrics,
};
pub use projector::{ProjectionContext, RouteProgressProjector};
pub use status::{LocationMatcherResult, RouteState, TripStatus};
