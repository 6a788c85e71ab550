//! `nav-route`: the route model a trip session navigates along.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                      |
//! |-----------------|---------------------------------------------------------------|
//! | [`route`]       | `NavigationRoute`, `RouteLeg`, `LegStep`, `Waypoint`          |
//! | [`instruction`] | `BannerInstruction`, `BannerText`, `VoiceInstruction`         |
//! | [`road_object`] | `RoadObject`, `UpcomingRoadObject`, `updated_objects_ahead`   |
//! | [`builder`]     | `RouteBuilder`, validated route construction                  |
//! | [`error`]       | `RouteError`, `RouteResult<T>`                                |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                    |
//! |-----------|-----------------------------------------------------------|
//! | `serde`   | Derives `Serialize`/`Deserialize` on public types.        |
//! | `fx-hash` | FxHash for the road-object id lookup.                     |

pub mod builder;
pub mod error;
pub mod instruction;
pub mod road_object;
pub mod route;

#[cfg(test)]
mod tests;

pub use builder::RouteBuilder;
pub use error::{RouteError, RouteResult};
pub use instruction::{BannerInstruction, BannerText, VoiceInstruction};
pub use road_object::{
    updated_objects_ahead, RoadObject, RoadObjectKind, RoadObjectUpdate, UpcomingRoadObject,
};
pub use route::{LegStep, NavigationRoute, RouteLeg, Waypoint};
