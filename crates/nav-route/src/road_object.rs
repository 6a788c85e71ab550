//! Road objects along the route and the per-status distance advance.

use std::sync::Arc;

use nav_core::RoadObjectId;

#[cfg(feature = "fx-hash")]
type IdMap<V> = rustc_hash::FxHashMap<RoadObjectId, V>;
#[cfg(not(feature = "fx-hash"))]
type IdMap<V> = std::collections::HashMap<RoadObjectId, V>;

/// Road object categories surfaced to the driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoadObjectKind {
    Incident,
    TollCollection,
    BorderCrossing,
    Tunnel,
    RestrictedArea,
    ServiceArea,
    Bridge,
    RailwayCrossing,
    Custom,
}

/// Static description of a road object.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadObject {
    pub id:   RoadObjectId,
    pub kind: RoadObjectKind,

    /// Length along the road in metres; `None` for point objects.
    pub length: Option<f64>,
}

/// A road object ahead of the vehicle and the distance to reach it.
///
/// The object itself is shared: advancing distances never copies it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpcomingRoadObject {
    pub road_object: Arc<RoadObject>,

    /// Metres from the current position to the start of the object.
    pub distance_to_start: f64,
}

/// Updated distance for one road object, as reported by a status.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadObjectUpdate {
    pub id:                RoadObjectId,
    pub distance_to_start: f64,
}

/// Advance `existing` by a status's alert updates.
///
/// Keeps only the objects named in `updates`, in update order, each with its
/// new distance.  Updates for ids not in `existing` are ignored; objects
/// without an update have been passed and are dropped.
pub fn updated_objects_ahead(
    existing: &[UpcomingRoadObject],
    updates:  &[RoadObjectUpdate],
) -> Vec<UpcomingRoadObject> {
    let by_id: IdMap<&Arc<RoadObject>> = existing
        .iter()
        .map(|o| (o.road_object.id, &o.road_object))
        .collect();

    updates
        .iter()
        .filter_map(|u| {
            by_id.get(&u.id).map(|obj| UpcomingRoadObject {
                road_object:       Arc::clone(obj),
                distance_to_start: u.distance_to_start,
            })
        })
        .collect()
}
