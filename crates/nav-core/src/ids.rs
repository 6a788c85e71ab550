//! Strongly typed identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and
//! compared by value without ceremony.  The inner integer is `pub` so fakes
//! and fixtures can build them directly.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            #[inline(always)]
            pub const fn new(raw: $inner) -> Self {
                $name(raw)
            }

            /// The raw integer value.
            #[inline(always)]
            pub const fn get(self) -> $inner {
                self.0
            }

            /// The next id in sequence.  Used by allocators that hand out
            /// monotonically increasing ids.
            #[inline(always)]
            pub const fn next(self) -> Self {
                $name(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(raw: $inner) -> $name {
                $name(raw)
            }
        }
    };
}

typed_id! {
    /// Identity of a navigation route.  Statuses reference the route they
    /// were computed against by this id.
    pub struct RouteId(u64);
}

typed_id! {
    /// Identity of a road object (incident, toll point, tunnel, …) along a route.
    pub struct RoadObjectId(u64);
}

typed_id! {
    /// Handle returned by observer subscription; pass it back to unsubscribe.
    pub struct SubscriptionId(u64);
}
