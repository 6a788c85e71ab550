//! Session time source.
//!
//! # Design
//!
//! The reroute retry window is measured on a monotonic clock.  Components
//! never call `Instant::now()` directly; they ask an injected [`Clock`] so
//! that tests can step time deterministically with [`ManualClock`]:
//!
//!   elapsed = clock.now() - window_start
//!
//! `MonotonicClock` is the production implementation.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

// ── Clock ─────────────────────────────────────────────────────────────────────

/// A monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-independent monotonic clock backed by [`Instant::now`].
#[derive(Copy, Clone, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ── ManualClock ───────────────────────────────────────────────────────────────

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can hand one clone to
/// the session and keep another to advance time.
#[derive(Clone)]
pub struct ManualClock {
    origin:  Instant,
    current: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Create a clock frozen at the real current instant.
    pub fn new() -> Self {
        let origin = Instant::now();
        Self {
            origin,
            current: Arc::new(Mutex::new(origin)),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current += by;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.current.lock() - self.origin
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManualClock(+{:?})", self.elapsed())
    }
}
