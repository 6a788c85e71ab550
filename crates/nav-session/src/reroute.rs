//! Off-route signalling for the reroute subsystem.
//!
//! # State machine
//!
//! ```text
//!               false → true  (emit true)
//!  NotOffRoute ───────────────────────► OffRoute { invoked: false, start: now }
//!       ▲                                  │   │
//!       │  * → false                       │   │ fetch started
//!       └──────────────────────────────────┘   ▼
//!                                     OffRoute { invoked: true, .. }
//! ```
//!
//! While off route (`true → true`):
//!
//! - `invoked` → the reroute subsystem took over; re-arm the window, no emission.
//! - not invoked and `now - start >= delay` → emit `true` again, re-arm.
//! - otherwise nothing.
//!
//! With [`RepeatReroute::Disabled`] the arbitrator only forwards edges:
//! `false → true` emits `true` and `true → false` emits `false`.

use std::time::Instant;

use tracing::info;

use nav_core::RepeatReroute;

/// Receives off-route signals.  Implemented by the reroute subsystem.
pub trait RerouteTrigger: Send + Sync {
    fn on_off_route_changed(&self, off_route: bool);
}

impl<F> RerouteTrigger for F
where
    F: Fn(bool) + Send + Sync,
{
    fn on_off_route_changed(&self, off_route: bool) {
        (self)(off_route)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArbitratorState {
    NotOffRoute,
    OffRoute {
        reroute_invoked: bool,
        window_start:    Instant,
    },
}

#[derive(Clone, Debug)]
pub struct RerouteArbitrator {
    policy: RepeatReroute,
    state:  ArbitratorState,
}

impl RerouteArbitrator {
    pub fn new(policy: RepeatReroute) -> Self {
        Self { policy, state: ArbitratorState::NotOffRoute }
    }

    pub fn state(&self) -> ArbitratorState {
        self.state
    }

    pub fn policy(&self) -> RepeatReroute {
        self.policy
    }

    /// Feed one status's off-route transition.  Returns the signal to send
    /// to the reroute subsystem, if any.
    pub fn on_status(&mut self, was_off_route: bool, is_off_route: bool, now: Instant) -> Option<bool> {
        let Some(delay) = self.policy.delay() else {
            self.state = if is_off_route {
                off_route_window(now)
            } else {
                ArbitratorState::NotOffRoute
            };
            return (was_off_route != is_off_route).then_some(is_off_route);
        };

        match (was_off_route, is_off_route) {
            (_, false) => {
                self.state = ArbitratorState::NotOffRoute;
                None
            }
            (false, true) => {
                info!("off route; triggering reroute");
                self.state = off_route_window(now);
                Some(true)
            }
            (true, true) => match self.state {
                ArbitratorState::OffRoute { reroute_invoked: true, .. } => {
                    info!("reroute fetch observed; re-arming retry window");
                    self.state = off_route_window(now);
                    None
                }
                ArbitratorState::OffRoute { reroute_invoked: false, window_start } => {
                    if now.saturating_duration_since(window_start) >= delay {
                        info!(?delay, "no reroute fetch observed; repeating off-route signal");
                        self.state = off_route_window(now);
                        Some(true)
                    } else {
                        None
                    }
                }
                ArbitratorState::NotOffRoute => {
                    self.state = off_route_window(now);
                    None
                }
            },
        }
    }

    /// The reroute subsystem started fetching a route.
    pub fn on_fetch_started(&mut self) {
        if let ArbitratorState::OffRoute { reroute_invoked, .. } = &mut self.state {
            *reroute_invoked = true;
        }
    }

    pub fn reset(&mut self) {
        self.state = ArbitratorState::NotOffRoute;
    }
}

fn off_route_window(now: Instant) -> ArbitratorState {
    ArbitratorState::OffRoute { reroute_invoked: false, window_start: now }
}
