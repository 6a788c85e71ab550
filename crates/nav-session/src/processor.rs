//! The per-status pipeline.
//!
//! [`StatusProcessor`] owns every piece of mutable session state.  It is
//! synchronous and single-owner: the session's processor task is the only
//! caller in production, which serializes all mutation without locks.
//!
//! # Status pipeline
//!
//! For each accepted status, in order:
//!
//! 1. publish the matched-location result (never gated by transactions);
//! 2. return early if a route transaction is active;
//! 3. evaluate the banner candidate (skipped for `RouteState::Invalid`);
//! 4. advance road objects and project `RouteProgress`;
//! 5. publish progress, then the banner if step 3 triggered;
//! 6. publish the voice instruction if the status carries a new one;
//! 7. arbitrate the off-route transition for the reroute subsystem;
//! 8. update the off-route flag.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use nav_core::{Clock, Location, RepeatReroute, RouteId};
use nav_progress::{
    LocationMatcherResult, ProjectionContext, RouteProgress, RouteProgressProjector, RouteState,
    TripStatus,
};
use nav_route::{updated_objects_ahead, NavigationRoute, UpcomingRoadObject, VoiceInstruction};

use crate::{
    FallbackVersionsEvent, FaultCause, InstructionDeduper, InstructionSnapshot,
    LatestInstructionWrapper, ObserverRegistry, ProcessingFault, RerouteArbitrator,
    RerouteTrigger, RouteTransactionGuard, SessionState, TransactionReason, TransactionToken,
};

/// How a finished transaction changes the active route.
#[derive(Clone, Debug)]
pub enum RouteSwap {
    /// A new primary route (or none, after clean-up).  Resets instruction
    /// and progress state.
    Replace(Option<Arc<NavigationRoute>>),
    /// The same route with refreshed annotations.
    Refresh(Arc<NavigationRoute>),
}

/// Point-in-time view of the session's accessors.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub state:            SessionState,
    pub raw_location:     Option<Location>,
    pub matched_location: Option<LocationMatcherResult>,
    pub route_progress:   Option<RouteProgress>,
    pub z_level:          Option<i32>,
    pub is_off_route:     bool,
    pub active_route:     Option<RouteId>,
}

pub struct StatusProcessor {
    observers: Arc<ObserverRegistry>,
    guard:     RouteTransactionGuard,
    clock:     Arc<dyn Clock>,
    projector: RouteProgressProjector,

    state:        SessionState,
    raw_location: Option<Location>,
    matched:      Option<LocationMatcherResult>,
    z_level:      Option<i32>,

    route:        Option<Arc<NavigationRoute>>,
    road_objects: Vec<UpcomingRoadObject>,
    progress:     Option<RouteProgress>,
    is_off_route: bool,

    deduper:    InstructionDeduper,
    last_voice: Option<VoiceInstruction>,

    arbitrator:      RerouteArbitrator,
    reroute_trigger: Option<Arc<dyn RerouteTrigger>>,

    /// The in-flight leg-index update, if any.
    leg_update: Option<CancellationToken>,
    /// The leg-index update that was in flight when the current transaction opened.
    leg_update_at_open: Option<CancellationToken>,
}

impl StatusProcessor {
    pub fn new(
        observers: Arc<ObserverRegistry>,
        guard:     RouteTransactionGuard,
        clock:     Arc<dyn Clock>,
        policy:    RepeatReroute,
    ) -> Self {
        Self {
            observers,
            guard,
            clock,
            projector: RouteProgressProjector,
            state: SessionState::Stopped,
            raw_location: None,
            matched: None,
            z_level: None,
            route: None,
            road_objects: Vec::new(),
            progress: None,
            is_off_route: false,
            deduper: InstructionDeduper::new(),
            last_voice: None,
            arbitrator: RerouteArbitrator::new(policy),
            reroute_trigger: None,
            leg_update: None,
            leg_update_at_open: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub fn start(&mut self) {
        if self.state == SessionState::Started {
            return;
        }
        info!("trip session started");
        self.set_state(SessionState::Started);
    }

    /// Stop the session, cancel the in-flight leg-index update, and discard
    /// all session-scoped state.  The active route is kept.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        info!("trip session stopped");
        self.cancel_leg_index_update();

        self.raw_location = None;
        self.matched = None;
        self.z_level = None;
        self.progress = None;
        self.set_off_route(false);
        self.deduper.reset();
        self.last_voice = None;
        self.arbitrator.reset();

        self.observers.raw_location().set_retained(None);
        self.observers.matched_location().set_retained(None);
        self.observers.route_progress().set_retained(None);
        self.sync_retained_instructions();

        self.set_state(SessionState::Stopped);
    }

    /// Cancel async work without touching observer-visible state.  Used when
    /// the processor task exits.
    pub fn abort(&mut self) {
        self.cancel_leg_index_update();
    }

    // ── Ingestion ─────────────────────────────────────────────────────────

    pub fn process_raw_location(&mut self, location: Location) {
        if self.state == SessionState::Stopped {
            debug!("raw location dropped; session stopped");
            return;
        }
        self.raw_location = Some(location.clone());
        self.observers.raw_location().publish(location);
    }

    /// Fold one status into session state and publish the results.
    ///
    /// Distances that cannot be measured (NaN, infinite, negative) do not
    /// reject the status; the progress metrics fall back to their defaults.
    pub fn process_status(&mut self, status: TripStatus) {
        if self.state == SessionState::Stopped {
            debug!("status dropped; session stopped");
            return;
        }
        debug!(
            route_state  = ?status.route_state,
            banner_index = ?status.banner_index,
            voice        = status.voice_instruction.is_some(),
            "status received"
        );

        let matched = LocationMatcherResult::from_status(&status);
        self.matched = Some(matched.clone());
        self.observers.matched_location().publish(matched);
        self.z_level = status.layer;

        if self.guard.is_active() {
            debug!("route progress update dropped; updating routes");
            return;
        }

        let mut banner_triggered = false;
        if status.route_state != RouteState::Invalid {
            banner_triggered = self
                .deduper
                .evaluate(status.banner_instruction.clone(), status.banner_index);
            self.sync_retained_instructions();
        }

        let progress = self.route.as_ref().and_then(|route| {
            let latest = self.deduper.latest();
            let ctx = ProjectionContext {
                remaining_waypoints: route.remaining_waypoints(status.next_waypoint_index),
                banner: latest.map(|w| &w.banner),
                banner_index: latest.map(|w| w.index),
                last_voice: self.last_voice.as_ref(),
                upcoming_road_objects: updated_objects_ahead(
                    &self.road_objects,
                    &status.upcoming_alert_updates,
                ),
                current_leg_destination: route.leg_destination(status.leg_index).cloned(),
            };
            let progress = self.projector.project(&status, Some(route), ctx);
            if progress.is_none() {
                debug!(
                    route        = %route.id,
                    status_route = ?status.route_id,
                    route_state  = ?status.route_state,
                    "route progress update dropped"
                );
            }
            progress
        });

        self.update_route_progress(progress, banner_triggered);
        self.trigger_voice_instruction(&status);
        self.arbitrate(status.is_off_route());
        self.set_off_route(status.is_off_route());
    }

    pub fn relay_fallback_versions(&mut self, event: FallbackVersionsEvent) {
        self.observers.fallback_versions().publish(event);
    }

    /// Build the fault for `cause` and log it with the session context.
    pub fn fault(&self, cause: FaultCause) -> ProcessingFault {
        let fault = ProcessingFault {
            transaction_active: self.guard.is_active(),
            active_route:       self.active_route(),
            cause,
        };
        error!(
            transaction_active = fault.transaction_active,
            active_route       = ?fault.active_route,
            cause              = %fault.cause,
            "status processing fault"
        );
        fault
    }

    // ── Route transactions ────────────────────────────────────────────────

    /// Entry side effects: off-route cleared, progress discarded, reroute
    /// arbitration reset.
    pub fn on_transaction_opened(&mut self, reason: TransactionReason) {
        debug!(%reason, route = ?self.active_route(), "routes update starting");
        self.leg_update_at_open = self.leg_update.clone();
        self.set_off_route(false);
        self.progress = None;
        self.observers.route_progress().set_retained(None);
        self.arbitrator.reset();
    }

    /// Apply `swap`, cancel the leg-index update that predates the
    /// transaction, then end the transaction by consuming `token`.
    pub fn on_transaction_closed(&mut self, token: TransactionToken, swap: Option<RouteSwap>) {
        match swap {
            Some(RouteSwap::Replace(route)) => {
                self.cancel_leg_index_update();
                self.road_objects = route
                    .as_ref()
                    .map(|r| r.upcoming_road_objects.clone())
                    .unwrap_or_default();
                self.route = route;
                self.set_off_route(false);
                let current = InstructionSnapshot {
                    banner: self.deduper.latest().cloned(),
                    voice:  self.last_voice.clone(),
                };
                self.invalidate_instructions(&current);
                self.progress = None;
                self.observers.route_progress().set_retained(None);
            }
            Some(RouteSwap::Refresh(route)) => {
                self.road_objects = route.upcoming_road_objects.clone();
                self.route = Some(route);
            }
            None => {}
        }
        if let Some(stale) = self.leg_update_at_open.take() {
            stale.cancel();
        }
        debug!(reason = %token.reason(), route = ?self.active_route(), "routes update finished");
        self.guard.end(token);
    }

    // ── Leg-index updates ─────────────────────────────────────────────────

    /// Register a new leg-index update, cancelling any earlier one, and
    /// capture the instructions it will invalidate on success.
    pub fn begin_leg_index_update(&mut self, leg_index: usize, token: CancellationToken) -> InstructionSnapshot {
        if let Some(previous) = self.leg_update.replace(token) {
            previous.cancel();
        }
        let snapshot = InstructionSnapshot {
            banner: self.deduper.latest().cloned(),
            voice:  self.last_voice.clone(),
        };
        debug!(
            leg_index,
            route        = ?self.active_route(),
            banner_index = ?snapshot.banner.as_ref().map(|w| w.index),
            "leg index update started"
        );
        snapshot
    }

    /// The engine accepted the leg change.  Invalidates exactly `snapshot`
    /// unless the update was cancelled meanwhile.  Returns whether it applied.
    pub fn finish_leg_index_update(&mut self, token: &CancellationToken, snapshot: &InstructionSnapshot) -> bool {
        if token.is_cancelled() {
            debug!("leg index update discarded; cancelled");
            return false;
        }
        self.invalidate_instructions(snapshot);
        debug!(
            banner_index = ?self.deduper.latest().map(|w| w.index),
            "leg index update finished"
        );
        true
    }

    pub fn cancel_leg_index_update(&mut self) {
        if let Some(token) = self.leg_update.take() {
            token.cancel();
        }
    }

    // ── Reroute wiring ────────────────────────────────────────────────────

    pub fn set_reroute_trigger(&mut self, trigger: Option<Arc<dyn RerouteTrigger>>) {
        self.arbitrator.reset();
        self.reroute_trigger = trigger;
    }

    pub fn on_reroute_fetch_started(&mut self) {
        self.arbitrator.on_fetch_started();
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState { self.state }
    pub fn is_off_route(&self) -> bool { self.is_off_route }
    pub fn route_progress(&self) -> Option<&RouteProgress> { self.progress.as_ref() }
    pub fn latest_instruction(&self) -> Option<&LatestInstructionWrapper> { self.deduper.latest() }
    pub fn last_voice_instruction(&self) -> Option<&VoiceInstruction> { self.last_voice.as_ref() }
    pub fn arbitrator(&self) -> &RerouteArbitrator { &self.arbitrator }
    pub fn active_route(&self) -> Option<RouteId> { self.route.as_ref().map(|r| r.id) }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state:            self.state,
            raw_location:     self.raw_location.clone(),
            matched_location: self.matched.clone(),
            route_progress:   self.progress.clone(),
            z_level:          self.z_level,
            is_off_route:     self.is_off_route,
            active_route:     self.active_route(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn update_route_progress(&mut self, progress: Option<RouteProgress>, banner_triggered: bool) {
        self.progress = progress.clone();
        let Some(progress) = progress else {
            self.observers.route_progress().set_retained(None);
            return;
        };
        debug!(state = ?progress.state(), "dispatching progress update");
        self.observers.route_progress().publish(progress);
        if banner_triggered {
            if let Some(banner) = self.deduper.current().cloned() {
                self.observers.banner().publish(banner);
            }
        }
    }

    fn trigger_voice_instruction(&mut self, status: &TripStatus) {
        if status.voice_instruction.is_none() {
            return;
        }
        let Some(voice) = self.progress.as_ref().and_then(|p| p.voice_instruction()).cloned() else {
            return;
        };
        self.last_voice = Some(voice.clone());
        self.observers.voice().publish(voice);
    }

    fn arbitrate(&mut self, is_off_route: bool) {
        let Some(trigger) = self.reroute_trigger.clone() else {
            return;
        };
        if let Some(signal) = self.arbitrator.on_status(self.is_off_route, is_off_route, self.clock.now()) {
            trigger.on_off_route_changed(signal);
        }
    }

    fn invalidate_instructions(&mut self, snapshot: &InstructionSnapshot) {
        self.deduper.invalidate(snapshot.banner.as_ref());
        if self.last_voice.is_some() && self.last_voice == snapshot.voice {
            self.last_voice = None;
        }
        self.sync_retained_instructions();
    }

    /// Replay values for late subscribers follow the latest surfaced banner
    /// and the last delivered voice instruction.
    fn sync_retained_instructions(&self) {
        self.observers
            .banner()
            .set_retained(self.deduper.latest().map(|w| w.banner.clone()));
        self.observers.voice().set_retained(self.last_voice.clone());
    }

    fn set_off_route(&mut self, off_route: bool) {
        if self.is_off_route == off_route {
            return;
        }
        self.is_off_route = off_route;
        self.observers.off_route().publish(off_route);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.observers.session_state().publish(state);
    }
}
