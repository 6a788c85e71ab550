//! The async trip-session handle.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  Status / FallbackVersions     ┌──────────────────────┐
//! │ StatusSink(s)  │──────────┐                     │                      │
//! └────────────────┘          │                     │   processor task     │
//! ┌────────────────┐          ├──► Command mpsc ──► │  (StatusProcessor)   │
//! │  TripSession   │──────────┘                     │                      │
//! │ start / stop   │  RawLocation, Transaction*,    └──────────┬───────────┘
//! │ set_routes     │  LegIndexUpdate*, Snapshot                │
//! │ leg updates    │                                           ▼
//! └────────────────┘                                    ObserverRegistry
//! ```
//!
//! Engine calls (`set_routes`, `refresh_route`, `update_leg_index`) run in
//! the caller's task, never in the processor task, so statuses keep flowing
//! while they are outstanding.  Their effects on session state are sent back
//! to the processor as commands.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nav_core::{Clock, Location, MonotonicClock, SessionConfig};
use nav_progress::TripStatus;
use nav_route::NavigationRoute;

use crate::{
    EngineError, FallbackVersionsEvent, FaultCause, InstructionSnapshot, NavigationEngine,
    ObserverRegistry, ProcessingFault, RerouteTrigger, RouteSwap, RouteTransactionGuard,
    SessionError, SessionResult, SessionSnapshot, SetRoutes, SetRoutesError, SetRoutesResult,
    SetRoutesValue, StatusProcessor, TransactionReason, TransactionToken,
};

// ── Commands ──────────────────────────────────────────────────────────────────

enum Command {
    RawLocation(Location),
    Status(TripStatus),
    FallbackVersions(FallbackVersionsEvent),
    Start(oneshot::Sender<()>),
    Stop(oneshot::Sender<()>),
    TransactionOpened {
        reason: TransactionReason,
        ack:    oneshot::Sender<()>,
    },
    TransactionClosed {
        token: TransactionToken,
        swap:  Option<RouteSwap>,
        ack:   oneshot::Sender<()>,
    },
    BeginLegIndexUpdate {
        leg_index: usize,
        token:     CancellationToken,
        reply:     oneshot::Sender<InstructionSnapshot>,
    },
    FinishLegIndexUpdate {
        token:    CancellationToken,
        snapshot: InstructionSnapshot,
        reply:    oneshot::Sender<bool>,
    },
    RerouteFetchStarted,
    SetRerouteTrigger(Option<Arc<dyn RerouteTrigger>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

// ── StatusSink ────────────────────────────────────────────────────────────────

/// Producer handle for the engine side: statuses, fallback-version events,
/// and reroute-fetch notifications.
///
/// Cheap to clone; safe to use from any task or thread inside the runtime.
/// Sends wait while the processor's command buffer is full.
#[derive(Clone)]
pub struct StatusSink {
    commands: mpsc::Sender<Command>,
}

impl StatusSink {
    pub async fn push_status(&self, status: TripStatus) -> SessionResult<()> {
        self.send(Command::Status(status)).await
    }

    pub async fn push_fallback_versions(&self, event: FallbackVersionsEvent) -> SessionResult<()> {
        self.send(Command::FallbackVersions(event)).await
    }

    /// The reroute subsystem started fetching a new route.
    pub async fn notify_reroute_fetch_started(&self) -> SessionResult<()> {
        self.send(Command::RerouteFetchStarted).await
    }

    /// Returns `false` once the processor task has exited.
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn send(&self, command: Command) -> SessionResult<()> {
        self.commands.send(command).await.map_err(|_| SessionError::Closed)
    }

    async fn request<R>(&self, make: impl FnOnce(oneshot::Sender<R>) -> Command) -> SessionResult<R> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

// ── LegIndexUpdate ────────────────────────────────────────────────────────────

/// Handle to an in-flight leg-index update.
///
/// Dropping the handle does not cancel the update.
#[derive(Debug)]
pub struct LegIndexUpdate {
    token: CancellationToken,
    task:  JoinHandle<bool>,
}

impl LegIndexUpdate {
    /// Cancel the update.  Its callback still runs, with `false`.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the update to finish.  Returns the value passed to the callback.
    pub async fn finished(self) -> bool {
        self.task.await.unwrap_or(false)
    }
}

// ── TripSession ───────────────────────────────────────────────────────────────

/// The trip session: an async handle over a single processor task.
///
/// # Lifecycle
///
/// 1. **Creation**: `new()` spawns the processor task; the session is `Stopped`.
/// 2. **Operation**: `start()`, then feed statuses through a [`StatusSink`].
/// 3. **Shutdown**: `shutdown()` ends the processor task and reports whether
///    it had faulted.
pub struct TripSession {
    engine:    Arc<dyn NavigationEngine>,
    sink:      StatusSink,
    observers: Arc<ObserverRegistry>,
    guard:     RouteTransactionGuard,
    started:   AtomicBool,
    shutdown:  CancellationToken,
    processor: Option<JoinHandle<Result<(), ProcessingFault>>>,
}

impl TripSession {
    /// Create a session over `engine` and spawn its processor task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(engine: Arc<dyn NavigationEngine>, config: SessionConfig) -> SessionResult<Self> {
        Self::with_clock(engine, config, Arc::new(MonotonicClock))
    }

    /// As [`new`](Self::new), with an explicit clock for reroute timing.
    pub fn with_clock(
        engine: Arc<dyn NavigationEngine>,
        config: SessionConfig,
        clock:  Arc<dyn Clock>,
    ) -> SessionResult<Self> {
        config.validate()?;

        let observers = Arc::new(ObserverRegistry::new());
        let guard = RouteTransactionGuard::new();
        let processor = StatusProcessor::new(
            Arc::clone(&observers),
            guard.clone(),
            clock,
            config.repeat_reroute,
        );

        let (tx, rx) = mpsc::channel(config.command_buffer);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run_processor(processor, rx, shutdown.clone()));
        info!(
            command_buffer = config.command_buffer,
            repeat_reroute = ?config.repeat_reroute,
            "trip session created"
        );

        Ok(Self {
            engine,
            sink: StatusSink { commands: tx },
            observers,
            guard,
            started: AtomicBool::new(false),
            shutdown,
            processor: Some(task),
        })
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    /// A producer handle for the engine and the reroute subsystem.
    pub fn status_sink(&self) -> StatusSink {
        self.sink.clone()
    }

    pub fn is_route_transaction_active(&self) -> bool {
        self.guard.is_active()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub async fn start(&self) -> SessionResult<()> {
        if !self.started.swap(true, Ordering::AcqRel) {
            self.engine.start_session().await;
        }
        self.sink.request(Command::Start).await
    }

    /// Stop the session.  Returns after session-scoped state is cleared and
    /// the in-flight leg-index update is cancelled.
    pub async fn stop(&self) -> SessionResult<()> {
        if self.started.swap(false, Ordering::AcqRel) {
            self.engine.stop_session().await;
        }
        self.sink.request(Command::Stop).await
    }

    /// End the processor task.  Commands still queued are discarded.
    ///
    /// # Errors
    ///
    /// [`SessionError::Faulted`] if the task had stopped on a processing fault.
    pub async fn shutdown(mut self) -> SessionResult<()> {
        info!("shutting down trip session");
        self.shutdown.cancel();
        let Some(task) = self.processor.take() else {
            return Ok(());
        };
        match task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(fault)) => Err(SessionError::Faulted(fault)),
            Err(e) => Err(SessionError::Join(e.to_string())),
        }
    }

    // ── Producers ─────────────────────────────────────────────────────────

    /// Publish a raw fix and forward it to the engine.  Fixes arriving while
    /// the session is stopped are dropped.
    pub async fn push_raw_location(&self, location: Location) -> SessionResult<()> {
        self.sink.send(Command::RawLocation(location.clone())).await?;
        if self.started.load(Ordering::Acquire) {
            self.engine.update_location(location).await;
        }
        Ok(())
    }

    pub async fn push_status(&self, status: TripStatus) -> SessionResult<()> {
        self.sink.push_status(status).await
    }

    pub async fn push_fallback_versions(&self, event: FallbackVersionsEvent) -> SessionResult<()> {
        self.sink.push_fallback_versions(event).await
    }

    pub async fn notify_reroute_fetch_started(&self) -> SessionResult<()> {
        self.sink.notify_reroute_fetch_started().await
    }

    // ── Reroute wiring ────────────────────────────────────────────────────

    pub async fn set_reroute_trigger(&self, trigger: Arc<dyn RerouteTrigger>) -> SessionResult<()> {
        self.sink.send(Command::SetRerouteTrigger(Some(trigger))).await
    }

    pub async fn clear_reroute_trigger(&self) -> SessionResult<()> {
        self.sink.send(Command::SetRerouteTrigger(None)).await
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Current state, locations, progress, z-level, off-route flag, and
    /// active route, read in order with every command sent before it.
    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        self.sink.request(Command::Snapshot).await
    }

    // ── Route replacement ─────────────────────────────────────────────────

    /// Replace the route list inside a route transaction.
    ///
    /// Waits for any running replacement to finish first.  `routes[0]` is
    /// the primary route.  Failures leave the active route unchanged; the
    /// transaction is released either way.
    ///
    /// The transaction runs on its own task.  Dropping the returned future
    /// does not abandon it: the engine call finishes and the processor is
    /// told the outcome.
    pub async fn set_routes(&self, routes: Vec<Arc<NavigationRoute>>, set_routes: SetRoutes) -> SetRoutesResult {
        let engine = Arc::clone(&self.engine);
        let guard = self.guard.clone();
        let sink = self.sink.clone();
        let task: JoinHandle<SetRoutesResult> = tokio::spawn(async move {
            let reason = set_routes.transaction_reason();
            let route_ids: Vec<_> = routes.iter().map(|r| r.id).collect();
            info!(%reason, routes = ?route_ids, "routes update starting");

            let token = guard.begin(reason).await;
            sink.request(|ack| Command::TransactionOpened { reason, ack }).await?;

            let (swap, result) = apply_routes(engine.as_ref(), &routes, set_routes).await;

            sink.request(|ack| Command::TransactionClosed { token, swap, ack }).await?;

            match &result {
                Ok(_) => info!(%reason, routes = ?route_ids, "routes update finished"),
                Err(e) => warn!(%reason, routes = ?route_ids, error = %e, "routes update failed"),
            }
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(SessionError::Join(e.to_string()).into()),
        }
    }

    // ── Leg index ─────────────────────────────────────────────────────────

    /// Switch the engine to leg `leg_index`.
    ///
    /// Cancels any earlier update still in flight.  `callback` receives
    /// `true` only if the engine accepted the change and the update was not
    /// cancelled (by [`LegIndexUpdate::cancel`], a newer update, a route
    /// transaction, or `stop()`) before it was applied.
    pub async fn update_leg_index<F>(&self, leg_index: usize, callback: F) -> SessionResult<LegIndexUpdate>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let token = CancellationToken::new();
        let snapshot = self
            .sink
            .request(|reply| Command::BeginLegIndexUpdate {
                leg_index,
                token: token.clone(),
                reply,
            })
            .await?;

        let engine = Arc::clone(&self.engine);
        let sink = self.sink.clone();
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let accepted = tokio::select! {
                biased;
                _ = task_token.cancelled() => false,
                accepted = engine.update_leg_index(leg_index) => accepted,
            };
            let applied = accepted
                && sink
                    .request(|reply| Command::FinishLegIndexUpdate {
                        token: task_token,
                        snapshot,
                        reply,
                    })
                    .await
                    .unwrap_or(false);
            debug!(leg_index, accepted, applied, "leg index update complete");
            callback(applied);
            applied
        });

        Ok(LegIndexUpdate { token, task })
    }
}

// ── Route replacement ─────────────────────────────────────────────────────────

/// Run the engine side of a replacement.  Returns the route change for the
/// processor (if any) alongside the caller's result.
async fn apply_routes(
    engine:     &dyn NavigationEngine,
    routes:     &[Arc<NavigationRoute>],
    set_routes: SetRoutes,
) -> (Option<RouteSwap>, SetRoutesResult) {
    let reason = set_routes.transaction_reason();
    match set_routes {
        SetRoutes::Alternatives => {
            let alternatives = engine
                .set_alternative_routes(routes.iter().skip(1).cloned().collect())
                .await;
            (None, Ok(SetRoutesValue { routes: routes.to_vec(), alternatives }))
        }

        SetRoutes::RefreshRoutes => {
            let Some(primary) = routes.first() else {
                warn!("cannot refresh route; route list is empty");
                return (None, Err(SetRoutesError::EmptyRefresh));
            };
            // Primary last: statuses for the refreshed primary start as
            // soon as the engine accepts it.
            let mut last_ok = None;
            let mut last_err = None;
            for route in routes.iter().skip(1).chain(std::iter::once(primary)) {
                match engine.refresh_route(Arc::clone(route)).await {
                    Ok(alternatives) => last_ok = Some(alternatives),
                    Err(e) => {
                        debug!(route = %route.id, error = %e, "route refresh failed");
                        last_err = Some(e);
                    }
                }
            }
            match last_ok {
                Some(alternatives) => (
                    Some(RouteSwap::Refresh(Arc::clone(primary))),
                    Ok(SetRoutesValue { routes: routes.to_vec(), alternatives }),
                ),
                None => (
                    None,
                    Err(SetRoutesError::Engine {
                        reason,
                        source: last_err.unwrap_or_else(|| EngineError::new("no refresh result")),
                    }),
                ),
            }
        }

        SetRoutes::CleanUp
        | SetRoutes::NewRoutes { .. }
        | SetRoutes::Reroute { .. }
        | SetRoutes::Reorder { .. } => {
            let primary = routes.first().cloned();
            let alternatives = routes.iter().skip(1).cloned().collect();
            match engine
                .set_routes(primary.clone(), set_routes.initial_leg_index(), alternatives, reason)
                .await
            {
                Ok(alternatives) => (
                    Some(RouteSwap::Replace(primary)),
                    Ok(SetRoutesValue { routes: routes.to_vec(), alternatives }),
                ),
                Err(source) => (None, Err(SetRoutesError::Engine { reason, source })),
            }
        }
    }
}

impl Drop for TripSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// ── Processor task ────────────────────────────────────────────────────────────

async fn run_processor(
    mut processor: StatusProcessor,
    mut commands:  mpsc::Receiver<Command>,
    shutdown:      CancellationToken,
) -> Result<(), ProcessingFault> {
    loop {
        let command = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };
        if let Err(fault) = dispatch(&mut processor, command) {
            processor.abort();
            return Err(fault);
        }
    }
    processor.stop();
    processor.abort();
    debug!("session processor exited");
    Ok(())
}

fn dispatch(processor: &mut StatusProcessor, command: Command) -> Result<(), ProcessingFault> {
    match command {
        Command::Status(status) => return ingest(processor, status),
        Command::RawLocation(location) => processor.process_raw_location(location),
        Command::FallbackVersions(event) => processor.relay_fallback_versions(event),
        Command::Start(ack) => {
            processor.start();
            let _ = ack.send(());
        }
        Command::Stop(ack) => {
            processor.stop();
            let _ = ack.send(());
        }
        Command::TransactionOpened { reason, ack } => {
            processor.on_transaction_opened(reason);
            let _ = ack.send(());
        }
        Command::TransactionClosed { token, swap, ack } => {
            processor.on_transaction_closed(token, swap);
            let _ = ack.send(());
        }
        Command::BeginLegIndexUpdate { leg_index, token, reply } => {
            let _ = reply.send(processor.begin_leg_index_update(leg_index, token));
        }
        Command::FinishLegIndexUpdate { token, snapshot, reply } => {
            let _ = reply.send(processor.finish_leg_index_update(&token, &snapshot));
        }
        Command::RerouteFetchStarted => processor.on_reroute_fetch_started(),
        Command::SetRerouteTrigger(trigger) => processor.set_reroute_trigger(trigger),
        Command::Snapshot(reply) => {
            let _ = reply.send(processor.snapshot());
        }
    }
    Ok(())
}

/// The single ingestion boundary: a panic while processing a status becomes
/// a [`ProcessingFault`].
fn ingest(processor: &mut StatusProcessor, status: TripStatus) -> Result<(), ProcessingFault> {
    match panic::catch_unwind(AssertUnwindSafe(|| processor.process_status(status))) {
        Ok(()) => Ok(()),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(processor.fault(FaultCause::Panic(message)))
        }
    }
}
