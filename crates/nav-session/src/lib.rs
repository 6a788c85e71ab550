//! `nav-session`: the trip session.
//!
//! Folds a stream of engine status snapshots into observer-visible route
//! progress while route replacements (reroute, refresh, alternatives) run
//! concurrently.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                        |
//! |-----------------|-----------------------------------------------------------------|
//! | [`observer`]    | `ObserverRegistry`, per-event `Channel`, `TripObserver`         |
//! | [`instruction`] | `InstructionDeduper`, `LatestInstructionWrapper`                |
//! | [`guard`]       | `RouteTransactionGuard`, `TransactionToken`, `TransactionReason`|
//! | [`reroute`]     | `RerouteArbitrator`, `RerouteTrigger`                           |
//! | [`engine`]      | `NavigationEngine` collaborator trait, `SetRoutes`              |
//! | [`processor`]   | `StatusProcessor`, the synchronous per-status pipeline          |
//! | [`session`]     | `TripSession`, async handle over the processor task             |
//! | [`error`]       | `SessionError`, `ProcessingFault`, `SetRoutesError`             |
//!
//! # Execution model
//!
//! ```text
//!  engine statuses ──┐
//!  raw locations   ──┼──► mpsc ──► processor task ──► ObserverRegistry ──► listeners
//!  set_routes      ──┤               (StatusProcessor)
//!  leg updates     ──┘
//! ```
//!
//! Every mutation of session state happens inside the processor task, in
//! arrival order.  Producers never touch that state directly.  The only
//! cross-task resource is the route-transaction flag, which the processor
//! reads on every status and a `set_routes` caller holds for the duration of
//! a route swap.

pub mod engine;
pub mod error;
pub mod guard;
pub mod instruction;
pub mod observer;
pub mod processor;
pub mod reroute;
pub mod session;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use engine::{EngineError, NavigationEngine, RouteAlternative, SetRoutes, SetRoutesValue};
pub use error::{FaultCause, ProcessingFault, SessionError, SessionResult, SetRoutesError, SetRoutesResult};
pub use guard::{RouteTransactionGuard, TransactionReason, TransactionToken};
pub use instruction::{InstructionDeduper, InstructionSnapshot, LatestInstructionWrapper};
pub use observer::{
    Channel, FallbackVersionsEvent, ObserverHandle, ObserverRegistry, SessionState, TripObserver,
};
pub use processor::{RouteSwap, SessionSnapshot, StatusProcessor};
pub use reroute::{ArbitratorState, RerouteArbitrator, RerouteTrigger};
pub use session::{LegIndexUpdate, StatusSink, TripSession};
