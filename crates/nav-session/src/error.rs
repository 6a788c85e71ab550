use thiserror::Error;

use nav_core::{NavError, RouteId};

use crate::{EngineError, TransactionReason};

// ── ProcessingFault ───────────────────────────────────────────────────────────

/// Why a status could not be processed.
#[derive(Debug, Error)]
pub enum FaultCause {
    #[error("panic while processing status: {0}")]
    Panic(String),
}

/// An unexpected failure while folding a status into session state.
///
/// Carries the session context at the time of the failure.  Fatal to the
/// processor task: the host decides whether to build a new session.
#[derive(Debug, Error)]
#[error("status processing failed (route transaction active: {transaction_active}, active route: {active_route:?})")]
pub struct ProcessingFault {
    pub transaction_active: bool,
    pub active_route:       Option<RouteId>,
    #[source]
    pub cause: FaultCause,
}

// ── SessionError ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session configuration: {0}")]
    Config(#[from] NavError),

    #[error("session processor is no longer running")]
    Closed,

    #[error(transparent)]
    Faulted(#[from] ProcessingFault),

    #[error("session processor task failed: {0}")]
    Join(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

// ── SetRoutesError ────────────────────────────────────────────────────────────

/// A route replacement that did not take effect.  The active route is unchanged.
#[derive(Debug, Error)]
pub enum SetRoutesError {
    #[error("engine rejected {reason} routes: {source}")]
    Engine {
        reason: TransactionReason,
        #[source]
        source: EngineError,
    },

    #[error("cannot refresh an empty route list")]
    EmptyRefresh,

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type SetRoutesResult = Result<crate::SetRoutesValue, SetRoutesError>;
