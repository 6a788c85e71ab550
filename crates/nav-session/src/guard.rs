//! Route-replacement transactions.
//!
//! # Design
//!
//! Two pieces of state, shared between the processor task and `set_routes`
//! callers:
//!
//! - an `AtomicBool` the processor checks on every status: while it is set,
//!   statuses produce no progress, instruction, or off-route updates;
//! - an async mutex that queues route replacements behind each other.
//!
//! A [`TransactionToken`] owns the mutex guard.  Dropping the token clears
//! the flag first, then releases the mutex to the next queued writer.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// What a transaction is doing to the route list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransactionReason {
    CleanUp,
    NewRoute,
    Reroute,
    AlternativesOnly,
    Reorder,
    Refresh,
}

impl fmt::Display for TransactionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionReason::CleanUp          => "clean-up",
            TransactionReason::NewRoute         => "new-route",
            TransactionReason::Reroute          => "reroute",
            TransactionReason::AlternativesOnly => "alternatives-only",
            TransactionReason::Reorder          => "reorder",
            TransactionReason::Refresh          => "refresh",
        };
        f.write_str(name)
    }
}

// ── RouteTransactionGuard ─────────────────────────────────────────────────────

/// Cloneable handle to the transaction flag and writer mutex.
#[derive(Clone, Default)]
pub struct RouteTransactionGuard {
    active: Arc<AtomicBool>,
    writer: Arc<Mutex<()>>,
}

impl RouteTransactionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for any running transaction to finish, then open one.
    pub async fn begin(&self, reason: TransactionReason) -> TransactionToken {
        let permit = Arc::clone(&self.writer).lock_owned().await;
        self.open(reason, permit)
    }

    /// Open a transaction only if none is running.
    pub fn try_begin(&self, reason: TransactionReason) -> Option<TransactionToken> {
        let permit = Arc::clone(&self.writer).try_lock_owned().ok()?;
        Some(self.open(reason, permit))
    }

    /// Close the transaction `token` belongs to.  Equivalent to dropping it.
    pub fn end(&self, token: TransactionToken) {
        drop(token);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn open(&self, reason: TransactionReason, permit: OwnedMutexGuard<()>) -> TransactionToken {
        self.active.store(true, Ordering::Release);
        debug!(%reason, "route transaction started");
        TransactionToken {
            reason,
            active:  Arc::clone(&self.active),
            _permit: permit,
        }
    }
}

impl fmt::Debug for RouteTransactionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTransactionGuard")
            .field("active", &self.is_active())
            .finish()
    }
}

// ── TransactionToken ──────────────────────────────────────────────────────────

/// Proof of an open transaction.  The transaction ends when this is dropped.
pub struct TransactionToken {
    reason:  TransactionReason,
    active:  Arc<AtomicBool>,
    _permit: OwnedMutexGuard<()>,
}

impl TransactionToken {
    pub fn reason(&self) -> TransactionReason {
        self.reason
    }
}

impl Drop for TransactionToken {
    fn drop(&mut self) {
        // Runs before `_permit` is released.
        self.active.store(false, Ordering::Release);
        debug!(reason = %self.reason, "route transaction finished");
    }
}

impl fmt::Debug for TransactionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionToken").field("reason", &self.reason).finish()
    }
}
