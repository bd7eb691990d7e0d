//! Explicit transaction context and synchronization callbacks.
//!
//! The context is a poll-scoped value passed into the endpoint rather than an
//! ambient/global lookup. A driver creates one per cycle and completes it once
//! the cycle's result is known.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

/// Outcome reported when a transaction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// The transaction committed.
    Committed,
    /// The transaction rolled back.
    RolledBack,
}

/// Callback fired when the surrounding transaction completes.
#[async_trait]
pub trait TransactionSynchronization: Send + Sync {
    /// Invoked exactly once with the final status.
    async fn after_completion(&self, status: TransactionStatus);
}

/// Poll-scoped transactional context.
///
/// Created at the start of a poll cycle and discarded at its end; never
/// persisted. Synchronizations registered during the cycle fire when
/// [`TransactionContext::complete`] is called.
pub struct TransactionContext {
    active: bool,
    synchronizations: Mutex<Vec<Arc<dyn TransactionSynchronization>>>,
}

impl TransactionContext {
    /// Context for a cycle running under an active transaction.
    pub fn active() -> Self {
        Self {
            active: true,
            synchronizations: Mutex::new(Vec::new()),
        }
    }

    /// Context for a cycle with no transaction.
    pub fn none() -> Self {
        Self {
            active: false,
            synchronizations: Mutex::new(Vec::new()),
        }
    }

    /// Whether a transaction is active for this cycle.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Register a synchronization to fire at completion.
    pub fn register(&self, sync: Arc<dyn TransactionSynchronization>) {
        self.synchronizations.lock().push(sync);
    }

    /// Number of synchronizations currently registered.
    pub fn synchronization_count(&self) -> usize {
        self.synchronizations.lock().len()
    }

    /// Complete the transaction, firing registered synchronizations in
    /// registration order. Draining guarantees each fires at most once even
    /// if completion is invoked twice.
    pub async fn complete(&self, status: TransactionStatus) {
        let synchronizations: Vec<_> = std::mem::take(&mut *self.synchronizations.lock());
        for sync in synchronizations {
            sync.after_completion(status).await;
        }
    }
}

/// Binding to whatever manages transactions around a poll cycle.
///
/// The real transaction manager is an external collaborator; this seam only
/// needs to open a context and close it with the cycle's result.
#[async_trait]
pub trait TransactionDriver: Send + Sync + 'static {
    /// Open the context for one poll cycle.
    fn begin(&self) -> TransactionContext;

    /// Close the context, committing on success and rolling back otherwise.
    async fn complete(&self, ctx: TransactionContext, success: bool);
}

/// Driver for non-transactional polling: no synchronizations ever fire.
pub struct NoTransactionDriver;

#[async_trait]
impl TransactionDriver for NoTransactionDriver {
    fn begin(&self) -> TransactionContext {
        TransactionContext::none()
    }

    async fn complete(&self, _ctx: TransactionContext, _success: bool) {}
}

/// Driver applying the synthetic commit/rollback protocol without any real
/// transactional resource: commit when the cycle succeeded, rollback when it
/// failed.
pub struct PseudoTransactionDriver;

#[async_trait]
impl TransactionDriver for PseudoTransactionDriver {
    fn begin(&self) -> TransactionContext {
        TransactionContext::active()
    }

    async fn complete(&self, ctx: TransactionContext, success: bool) {
        let status = if success {
            TransactionStatus::Committed
        } else {
            TransactionStatus::RolledBack
        };
        ctx.complete(status).await;
    }
}
