//! In-memory pseudo-transactional source for development and testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::error::PollerError;
use crate::core::message::{PollPayload, WorkUnit};
use crate::core::source::PseudoTransactionalSource;

/// Counters recording every outcome callback fired against a source.
#[derive(Debug, Default)]
pub struct CallbackCounters {
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    received_no_tx: AtomicUsize,
    sent_no_tx: AtomicUsize,
}

impl CallbackCounters {
    /// Number of `after_commit` invocations.
    pub fn commits(&self) -> usize {
        self.committed.load(Ordering::SeqCst)
    }

    /// Number of `after_rollback` invocations.
    pub fn rollbacks(&self) -> usize {
        self.rolled_back.load(Ordering::SeqCst)
    }

    /// Number of `after_receive_no_tx` invocations.
    pub fn receives_no_tx(&self) -> usize {
        self.received_no_tx.load(Ordering::SeqCst)
    }

    /// Number of `after_send_no_tx` invocations.
    pub fn sends_no_tx(&self) -> usize {
        self.sent_no_tx.load(Ordering::SeqCst)
    }
}

/// Queue-backed source handing back pre-loaded payloads, one per poll.
///
/// The resource handle is a fixed label; callback counters make the outcome
/// protocol observable.
pub struct InMemorySource<P> {
    items: Mutex<VecDeque<P>>,
    resource: String,
    counters: Arc<CallbackCounters>,
}

impl<P> InMemorySource<P> {
    /// Create an empty source with the given resource label.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            resource: resource.into(),
            counters: Arc::new(CallbackCounters::default()),
        }
    }

    /// Queue a payload for a future poll.
    pub fn push(&self, payload: P) {
        self.items.lock().push_back(payload);
    }

    /// Number of payloads not yet received.
    pub fn pending(&self) -> usize {
        self.items.lock().len()
    }

    /// Shared view of the callback counters.
    pub fn counters(&self) -> Arc<CallbackCounters> {
        Arc::clone(&self.counters)
    }
}

#[async_trait]
impl<P> PseudoTransactionalSource<P, String> for InMemorySource<P>
where
    P: PollPayload,
{
    async fn receive(&self) -> Result<Option<WorkUnit<P>>, PollerError> {
        Ok(self.items.lock().pop_front().map(WorkUnit::new))
    }

    fn resource(&self) -> String {
        self.resource.clone()
    }

    fn after_commit(&self, _resource: &String) {
        self.counters.committed.fetch_add(1, Ordering::SeqCst);
    }

    fn after_rollback(&self, _resource: &String) {
        self.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
    }

    fn after_receive_no_tx(&self, _resource: &String) {
        self.counters.received_no_tx.fetch_add(1, Ordering::SeqCst);
    }

    fn after_send_no_tx(&self, _resource: &String) {
        self.counters.sent_no_tx.fetch_add(1, Ordering::SeqCst);
    }
}
