//! Integration tests for the polling endpoint outcome protocol.
//!
//! These validate:
//! 1. Commit fires `after_commit` exactly once with the correct resource
//! 2. Rollback fires `after_rollback` exactly once, never `after_commit`
//! 3. Without a transaction, `after_receive_no_tx` precedes `after_send_no_tx`
//! 4. Empty polls never fire `after_send_no_tx`
//! 5. Disposition expressions evaluate at commit/rollback time and land on
//!    the dedicated success/failure channels
//! 6. Dispatch failures follow the transactional vs non-transactional paths

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use prometheus_poller::core::{
    BookkeepingPolicy, DispositionExpression, Message, MessageChannel, PollOutcome, PollerError,
    PollingEndpoint, PseudoTransactionDriver, PseudoTransactionalSource, RecurringTask,
    SourcePoller, TaskOutcome, TransactionContext, TransactionStatus, WorkUnit,
};
use prometheus_poller::infra::channel::memory::QueueChannel;
use prometheus_poller::infra::source::memory::InMemorySource;

/// Resource handle with an observable value, mirroring a mailbox cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BarResource {
    value: String,
}

#[derive(Default)]
struct CallRecord {
    committed: Mutex<Option<BarResource>>,
    rolled_back: Mutex<Option<BarResource>>,
    sequence: Mutex<Vec<&'static str>>,
}

struct TestSource {
    items: Mutex<VecDeque<String>>,
    resource: BarResource,
    record: Arc<CallRecord>,
}

impl TestSource {
    fn with_items(items: &[&str]) -> Self {
        Self {
            items: Mutex::new(items.iter().map(ToString::to_string).collect()),
            resource: BarResource {
                value: "bar".to_string(),
            },
            record: Arc::new(CallRecord::default()),
        }
    }
}

#[async_trait]
impl PseudoTransactionalSource<String, BarResource> for TestSource {
    async fn receive(&self) -> Result<Option<WorkUnit<String>>, PollerError> {
        Ok(self.items.lock().pop_front().map(WorkUnit::new))
    }

    fn resource(&self) -> BarResource {
        self.resource.clone()
    }

    fn after_commit(&self, resource: &BarResource) {
        *self.record.committed.lock() = Some(resource.clone());
        self.record.sequence.lock().push("commit");
    }

    fn after_rollback(&self, resource: &BarResource) {
        *self.record.rolled_back.lock() = Some(resource.clone());
        self.record.sequence.lock().push("rollback");
    }

    fn after_receive_no_tx(&self, _resource: &BarResource) {
        self.record.sequence.lock().push("receive");
    }

    fn after_send_no_tx(&self, _resource: &BarResource) {
        self.record.sequence.lock().push("send");
    }
}

/// Channel that rejects every message.
struct FailingChannel;

#[async_trait]
impl MessageChannel<String> for FailingChannel {
    async fn send(&self, _message: Message<String>, _timeout: Duration) -> Result<(), PollerError> {
        Err(PollerError::Dispatch("downstream rejected".into()))
    }
}

#[tokio::test]
async fn commit_fires_after_commit_exactly_once() {
    let source = Arc::new(TestSource::with_items(&["foo"]));
    let record = Arc::clone(&source.record);
    let output = Arc::new(QueueChannel::new(8));
    let endpoint = PollingEndpoint::new(Arc::clone(&source), Arc::clone(&output));

    let ctx = TransactionContext::active();
    let outcome = endpoint.poll(&ctx).await.unwrap();
    assert_eq!(outcome, PollOutcome::Dispatched);
    assert_eq!(ctx.synchronization_count(), 1);

    ctx.complete(TransactionStatus::Committed).await;

    assert_eq!(record.committed.lock().as_ref().unwrap().value, "bar");
    assert!(record.rolled_back.lock().is_none());
    assert_eq!(*record.sequence.lock(), vec!["commit"]);

    let delivered = output.receive(Duration::from_millis(100)).await.unwrap();
    assert_eq!(delivered.payload, "foo");
}

#[tokio::test]
async fn rollback_fires_after_rollback_never_commit() {
    let source = Arc::new(TestSource::with_items(&["foo"]));
    let record = Arc::clone(&source.record);
    let output = Arc::new(QueueChannel::new(8));
    let endpoint = PollingEndpoint::new(Arc::clone(&source), output);

    let ctx = TransactionContext::active();
    endpoint.poll(&ctx).await.unwrap();
    ctx.complete(TransactionStatus::RolledBack).await;

    assert_eq!(record.rolled_back.lock().as_ref().unwrap().value, "bar");
    assert!(record.committed.lock().is_none());
}

#[tokio::test]
async fn no_tx_receive_then_send_in_order() {
    let source = Arc::new(TestSource::with_items(&["foo"]));
    let record = Arc::clone(&source.record);
    let output = Arc::new(QueueChannel::new(8));
    let endpoint = PollingEndpoint::new(Arc::clone(&source), Arc::clone(&output));

    let ctx = TransactionContext::none();
    let outcome = endpoint.poll(&ctx).await.unwrap();
    assert_eq!(outcome, PollOutcome::Dispatched);

    assert_eq!(*record.sequence.lock(), vec!["receive", "send"]);
    assert!(record.committed.lock().is_none());
    assert!(record.rolled_back.lock().is_none());
    assert!(output.receive(Duration::from_millis(100)).await.is_some());
}

#[tokio::test]
async fn empty_no_tx_poll_fires_only_receive_bookkeeping() {
    let source = Arc::new(TestSource::with_items(&[]));
    let record = Arc::clone(&source.record);
    let output = Arc::new(QueueChannel::new(8));
    let endpoint = PollingEndpoint::new(Arc::clone(&source), Arc::clone(&output));

    let ctx = TransactionContext::none();
    let outcome = endpoint.poll(&ctx).await.unwrap();
    assert_eq!(outcome, PollOutcome::Idle);

    assert_eq!(*record.sequence.lock(), vec!["receive"]);
    assert!(output.receive(Duration::from_millis(20)).await.is_none());
}

#[tokio::test]
async fn empty_transactional_poll_registers_nothing() {
    let source = Arc::new(TestSource::with_items(&[]));
    let record = Arc::clone(&source.record);
    let output = Arc::new(QueueChannel::new(8));
    let endpoint = PollingEndpoint::new(Arc::clone(&source), output);

    let ctx = TransactionContext::active();
    let outcome = endpoint.poll(&ctx).await.unwrap();
    assert_eq!(outcome, PollOutcome::Idle);
    assert_eq!(ctx.synchronization_count(), 0);

    ctx.complete(TransactionStatus::Committed).await;
    assert!(record.sequence.lock().is_empty());
}

#[tokio::test]
async fn dispositions_evaluate_at_completion_time() {
    let source = Arc::new(TestSource::with_items(&["foo", "foo"]));
    let record = Arc::clone(&source.record);
    let output = Arc::new(QueueChannel::new(8));
    let success = Arc::new(QueueChannel::new(8));
    let failure = Arc::new(QueueChannel::new(8));

    let on_success: DispositionExpression<String, BarResource> =
        Arc::new(|payload, resource| format!("{payload}{}", resource.value));
    let on_failure: DispositionExpression<String, BarResource> =
        Arc::new(|payload, resource| format!("{payload}X{}", resource.value));

    let endpoint = PollingEndpoint::new(Arc::clone(&source), output)
        .with_on_success(on_success, Arc::clone(&success))
        .with_on_failure(on_failure, Arc::clone(&failure));

    // First cycle commits.
    let ctx = TransactionContext::active();
    endpoint.poll(&ctx).await.unwrap();
    ctx.complete(TransactionStatus::Committed).await;

    let result = success.receive(Duration::from_millis(100)).await.unwrap();
    assert_eq!(result.disposition.as_deref(), Some("foobar"));
    assert!(failure.receive(Duration::from_millis(20)).await.is_none());
    assert_eq!(record.committed.lock().as_ref().unwrap().value, "bar");

    // Second cycle rolls back.
    let ctx = TransactionContext::active();
    endpoint.poll(&ctx).await.unwrap();
    ctx.complete(TransactionStatus::RolledBack).await;

    let result = failure.receive(Duration::from_millis(100)).await.unwrap();
    assert_eq!(result.disposition.as_deref(), Some("fooXbar"));
    assert!(success.receive(Duration::from_millis(20)).await.is_none());
    assert_eq!(record.rolled_back.lock().as_ref().unwrap().value, "bar");
}

#[tokio::test]
async fn dispatch_failure_without_tx_is_fatal_for_cycle() {
    let source = Arc::new(TestSource::with_items(&["foo"]));
    let record = Arc::clone(&source.record);
    let endpoint = PollingEndpoint::new(Arc::clone(&source), Arc::new(FailingChannel));

    let ctx = TransactionContext::none();
    let err = endpoint.poll(&ctx).await.unwrap_err();
    assert!(matches!(err, PollerError::Dispatch(_)));

    // Receive bookkeeping fired, but no send callback and no commit/rollback.
    assert_eq!(*record.sequence.lock(), vec!["receive"]);
}

#[tokio::test]
async fn dispatch_failure_with_tx_reaches_rollback_path() {
    let source = Arc::new(TestSource::with_items(&["foo"]));
    let record = Arc::clone(&source.record);
    let endpoint = PollingEndpoint::new(Arc::clone(&source), Arc::new(FailingChannel));

    let ctx = TransactionContext::active();
    let err = endpoint.poll(&ctx).await.unwrap_err();
    assert!(matches!(err, PollerError::Dispatch(_)));

    // The synchronization was registered before dispatch, so the transaction
    // manager's rollback reaches the source.
    ctx.complete(TransactionStatus::RolledBack).await;
    assert_eq!(record.rolled_back.lock().as_ref().unwrap().value, "bar");
    assert!(record.committed.lock().is_none());
}

#[tokio::test]
async fn always_bookkeeping_fires_receive_under_tx() {
    let source = Arc::new(TestSource::with_items(&["foo"]));
    let record = Arc::clone(&source.record);
    let output = Arc::new(QueueChannel::new(8));
    let endpoint = PollingEndpoint::new(Arc::clone(&source), output)
        .with_bookkeeping(BookkeepingPolicy::Always);

    let ctx = TransactionContext::active();
    endpoint.poll(&ctx).await.unwrap();
    ctx.complete(TransactionStatus::Committed).await;

    assert_eq!(*record.sequence.lock(), vec!["receive", "commit"]);
}

#[tokio::test]
async fn source_poller_commits_each_unit_exactly_once() {
    let source = Arc::new(InMemorySource::new("inbox"));
    source.push("a".to_string());
    source.push("b".to_string());
    source.push("c".to_string());
    let counters = source.counters();

    let output = Arc::new(QueueChannel::new(8));
    let endpoint = Arc::new(PollingEndpoint::new(Arc::clone(&source), Arc::clone(&output)));
    let poller = SourcePoller::new(endpoint, Arc::new(PseudoTransactionDriver))
        .with_max_messages_per_poll(10);

    let outcome = poller.run().await;
    assert!(matches!(outcome, TaskOutcome::Completed));

    assert_eq!(counters.commits(), 3);
    assert_eq!(counters.rollbacks(), 0);
    assert_eq!(counters.receives_no_tx(), 0);
    for expected in ["a", "b", "c"] {
        let msg = output.receive(Duration::from_millis(100)).await.unwrap();
        assert_eq!(msg.payload, expected);
    }

    // An idle invocation fires no further callbacks.
    poller.run().await;
    assert_eq!(counters.commits(), 3);
}
