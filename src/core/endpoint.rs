//! Polling endpoint driving the receive/dispatch/outcome protocol.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::error::PollerError;
use crate::core::message::{Message, PollPayload};
use crate::core::scheduler::{RecurringTask, TaskOutcome};
use crate::core::source::{PseudoTransactionalSource, ResourceHandle};
use crate::core::transaction::{
    TransactionContext, TransactionDriver, TransactionStatus, TransactionSynchronization,
};

/// Downstream dispatch sink with a configurable send timeout.
#[async_trait]
pub trait MessageChannel<P>: Send + Sync + 'static
where
    P: PollPayload,
{
    /// Send a message, failing if it cannot be accepted within the timeout.
    async fn send(&self, message: Message<P>, timeout: Duration) -> Result<(), PollerError>;
}

/// Expression computing a disposition string from a payload and its resource.
///
/// Evaluated at commit/rollback time, not at receive time; the result is
/// attached to a message delivered to a dedicated success/failure channel.
pub type DispositionExpression<P, R> = Arc<dyn Fn(&P, &R) -> String + Send + Sync>;

/// Whether no-transaction receive bookkeeping also runs under an active
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookkeepingPolicy {
    /// `after_receive_no_tx` fires only when no transaction is active.
    #[default]
    TransactionOnly,
    /// `after_receive_no_tx` also fires right after receive when a
    /// transaction is active.
    Always,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No unit was produced; no outcome callback is pending.
    Idle,
    /// A unit was produced and dispatched downstream.
    Dispatched,
}

/// Synchronization finalizing a source's resource at transaction completion.
struct SourceSynchronization<P, R, S, C> {
    source: Arc<S>,
    resource: R,
    payload: P,
    send_timeout: Duration,
    on_success: Option<(DispositionExpression<P, R>, Arc<C>)>,
    on_failure: Option<(DispositionExpression<P, R>, Arc<C>)>,
}

#[async_trait]
impl<P, R, S, C> TransactionSynchronization for SourceSynchronization<P, R, S, C>
where
    P: PollPayload,
    R: ResourceHandle,
    S: PseudoTransactionalSource<P, R>,
    C: MessageChannel<P>,
{
    async fn after_completion(&self, status: TransactionStatus) {
        match status {
            TransactionStatus::Committed => {
                self.source.after_commit(&self.resource);
                if let Some((expression, channel)) = &self.on_success {
                    let disposition = expression(&self.payload, &self.resource);
                    let message = Message::with_disposition(self.payload.clone(), disposition);
                    if let Err(err) = channel.send(message, self.send_timeout).await {
                        tracing::error!(error = %err, "failed to deliver success disposition");
                    }
                }
            }
            TransactionStatus::RolledBack => {
                self.source.after_rollback(&self.resource);
                if let Some((expression, channel)) = &self.on_failure {
                    let disposition = expression(&self.payload, &self.resource);
                    let message = Message::with_disposition(self.payload.clone(), disposition);
                    if let Err(err) = channel.send(message, self.send_timeout).await {
                        tracing::error!(error = %err, "failed to deliver failure disposition");
                    }
                }
            }
        }
    }
}

/// Endpoint driving one poll cycle against a pseudo-transactional source.
///
/// Per cycle: receive from the source; under an active transaction register a
/// synchronization that fires `after_commit`/`after_rollback` at completion,
/// then dispatch; without a transaction fire `after_receive_no_tx`
/// immediately, dispatch, then `after_send_no_tx` on success. Dispatch
/// failure without a transaction is fatal for the cycle; with a transaction
/// it propagates so the driver can roll back.
pub struct PollingEndpoint<P, R, S, C> {
    source: Arc<S>,
    output: Arc<C>,
    send_timeout: Duration,
    on_success: Option<(DispositionExpression<P, R>, Arc<C>)>,
    on_failure: Option<(DispositionExpression<P, R>, Arc<C>)>,
    bookkeeping: BookkeepingPolicy,
}

impl<P, R, S, C> PollingEndpoint<P, R, S, C>
where
    P: PollPayload,
    R: ResourceHandle,
    S: PseudoTransactionalSource<P, R>,
    C: MessageChannel<P>,
{
    /// Default timeout for downstream dispatch.
    pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(1);

    /// Create an endpoint over a source and an output channel.
    pub fn new(source: Arc<S>, output: Arc<C>) -> Self {
        Self {
            source,
            output,
            send_timeout: Self::DEFAULT_SEND_TIMEOUT,
            on_success: None,
            on_failure: None,
            bookkeeping: BookkeepingPolicy::default(),
        }
    }

    /// Override the dispatch timeout.
    #[must_use]
    pub const fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Attach a success expression evaluated at commit time; its disposition
    /// is delivered to the given channel.
    #[must_use]
    pub fn with_on_success(
        mut self,
        expression: DispositionExpression<P, R>,
        channel: Arc<C>,
    ) -> Self {
        self.on_success = Some((expression, channel));
        self
    }

    /// Attach a failure expression evaluated at rollback time; its
    /// disposition is delivered to the given channel.
    #[must_use]
    pub fn with_on_failure(
        mut self,
        expression: DispositionExpression<P, R>,
        channel: Arc<C>,
    ) -> Self {
        self.on_failure = Some((expression, channel));
        self
    }

    /// Set the receive-bookkeeping policy for transactional cycles.
    #[must_use]
    pub const fn with_bookkeeping(mut self, policy: BookkeepingPolicy) -> Self {
        self.bookkeeping = policy;
        self
    }

    /// Run one poll cycle under the given transactional context.
    ///
    /// Exactly one outcome callback fires for every cycle that produces a
    /// unit: immediately for the no-transaction pair, or at context
    /// completion for commit/rollback.
    pub async fn poll(&self, txn: &TransactionContext) -> Result<PollOutcome, PollerError> {
        let unit = self.source.receive().await?;
        let resource = self.source.resource();

        if txn.is_active() {
            let Some(unit) = unit else {
                return Ok(PollOutcome::Idle);
            };
            if self.bookkeeping == BookkeepingPolicy::Always {
                self.source.after_receive_no_tx(&resource);
            }
            let synchronization = Arc::new(SourceSynchronization {
                source: Arc::clone(&self.source),
                resource,
                payload: unit.payload.clone(),
                send_timeout: self.send_timeout,
                on_success: self.on_success.clone(),
                on_failure: self.on_failure.clone(),
            });
            txn.register(synchronization);
            tracing::debug!(unit = %unit.id, "dispatching under active transaction");
            self.output
                .send(Message::from_unit(unit), self.send_timeout)
                .await?;
            Ok(PollOutcome::Dispatched)
        } else {
            // Receive bookkeeping fires even when nothing was produced.
            self.source.after_receive_no_tx(&resource);
            let Some(unit) = unit else {
                return Ok(PollOutcome::Idle);
            };
            tracing::debug!(unit = %unit.id, "dispatching without transaction");
            self.output
                .send(Message::from_unit(unit), self.send_timeout)
                .await?;
            self.source.after_send_no_tx(&resource);
            Ok(PollOutcome::Dispatched)
        }
    }
}

/// Schedulable task running begin/poll/complete cycles against an endpoint.
///
/// Repeats up to `max_messages_per_poll` cycles per invocation while units
/// keep being produced. Cycle failures are logged and end the invocation;
/// they never surface into the scheduler's fatal path.
pub struct SourcePoller<P, R, S, C> {
    endpoint: Arc<PollingEndpoint<P, R, S, C>>,
    driver: Arc<dyn TransactionDriver>,
    max_messages_per_poll: usize,
}

impl<P, R, S, C> SourcePoller<P, R, S, C> {
    /// Create a poller over an endpoint and a transaction driver.
    pub fn new(
        endpoint: Arc<PollingEndpoint<P, R, S, C>>,
        driver: Arc<dyn TransactionDriver>,
    ) -> Self {
        Self {
            endpoint,
            driver,
            max_messages_per_poll: 1,
        }
    }

    /// Allow up to `max` receive/dispatch cycles per scheduled invocation.
    #[must_use]
    pub const fn with_max_messages_per_poll(mut self, max: usize) -> Self {
        self.max_messages_per_poll = max;
        self
    }
}

#[async_trait]
impl<P, R, S, C> RecurringTask for SourcePoller<P, R, S, C>
where
    P: PollPayload,
    R: ResourceHandle,
    S: PseudoTransactionalSource<P, R>,
    C: MessageChannel<P>,
{
    async fn run(&self) -> TaskOutcome {
        for _ in 0..self.max_messages_per_poll {
            let ctx = self.driver.begin();
            let result = self.endpoint.poll(&ctx).await;
            self.driver.complete(ctx, result.is_ok()).await;
            match result {
                Ok(PollOutcome::Dispatched) => {}
                Ok(PollOutcome::Idle) => break,
                Err(err) => {
                    tracing::error!(error = %err, "poll cycle failed");
                    break;
                }
            }
        }
        TaskOutcome::Completed
    }
}
