//! Adaptive retry wrapper around blocking external-wait receivers.
//!
//! Wraps an IMAP-IDLE style client: the receiving loop blocks until the
//! external system signals new data, drains it, dispatches downstream, and
//! immediately re-arms. A failure during the wait delays the next attempt by
//! a reconnect backoff instead of surfacing into the scheduler's fatal path,
//! unless automatic reconnection is disabled. An independent low-frequency
//! keep-alive probe checks the connection and swallows all errors.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::endpoint::MessageChannel;
use crate::core::error::PollerError;
use crate::core::message::{Message, PollPayload, WorkUnit};
use crate::core::scheduler::{RecurringTask, ScheduledHandle, Spawn, TaskOutcome, TaskScheduler};
use crate::core::trigger::ImmediateTrigger;

/// Seam over the blocking external client driven by the idle adapter.
///
/// Connection-level thread-safety is the client's responsibility: the
/// keep-alive probe shares the connection with the receiving loop but not a
/// lock.
#[async_trait]
pub trait IdleReceiver<P>: Send + Sync + 'static
where
    P: PollPayload,
{
    /// Block until the external system signals that new data is available.
    async fn wait_for_event(&self) -> Result<(), PollerError>;

    /// Drain all currently available units.
    async fn drain(&self) -> Result<Vec<WorkUnit<P>>, PollerError>;

    /// Best-effort connection probe.
    async fn ping(&self) -> Result<(), PollerError>;

    /// Release the underlying connection.
    async fn shutdown(&self) -> Result<(), PollerError>;
}

/// Tuning knobs for an idle adapter.
#[derive(Debug, Clone, Copy)]
pub struct IdleSettings {
    /// Backoff applied before the next wait after a failed cycle.
    pub reconnect_delay: Duration,
    /// Period of the keep-alive probe.
    pub ping_interval: Duration,
    /// Whether a failed cycle schedules a delayed retry instead of retiring
    /// the receiving loop.
    pub auto_reconnect: bool,
    /// Timeout for downstream dispatch.
    pub send_timeout: Duration,
}

impl Default for IdleSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(10),
            ping_interval: Duration::from_secs(10),
            auto_reconnect: true,
            send_timeout: Duration::from_secs(1),
        }
    }
}

/// Receiving loop: wait, drain, dispatch, re-arm.
struct ReceivingTask<P, Rv, C> {
    receiver: Arc<Rv>,
    output: Arc<C>,
    settings: IdleSettings,
    _marker: PhantomData<P>,
}

impl<P, Rv, C> ReceivingTask<P, Rv, C>
where
    P: PollPayload,
    Rv: IdleReceiver<P>,
    C: MessageChannel<P>,
{
    async fn cycle(&self) -> Result<usize, PollerError> {
        self.receiver.wait_for_event().await?;
        let units = self.receiver.drain().await?;
        let count = units.len();
        for unit in units {
            self.output
                .send(Message::from_unit(unit), self.settings.send_timeout)
                .await?;
        }
        Ok(count)
    }
}

#[async_trait]
impl<P, Rv, C> RecurringTask for ReceivingTask<P, Rv, C>
where
    P: PollPayload,
    Rv: IdleReceiver<P>,
    C: MessageChannel<P>,
{
    async fn run(&self) -> TaskOutcome {
        match self.cycle().await {
            Ok(count) => {
                tracing::debug!(count, "idle cycle complete; re-arming immediately");
                TaskOutcome::Completed
            }
            Err(err) if self.settings.auto_reconnect => {
                tracing::warn!(
                    error = %err,
                    delay = ?self.settings.reconnect_delay,
                    "idle cycle failed; reconnecting after delay"
                );
                TaskOutcome::Retry(self.settings.reconnect_delay)
            }
            Err(err) => {
                tracing::error!(error = %err, "idle cycle failed and reconnection is disabled");
                TaskOutcome::Fatal(err)
            }
        }
    }
}

/// Keep-alive probe sharing the receiver's connection. Errors never affect
/// scheduling.
struct KeepAliveTask<P, Rv> {
    receiver: Arc<Rv>,
    _marker: PhantomData<P>,
}

#[async_trait]
impl<P, Rv> RecurringTask for KeepAliveTask<P, Rv>
where
    P: PollPayload,
    Rv: IdleReceiver<P>,
{
    async fn run(&self) -> TaskOutcome {
        if let Err(err) = self.receiver.ping().await {
            tracing::debug!(error = %err, "keep-alive probe failed");
        }
        TaskOutcome::Completed
    }
}

struct IdleTasks {
    receiving: ScheduledHandle,
    ping: ScheduledHandle,
}

/// Event-driven inbound adapter wrapping a blocking-wait receiver.
pub struct IdleAdapter<P, Rv, C> {
    receiver: Arc<Rv>,
    output: Arc<C>,
    settings: IdleSettings,
    tasks: Mutex<Option<IdleTasks>>,
    _marker: PhantomData<P>,
}

impl<P, Rv, C> IdleAdapter<P, Rv, C>
where
    P: PollPayload,
    Rv: IdleReceiver<P>,
    C: MessageChannel<P>,
{
    /// Create an adapter over a receiver and an output channel.
    pub fn new(receiver: Arc<Rv>, output: Arc<C>, settings: IdleSettings) -> Self {
        Self {
            receiver,
            output,
            settings,
            tasks: Mutex::new(None),
            _marker: PhantomData,
        }
    }

    /// Start the receiving loop and the keep-alive probe.
    pub fn start<Sp: Spawn>(&self, scheduler: &TaskScheduler<Sp>) -> Result<(), PollerError> {
        let mut tasks = self.tasks.lock();
        if tasks.is_some() {
            return Err(PollerError::AlreadyRunning);
        }
        let receiving = scheduler.schedule(
            Arc::new(ReceivingTask {
                receiver: Arc::clone(&self.receiver),
                output: Arc::clone(&self.output),
                settings: self.settings,
                _marker: PhantomData::<P>,
            }),
            Arc::new(ImmediateTrigger),
        );
        let ping = scheduler.schedule_at_fixed_rate(
            Arc::new(KeepAliveTask {
                receiver: Arc::clone(&self.receiver),
                _marker: PhantomData::<P>,
            }),
            self.settings.ping_interval,
        );
        *tasks = Some(IdleTasks { receiving, ping });
        tracing::info!("idle adapter started");
        Ok(())
    }

    /// Stop the adapter: cancel both scheduled tasks, then release the
    /// underlying resource.
    ///
    /// Teardown is attempted exactly once per start; a teardown failure is
    /// reported as [`PollerError::Teardown`] but never blocks cancellation.
    /// Stopping an adapter that is not running is a no-op.
    pub async fn stop(&self) -> Result<(), PollerError> {
        let tasks = self.tasks.lock().take();
        let Some(tasks) = tasks else {
            return Ok(());
        };
        tasks.receiving.cancel();
        tasks.ping.cancel();
        tracing::info!("idle adapter stopping; releasing receiver");
        self.receiver
            .shutdown()
            .await
            .map_err(|err| PollerError::Teardown(err.to_string()))
    }

    /// Whether the adapter currently owns scheduled tasks.
    pub fn is_running(&self) -> bool {
        self.tasks.lock().is_some()
    }

    /// Clones of the live task handles, empty when stopped.
    pub fn handles(&self) -> Vec<ScheduledHandle> {
        self.tasks
            .lock()
            .as_ref()
            .map(|tasks| vec![tasks.receiving.clone(), tasks.ping.clone()])
            .unwrap_or_default()
    }
}
