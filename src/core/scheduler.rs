//! Trigger-driven task scheduler with cancellable handles.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::core::error::PollerError;
use crate::core::trigger::{PeriodicTrigger, Trigger, TriggerContext};

/// Result of one invocation of a recurring task.
///
/// Failure handling is expressed through this explicit result rather than by
/// mutating shared trigger state: the scheduler consumes the outcome to decide
/// the next instant.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Invocation finished; the trigger decides the next instant.
    Completed,
    /// Invocation failed transiently; run again after the given backoff.
    Retry(Duration),
    /// Invocation failed terminally; no further executions are scheduled.
    Fatal(PollerError),
}

/// A task executed repeatedly under a [`Trigger`] policy.
#[async_trait]
pub trait RecurringTask: Send + Sync + 'static {
    /// Run one invocation and report its outcome.
    ///
    /// Invocations of the same task are never run concurrently: the scheduler
    /// waits for one invocation to finish before computing the next instant.
    async fn run(&self) -> TaskOutcome;
}

/// Abstraction for spawning the scheduling loop on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Compute the next execution instant from a trigger and the last outcome.
///
/// `Retry` overrides the trigger with `now + delay`; `Fatal` retires the
/// task; `Completed` defers to the trigger.
pub fn next_execution_after(
    trigger: &dyn Trigger,
    ctx: &TriggerContext,
    outcome: TaskOutcome,
) -> Option<Instant> {
    match outcome {
        TaskOutcome::Completed => trigger.next_execution(ctx),
        TaskOutcome::Retry(delay) => {
            tracing::warn!(?delay, "task failed; delaying next execution");
            Some(Instant::now() + delay)
        }
        TaskOutcome::Fatal(err) => {
            tracing::error!(error = %err, "task failed fatally; no further executions");
            None
        }
    }
}

/// Cancellation token for a running repeated task.
///
/// Cancelling interrupts a pending wait and, where the runtime allows it, an
/// in-flight invocation. Dropping every clone of the handle also cancels the
/// task, so the owner that started it must keep it alive.
#[derive(Clone)]
pub struct ScheduledHandle {
    cancel: watch::Sender<bool>,
    finished: Arc<AtomicBool>,
}

impl ScheduledHandle {
    /// Cancel the task. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Whether the scheduling loop has fully exited.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

/// Scheduler executing (task, trigger) pairs on a spawner-backed runtime.
///
/// Each pair is logically single-threaded; a failing invocation never halts
/// the loop of another scheduled task.
pub struct TaskScheduler<S: Spawn> {
    spawner: S,
}

impl<S: Spawn> TaskScheduler<S> {
    /// Create a scheduler over the given spawner.
    pub const fn new(spawner: S) -> Self {
        Self { spawner }
    }

    /// Schedule a recurring task under a trigger policy.
    pub fn schedule(
        &self,
        task: Arc<dyn RecurringTask>,
        trigger: Arc<dyn Trigger>,
    ) -> ScheduledHandle {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let finished = Arc::new(AtomicBool::new(false));
        let finished_flag = Arc::clone(&finished);

        self.spawner.spawn(async move {
            let mut ctx = TriggerContext::default();
            let mut next = trigger.next_execution(&ctx);
            loop {
                let Some(at) = next else {
                    tracing::debug!("trigger yielded no next instant; task retired");
                    break;
                };
                tokio::select! {
                    () = tokio::time::sleep_until(tokio::time::Instant::from_std(at)) => {}
                    _ = cancel_rx.changed() => {
                        tracing::debug!("scheduled task cancelled while waiting");
                        break;
                    }
                }
                ctx.last_scheduled = Some(Instant::now());
                let outcome = tokio::select! {
                    outcome = task.run() => outcome,
                    _ = cancel_rx.changed() => {
                        tracing::debug!("scheduled task cancelled mid-invocation");
                        break;
                    }
                };
                ctx.last_completion = Some(Instant::now());
                next = next_execution_after(trigger.as_ref(), &ctx, outcome);
            }
            finished_flag.store(true, Ordering::Release);
        });

        ScheduledHandle {
            cancel: cancel_tx,
            finished,
        }
    }

    /// Schedule a recurring task at a fixed rate.
    pub fn schedule_at_fixed_rate(
        &self,
        task: Arc<dyn RecurringTask>,
        period: Duration,
    ) -> ScheduledHandle {
        self.schedule(task, Arc::new(PeriodicTrigger::fixed_rate(period)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trigger::ImmediateTrigger;

    #[test]
    fn retry_outcome_overrides_trigger() {
        let ctx = TriggerContext::default();
        let backoff = Duration::from_secs(30);
        let before = Instant::now();
        let next =
            next_execution_after(&ImmediateTrigger, &ctx, TaskOutcome::Retry(backoff)).unwrap();
        assert!(next >= before + backoff);
    }

    #[test]
    fn fatal_outcome_retires_task() {
        let ctx = TriggerContext::default();
        let outcome = TaskOutcome::Fatal(PollerError::Connection("refused".into()));
        assert!(next_execution_after(&ImmediateTrigger, &ctx, outcome).is_none());
    }

    #[test]
    fn completed_outcome_defers_to_trigger() {
        let ctx = TriggerContext::default();
        assert!(next_execution_after(&ImmediateTrigger, &ctx, TaskOutcome::Completed).is_some());
    }
}
