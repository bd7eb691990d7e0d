//! Trigger policies computing the next execution instant for a scheduled task.

use std::time::{Duration, Instant};

/// Execution history handed to a trigger when computing the next instant.
///
/// Owned by the scheduler loop; a fresh default context is used for the first
/// computation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriggerContext {
    /// Instant at which the last invocation actually started.
    pub last_scheduled: Option<Instant>,
    /// Instant at which the last invocation completed.
    pub last_completion: Option<Instant>,
}

/// Policy computing when a scheduled task should run next.
///
/// Triggers are stateless with respect to failure handling: backoff after a
/// failed invocation is expressed by the task returning
/// [`crate::core::TaskOutcome::Retry`], which the scheduler applies without
/// consulting the trigger.
pub trait Trigger: Send + Sync + 'static {
    /// Compute the next execution instant, or `None` to retire the task.
    fn next_execution(&self, ctx: &TriggerContext) -> Option<Instant>;
}

/// Periodic trigger supporting fixed-rate and fixed-delay semantics.
///
/// Fixed-rate measures the period from the start of the previous invocation;
/// fixed-delay measures it from its completion.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTrigger {
    period: Duration,
    fixed_rate: bool,
    initial_delay: Duration,
}

impl PeriodicTrigger {
    /// Create a fixed-rate trigger with the given period.
    pub const fn fixed_rate(period: Duration) -> Self {
        Self {
            period,
            fixed_rate: true,
            initial_delay: Duration::ZERO,
        }
    }

    /// Create a fixed-delay trigger with the given period.
    pub const fn fixed_delay(period: Duration) -> Self {
        Self {
            period,
            fixed_rate: false,
            initial_delay: Duration::ZERO,
        }
    }

    /// Delay the first execution by the given duration.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }
}

impl Trigger for PeriodicTrigger {
    fn next_execution(&self, ctx: &TriggerContext) -> Option<Instant> {
        let base = if self.fixed_rate {
            ctx.last_scheduled
        } else {
            ctx.last_completion
        };
        match base {
            Some(base) => Some(base + self.period),
            None => Some(Instant::now() + self.initial_delay),
        }
    }
}

/// Trigger that re-arms immediately after each completion.
///
/// Used by blocking-wait loops (e.g. the idle adapter) where the task itself
/// blocks until external work arrives and should be resubmitted right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateTrigger;

impl Trigger for ImmediateTrigger {
    fn next_execution(&self, _ctx: &TriggerContext) -> Option<Instant> {
        Some(Instant::now())
    }
}
