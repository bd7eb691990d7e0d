//! Core polling abstractions: triggers, scheduler, sources, endpoints.

pub mod endpoint;
pub mod error;
pub mod idle;
pub mod message;
pub mod scheduler;
pub mod source;
pub mod transaction;
pub mod trigger;

pub use endpoint::{
    BookkeepingPolicy, DispositionExpression, MessageChannel, PollOutcome, PollingEndpoint,
    SourcePoller,
};
pub use error::{AppResult, PollerError};
pub use idle::{IdleAdapter, IdleReceiver, IdleSettings};
pub use message::{Message, PollPayload, WorkUnit};
pub use scheduler::{
    next_execution_after, RecurringTask, ScheduledHandle, Spawn, TaskOutcome, TaskScheduler,
};
pub use source::{PseudoTransactionalSource, ResourceHandle};
pub use transaction::{
    NoTransactionDriver, PseudoTransactionDriver, TransactionContext, TransactionDriver,
    TransactionStatus, TransactionSynchronization,
};
pub use trigger::{ImmediateTrigger, PeriodicTrigger, Trigger, TriggerContext};
