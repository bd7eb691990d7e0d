//! # Prometheus Poller
//!
//! A trigger-driven polling kernel with pseudo-transactional sources for the
//! Prometheus AI Platform.
//!
//! This library provides the scheduling and outcome-protocol layer used by
//! inbound adapters that poll an external resource (a mailbox, a table, a
//! queue) and hand units of work to a downstream channel. It implements a
//! synthetic commit/rollback protocol so that adapters get transaction-like
//! finalization callbacks even when no real transaction manager is present.
//!
//! ## Core Problem Solved
//!
//! Inbound adapters share the same hard requirements regardless of what they
//! poll:
//!
//! - **Scheduled receive loops**: a trigger policy decides when the next poll
//!   happens; the scheduler never runs two polls of the same adapter at once
//! - **Exactly-once finalization**: every unit of work produced by a poll must
//!   see exactly one outcome callback (commit, rollback, or the no-transaction
//!   pair) — never zero, never two
//! - **Failure-driven backoff**: a dropped connection during a blocking wait
//!   must delay the next attempt instead of hot-looping or killing the
//!   scheduler
//! - **Clean teardown**: stopping an adapter cancels its scheduled tasks
//!   before releasing the underlying resource
//!
//! ## Key Components
//!
//! - **`Trigger` / `TaskScheduler`**: pluggable next-execution policy and a
//!   cancellable, per-task-serialized scheduling loop
//! - **`PseudoTransactionalSource`**: the capability an inbound adapter
//!   exposes — produce zero-or-one [`core::WorkUnit`] per poll plus a resource
//!   handle finalized by outcome callbacks
//! - **`PollingEndpoint`**: drives one poll cycle and fires the correct
//!   outcome callback depending on transactional context and dispatch result
//! - **`IdleAdapter`**: wraps a blocking external wait (IMAP-IDLE style) with
//!   reconnect backoff and an independent keep-alive probe
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use prometheus_poller::core::{
//!     PeriodicTrigger, PollingEndpoint, PseudoTransactionDriver, SourcePoller, TaskScheduler,
//! };
//! use prometheus_poller::infra::channel::memory::QueueChannel;
//! use prometheus_poller::infra::source::memory::InMemorySource;
//! use prometheus_poller::runtime::TokioSpawner;
//!
//! let source = Arc::new(InMemorySource::<String>::new("orders"));
//! let output = Arc::new(QueueChannel::new(64));
//! let endpoint = Arc::new(PollingEndpoint::new(source, output));
//! let poller = Arc::new(SourcePoller::new(endpoint, Arc::new(PseudoTransactionDriver)));
//!
//! let scheduler = TaskScheduler::new(TokioSpawner::new(tokio::runtime::Handle::current()));
//! let handle = scheduler.schedule(
//!     poller,
//!     Arc::new(PeriodicTrigger::fixed_delay(Duration::from_millis(500))),
//! );
//! // ... later
//! handle.cancel();
//! ```
//!
//! For complete examples, see:
//! - `tests/endpoint_protocol_test.rs` - Outcome protocol integration tests
//! - `tests/idle_adapter_test.rs` - Reconnect backoff and teardown tests

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core polling abstractions: triggers, scheduler, sources, endpoints.
pub mod core;
/// Configuration models for pollers, triggers, and idle adapters.
pub mod config;
/// Builders to construct pollers from configuration.
pub mod builders;
/// Infrastructure adapters: in-memory sources and channels.
pub mod infra;
/// Runtime adapters (Tokio spawner).
pub mod runtime;
/// Shared utilities.
pub mod util;
