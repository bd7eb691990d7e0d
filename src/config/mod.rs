//! Configuration models for pollers, triggers, and idle adapters.

pub mod poller;

pub use poller::{IdleConfig, PollerConfig, PollingConfig, TriggerConfig};
