//! Source backends.

pub mod memory;

pub use memory::{CallbackCounters, InMemorySource};
