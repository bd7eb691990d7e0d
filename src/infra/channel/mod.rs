//! Channel backends.

pub mod memory;

pub use memory::QueueChannel;
