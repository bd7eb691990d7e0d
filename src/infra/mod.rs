//! Infrastructure adapters: in-memory sources and channels.

pub mod channel;
pub mod source;

pub use channel::QueueChannel;
pub use source::InMemorySource;
