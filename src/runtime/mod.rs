//! Runtime adapters for spawning scheduler loops.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
