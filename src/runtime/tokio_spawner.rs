//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;

use crate::core::Spawn;

/// Tokio-based spawner that executes scheduler loops on a tokio runtime.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
    // Keeps a dedicated runtime alive when this spawner owns it.
    #[allow(dead_code)]
    owned: Option<Arc<tokio::runtime::Runtime>>,
}

impl TokioSpawner {
    /// Create a spawner from an existing tokio runtime handle.
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            owned: None,
        }
    }

    /// Create a spawner owning a new multi-threaded runtime with the
    /// specified number of worker threads.
    pub fn with_worker_threads(worker_threads: usize) -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .enable_all()
            .build()?;
        Ok(Self {
            handle: runtime.handle().clone(),
            owned: Some(Arc::new(runtime)),
        })
    }

    /// Create a spawner owning a runtime sized to the available CPUs.
    pub fn with_default_workers() -> Result<Self, std::io::Error> {
        Self::with_worker_threads(num_cpus::get())
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
