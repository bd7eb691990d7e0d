//! Error types for polling components.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by polling components.
#[derive(Debug, Error)]
pub enum PollerError {
    /// The source failed to produce a unit of work.
    #[error("receive failed: {0}")]
    Receive(String),
    /// Downstream dispatch failed.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    /// Downstream dispatch did not complete within the configured timeout.
    #[error("dispatch timed out after {0:?}")]
    DispatchTimeout(Duration),
    /// The connection to the external resource was lost or refused.
    #[error("connection error: {0}")]
    Connection(String),
    /// Releasing the external resource failed during shutdown.
    #[error("teardown failed: {0}")]
    Teardown(String),
    /// The adapter was started while already running.
    #[error("adapter already running")]
    AlreadyRunning,
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
