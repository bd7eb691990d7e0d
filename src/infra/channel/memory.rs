//! Bounded in-memory message channel backed by a Tokio mpsc queue.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;

use crate::core::endpoint::MessageChannel;
use crate::core::error::PollerError;
use crate::core::message::{Message, PollPayload};

/// Bounded queue channel. Sends block until space is available or the
/// configured timeout elapses.
pub struct QueueChannel<P> {
    tx: mpsc::Sender<Message<P>>,
    rx: AsyncMutex<mpsc::Receiver<Message<P>>>,
}

impl<P> QueueChannel<P> {
    /// Create a channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: AsyncMutex::new(rx),
        }
    }

    /// Receive the next message, returning `None` when the timeout elapses.
    pub async fn receive(&self, timeout: Duration) -> Option<Message<P>> {
        let mut rx = self.rx.lock().await;
        tokio::time::timeout(timeout, rx.recv()).await.ok().flatten()
    }
}

#[async_trait]
impl<P> MessageChannel<P> for QueueChannel<P>
where
    P: PollPayload,
{
    async fn send(&self, message: Message<P>, timeout: Duration) -> Result<(), PollerError> {
        match tokio::time::timeout(timeout, self.tx.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(PollerError::Dispatch(format!("channel closed: {err}"))),
            Err(_) => Err(PollerError::DispatchTimeout(timeout)),
        }
    }
}
