//! Pseudo-transactional source capability for inbound adapters.

use async_trait::async_trait;

use crate::core::error::PollerError;
use crate::core::message::{PollPayload, WorkUnit};

/// Marker trait for resource handles finalized by outcome callbacks.
///
/// A handle is an opaque correlation token for external resource state (a
/// mailbox folder cursor, a DB row lock). It is owned by the source and passed
/// by reference to outcome callbacks; `Clone` lets the endpoint capture it in
/// a transaction synchronization without taking ownership away.
pub trait ResourceHandle: Send + Sync + Clone + 'static {}

/// Blanket implementation: any type meeting the requirements is a handle.
impl<T> ResourceHandle for T where T: Send + Sync + Clone + 'static {}

/// Capability exposed by an inbound adapter that polls an external system.
///
/// Each poll produces zero or one [`WorkUnit`]. The endpoint finalizes the
/// associated resource by invoking exactly one outcome callback per produced
/// unit: `after_commit` or `after_rollback` when a transaction is active, or
/// the `*_no_tx` pair otherwise. The no-transaction variants give adapters a
/// synthetic commit point even absent any real transactional resource.
#[async_trait]
pub trait PseudoTransactionalSource<P, R>: Send + Sync + 'static
where
    P: PollPayload,
    R: ResourceHandle,
{
    /// Produce the next unit of work, or `None` when nothing is available.
    async fn receive(&self) -> Result<Option<WorkUnit<P>>, PollerError>;

    /// The resource handle to be finalized for the current poll cycle.
    fn resource(&self) -> R;

    /// Called after the surrounding transaction committed.
    fn after_commit(&self, resource: &R);

    /// Called after the surrounding transaction rolled back.
    fn after_rollback(&self, resource: &R);

    /// Called right after `receive()` when no transaction is active.
    fn after_receive_no_tx(&self, resource: &R);

    /// Called after a successful dispatch when no transaction is active.
    /// Never called for a poll that produced no unit.
    fn after_send_no_tx(&self, resource: &R);
}
