//! Work units and messages flowing through polling endpoints.

use uuid::Uuid;

/// Marker trait for payloads carried by work units and messages.
///
/// Payloads must be `Send + Sync` for cross-thread dispatch and `Clone` so a
/// copy can be attached to disposition result messages fired at
/// commit/rollback time.
pub trait PollPayload: Send + Sync + Clone + 'static {}

/// Blanket implementation: any type meeting the requirements is a payload.
impl<T> PollPayload for T where T: Send + Sync + Clone + 'static {}

/// One unit of work produced by a single poll of a source.
///
/// Created by `receive()`, consumed by dispatch, and discarded once its
/// outcome callback has fired.
#[derive(Debug, Clone)]
pub struct WorkUnit<P> {
    /// Unique identifier for correlation in logs and result messages.
    pub id: Uuid,
    /// Opaque payload supplied by the source.
    pub payload: P,
}

impl<P> WorkUnit<P> {
    /// Wrap a payload in a new work unit with a fresh identifier.
    pub fn new(payload: P) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
        }
    }
}

/// A message dispatched to a downstream channel.
#[derive(Debug, Clone)]
pub struct Message<P> {
    /// Identifier, inherited from the originating work unit where applicable.
    pub id: Uuid,
    /// Message payload.
    pub payload: P,
    /// Disposition computed by a success/failure expression, present only on
    /// result messages delivered to success/failure channels.
    pub disposition: Option<String>,
}

impl<P> Message<P> {
    /// Create a plain message with a fresh identifier.
    pub fn new(payload: P) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            disposition: None,
        }
    }

    /// Create the dispatch message for a work unit, keeping its identifier.
    pub fn from_unit(unit: WorkUnit<P>) -> Self {
        Self {
            id: unit.id,
            payload: unit.payload,
            disposition: None,
        }
    }

    /// Create a disposition-tagged result message.
    pub fn with_disposition(payload: P, disposition: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            disposition: Some(disposition.into()),
        }
    }
}
