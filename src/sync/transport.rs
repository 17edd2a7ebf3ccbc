//! Broadcast transport abstraction
//!
//! A transport propagates cache mutations to other instances of the same
//! logical process. Delivery is best-effort and fire-and-forget: no ordering
//! guarantee, no delivery guarantee, no timeout or cancellation. A message
//! either arrives or is silently dropped. Broadcast failures are logged,
//! never surfaced to the caller.

use std::sync::Arc;

use crate::types::SyncMessage;

/// Handler invoked for every inbound message from a peer
pub type MessageHandler = Arc<dyn Fn(SyncMessage) + Send + Sync>;

/// Abstract broadcast channel between instances
///
/// Implementations are selected at composition time; cache logic never knows
/// which one it is talking to. Running without any synchronization medium is
/// a supported configuration — see [`NoopTransport`].
pub trait SyncTransport: Send + Sync {
    /// Send a message to every peer instance, best-effort
    fn broadcast(&self, message: &SyncMessage);

    /// Register the handler for inbound peer messages
    ///
    /// Registering a new handler replaces any previous one.
    fn set_handler(&self, handler: MessageHandler);
}

/// Transport for single-instance mode
///
/// Broadcasts go nowhere and no messages ever arrive. All operations succeed;
/// absence of synchronization is not a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

impl NoopTransport {
    /// Create a no-op transport
    pub fn new() -> Self {
        Self
    }
}

impl SyncTransport for NoopTransport {
    fn broadcast(&self, _message: &SyncMessage) {}

    fn set_handler(&self, _handler: MessageHandler) {}
}
