//! In-process synchronization bus
//!
//! Connects CacheService instances living in the same process, mirroring the
//! browser broadcast primitive's semantics: a message is delivered to every
//! endpoint on the bus except the one that sent it. Delivery is synchronous
//! and therefore deterministic, which makes this the transport of choice for
//! multi-instance tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::transport::{MessageHandler, SyncTransport};
use crate::types::SyncMessage;

#[derive(Default)]
struct BusInner {
    endpoints: Mutex<HashMap<Uuid, MessageHandler>>,
}

/// Shared bus that hands out per-instance endpoints
///
/// Cloning is cheap; clones address the same set of endpoints.
#[derive(Clone, Default)]
pub struct LocalSyncBus {
    inner: Arc<BusInner>,
}

impl LocalSyncBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new endpoint attached to this bus
    pub fn endpoint(&self) -> LocalBusTransport {
        LocalBusTransport {
            bus: self.clone(),
            id: Uuid::new_v4(),
        }
    }

    /// Number of endpoints with a registered handler
    pub fn endpoint_count(&self) -> usize {
        self.inner.endpoints.lock().len()
    }

    fn deliver(&self, origin: Uuid, message: &SyncMessage) {
        // Handlers are cloned out so delivery runs outside the bus lock.
        let handlers: Vec<MessageHandler> = {
            let endpoints = self.inner.endpoints.lock();
            endpoints
                .iter()
                .filter(|(id, _)| **id != origin)
                .map(|(_, handler)| handler.clone())
                .collect()
        };

        for handler in handlers {
            handler(message.clone());
        }
    }

    fn register(&self, id: Uuid, handler: MessageHandler) {
        self.inner.endpoints.lock().insert(id, handler);
    }
}

/// One instance's endpoint on a [`LocalSyncBus`]
pub struct LocalBusTransport {
    bus: LocalSyncBus,
    id: Uuid,
}

impl SyncTransport for LocalBusTransport {
    fn broadcast(&self, message: &SyncMessage) {
        self.bus.deliver(self.id, message);
    }

    fn set_handler(&self, handler: MessageHandler) {
        self.bus.register(self.id, handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_delivers_to_peers_not_sender() {
        let bus = LocalSyncBus::new();
        let a = bus.endpoint();
        let b = bus.endpoint();
        let c = bus.endpoint();

        let a_seen = Arc::new(AtomicUsize::new(0));
        let b_seen = Arc::new(AtomicUsize::new(0));
        let c_seen = Arc::new(AtomicUsize::new(0));

        let sink = a_seen.clone();
        a.set_handler(Arc::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));
        let sink = b_seen.clone();
        b.set_handler(Arc::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));
        let sink = c_seen.clone();
        c.set_handler(Arc::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));

        a.broadcast(&SyncMessage::invalidate("k"));

        assert_eq!(a_seen.load(Ordering::SeqCst), 0);
        assert_eq!(b_seen.load(Ordering::SeqCst), 1);
        assert_eq!(c_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_broadcast_without_peers_is_harmless() {
        let bus = LocalSyncBus::new();
        let only = bus.endpoint();
        only.set_handler(Arc::new(|_| panic!("must not self-deliver")));
        only.broadcast(&SyncMessage::invalidate_all());
    }

    #[test]
    fn test_message_payload_passes_through() {
        let bus = LocalSyncBus::new();
        let a = bus.endpoint();
        let b = bus.endpoint();

        let received = Arc::new(Mutex::new(None));
        let sink = received.clone();
        b.set_handler(Arc::new(move |msg| {
            *sink.lock() = Some(msg);
        }));

        let sent = SyncMessage::set(
            "k",
            serde_json::json!(7),
            std::time::Duration::from_secs(5),
        );
        a.broadcast(&sent);

        assert_eq!(received.lock().clone(), Some(sent));
    }
}
