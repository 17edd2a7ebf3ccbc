//! Cache service: store + listeners + synchronization
//!
//! Local mutations follow a fixed sequence: write the store, notify local
//! listeners, then broadcast the mutation to peers. Inbound peer messages run
//! the same store write and listener notification but never re-broadcast —
//! the loop-prevention rule. That rule is enforced structurally: the inbound
//! path only ever reaches the store/listener half of the service, which holds
//! no transport handle.
//!
//! Inbound messages are applied unconditionally, with no `sent_at` ordering
//! check against the local entry's write time. Delivery order across peers is
//! not guaranteed, so a delayed `set` can overwrite a newer local value; the
//! instance converges again on its next TTL refresh or cold load.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use super::listeners::{ListenerRegistry, Subscription};
use super::store::CacheStore;
use crate::sync::{NoopTransport, SyncTransport};
use crate::types::SyncMessage;

/// The inbound-reachable half of the service
///
/// Holds everything a remote message is allowed to touch. No transport
/// handle lives here, so an inbound message cannot trigger a broadcast.
struct LocalHalf {
    store: Mutex<CacheStore>,
    listeners: ListenerRegistry,
}

impl LocalHalf {
    fn new() -> Self {
        Self {
            store: Mutex::new(CacheStore::new()),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Apply a mutation locally: store write, then listener notification
    fn apply(&self, message: SyncMessage) {
        match message {
            SyncMessage::Set {
                key, value, ttl_ms, ..
            } => {
                self.store
                    .lock()
                    .set(key.clone(), value.clone(), Duration::from_millis(ttl_ms));
                self.listeners.notify(&key, Some(&value));
            }
            SyncMessage::Invalidate { key, .. } => {
                self.store.lock().invalidate(&key);
                self.listeners.notify(&key, None);
            }
            SyncMessage::InvalidateAll { .. } => {
                let affected: Vec<String> = {
                    let mut store = self.store.lock();
                    let keys = store.keys();
                    store.invalidate_all();
                    keys
                };
                for key in affected {
                    self.listeners.notify(&key, None);
                }
            }
        }
    }
}

/// In-process settings cache with cross-instance propagation
pub struct CacheService {
    local: Arc<LocalHalf>,
    transport: Arc<dyn SyncTransport>,
}

impl CacheService {
    /// Create a service wired to the given transport
    ///
    /// Inbound messages from the transport are applied via the same path as
    /// [`CacheService::apply_remote`].
    pub fn new(transport: Arc<dyn SyncTransport>) -> Self {
        let local = Arc::new(LocalHalf::new());

        let inbound = Arc::clone(&local);
        transport.set_handler(Arc::new(move |message| {
            tracing::debug!(sent_at = message.sent_at(), "Applying remote cache message");
            inbound.apply(message);
        }));

        Self { local, transport }
    }

    /// Create a service with no synchronization medium (single-instance mode)
    pub fn single_instance() -> Self {
        Self::new(Arc::new(NoopTransport::new()))
    }

    /// Look up a key, lazily evicting it if expired
    pub fn get(&self, key: &str) -> Option<Value> {
        self.local.store.lock().get(key)
    }

    /// Whether a live entry exists for the key
    pub fn has(&self, key: &str) -> bool {
        self.local.store.lock().has(key)
    }

    /// Write a key, notify local listeners, broadcast to peers
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let key = key.into();
        self.local.store.lock().set(key.clone(), value.clone(), ttl);
        self.local.listeners.notify(&key, Some(&value));
        self.transport.broadcast(&SyncMessage::set(key, value, ttl));
    }

    /// Remove a key, notify local listeners, broadcast to peers
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.local.store.lock().invalidate(key);
        self.local.listeners.notify(key, None);
        self.transport.broadcast(&SyncMessage::invalidate(key));
        removed
    }

    /// Remove every key, notify listeners of affected keys, broadcast to peers
    pub fn invalidate_all(&self) -> usize {
        let affected: Vec<String> = {
            let mut store = self.local.store.lock();
            let keys = store.keys();
            store.invalidate_all();
            keys
        };
        let count = affected.len();
        for key in &affected {
            self.local.listeners.notify(key, None);
        }
        self.transport.broadcast(&SyncMessage::invalidate_all());
        count
    }

    /// Apply a message received from a peer — never re-broadcasts
    pub fn apply_remote(&self, message: SyncMessage) {
        self.local.apply(message);
    }

    /// Sweep expired entries; returns how many were removed
    pub fn cleanup(&self) -> usize {
        self.local.store.lock().cleanup()
    }

    /// Register a callback for changes to a key
    pub fn subscribe<F>(&self, key: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.local.listeners.subscribe(key, callback)
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.local.store.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.local.store.lock().is_empty()
    }
}
