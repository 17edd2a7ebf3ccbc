//! Per-key change listeners
//!
//! Local observers register a callback against a cache key and are notified
//! on every mutation of that key, whether the mutation originated locally or
//! arrived from a peer instance. A callback that panics is contained and
//! logged; it never prevents delivery to the remaining callbacks for the key.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

/// Callback invoked with the key's new value (`None` on invalidation)
pub type Listener = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    listeners: RwLock<HashMap<String, Vec<(Uuid, Listener)>>>,
}

/// Registry of per-key subscriber lists
///
/// Cloning is cheap and clones share the same subscriber state.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Inner>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for a key
    ///
    /// Multiple callbacks may register per key. The returned [`Subscription`]
    /// removes exactly this callback when `unsubscribe` is called; merely
    /// dropping the handle leaves the registration in place.
    pub fn subscribe<F>(&self, key: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        let key = key.into();
        let id = Uuid::new_v4();
        self.inner
            .listeners
            .write()
            .entry(key.clone())
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            key,
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every callback registered for a key
    ///
    /// Callbacks run outside the registry lock, so a callback may itself
    /// subscribe or unsubscribe. A panicking callback is caught and logged.
    pub fn notify(&self, key: &str, value: Option<&Value>) {
        let callbacks: Vec<Listener> = {
            let listeners = self.inner.listeners.read();
            match listeners.get(key) {
                Some(entries) => entries.iter().map(|(_, cb)| cb.clone()).collect(),
                None => return,
            }
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                tracing::warn!(key = %key, "Cache listener panicked during notification");
            }
        }
    }

    /// Number of callbacks currently registered for a key
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .listeners
            .read()
            .get(key)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Handle for one registered callback
///
/// Call [`Subscription::unsubscribe`] to release the registration.
pub struct Subscription {
    key: String,
    id: Uuid,
    inner: Weak<Inner>,
}

impl Subscription {
    /// Key this subscription is registered under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Remove this callback from the registry
    ///
    /// An emptied key bucket is dropped entirely (memory hygiene; no
    /// behavioral invariant depends on it).
    pub fn unsubscribe(self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut listeners = inner.listeners.write();
        if let Some(entries) = listeners.get_mut(&self.key) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                listeners.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_notify_reaches_all_subscribers() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c1 = count.clone();
        let _s1 = registry.subscribe("k", move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = count.clone();
        let _s2 = registry.subscribe("k", move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify("k", Some(&json!(1)));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_notify_passes_value() {
        let registry = ListenerRegistry::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let sink = seen.clone();
        let _sub = registry.subscribe("k", move |value| {
            sink.lock().push(value.cloned());
        });

        registry.notify("k", Some(&json!("fresh")));
        registry.notify("k", None);

        let seen = seen.lock();
        assert_eq!(seen.as_slice(), &[Some(json!("fresh")), None]);
    }

    #[test]
    fn test_notify_other_key_is_silent() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let _sub = registry.subscribe("a", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify("b", Some(&json!(1)));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _bad = registry.subscribe("k", |_| panic!("listener failure"));
        let c = count.clone();
        let _good = registry.subscribe("k", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify("k", Some(&json!(1)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c1 = count.clone();
        let s1 = registry.subscribe("k", move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = count.clone();
        let _s2 = registry.subscribe("k", move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        assert_eq!(registry.subscriber_count("k"), 2);
        s1.unsubscribe();
        assert_eq!(registry.subscriber_count("k"), 1);

        registry.notify("k", Some(&json!(1)));
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_empty_bucket_is_dropped() {
        let registry = ListenerRegistry::new();
        let sub = registry.subscribe("k", |_| {});
        sub.unsubscribe();
        assert_eq!(registry.subscriber_count("k"), 0);
        assert!(registry.inner.listeners.read().get("k").is_none());
    }
}
