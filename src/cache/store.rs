//! TTL-bounded in-memory key/value store
//!
//! The store is the passive bottom layer of the cache: it knows nothing about
//! settings semantics, listeners, or synchronization. Entries carry a
//! time-to-live; an expired entry behaves as absent and is lazily evicted on
//! the next read. All operations are total — there are no error conditions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

/// A single cached value with its write time and TTL
///
/// Owned exclusively by the store; consumers only ever receive the unwrapped
/// value.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    written_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.written_at) > self.ttl
    }
}

/// Keyed, TTL-bounded in-memory store
///
/// Writes are last-write-wins with no versioning. The store carries no
/// internal locking; the owning service wraps it as needed.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
}

impl CacheStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a key, lazily evicting it if its TTL has elapsed
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Write a key unconditionally
    pub fn set(&mut self, key: impl Into<String>, value: Value, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                written_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Remove a key; returns whether an entry was present
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry; returns how many were removed
    pub fn invalidate_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Whether a live (non-expired) entry exists for the key
    ///
    /// TTL-aware but non-evicting; expired entries are physically removed by
    /// `get` or `cleanup`.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Sweep all expired entries; returns how many were removed
    pub fn cleanup(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Keys of all entries currently held
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of entries currently held (expired entries included until swept)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LONG_TTL: Duration = Duration::from_secs(60);
    const SHORT_TTL: Duration = Duration::from_millis(20);

    #[test]
    fn test_set_then_get() {
        let mut store = CacheStore::new();
        store.set("k", json!(42), LONG_TTL);
        assert_eq!(store.get("k"), Some(json!(42)));
        assert!(store.has("k"));
    }

    #[test]
    fn test_get_missing() {
        let mut store = CacheStore::new();
        assert_eq!(store.get("absent"), None);
        assert!(!store.has("absent"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = CacheStore::new();
        store.set("k", json!(1), LONG_TTL);
        store.set("k", json!(2), LONG_TTL);
        assert_eq!(store.get("k"), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expiry_evicts_on_read() {
        let mut store = CacheStore::new();
        store.set("k", json!("v"), SHORT_TTL);
        std::thread::sleep(Duration::from_millis(40));

        assert!(!store.has("k"));
        assert_eq!(store.len(), 1); // still physically present
        assert_eq!(store.get("k"), None);
        assert_eq!(store.len(), 0); // lazily evicted by the read
    }

    #[test]
    fn test_invalidate() {
        let mut store = CacheStore::new();
        store.set("k", json!(true), LONG_TTL);
        assert!(store.invalidate("k"));
        assert_eq!(store.get("k"), None);
        assert!(!store.invalidate("k"));
    }

    #[test]
    fn test_invalidate_all() {
        let mut store = CacheStore::new();
        store.set("a", json!(1), LONG_TTL);
        store.set("b", json!(2), LONG_TTL);
        assert_eq!(store.invalidate_all(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_counts_removed() {
        let mut store = CacheStore::new();
        store.set("stale1", json!(1), SHORT_TTL);
        store.set("stale2", json!(2), SHORT_TTL);
        store.set("fresh", json!(3), LONG_TTL);
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(store.cleanup(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("fresh"), Some(json!(3)));
    }
}
