//! Settings Cache Module
//!
//! Three layers, composed bottom-up:
//!
//! - **CacheStore**: keyed, TTL-bounded in-memory store (`store.rs`)
//! - **ListenerRegistry**: per-key local change subscribers (`listeners.rs`)
//! - **CacheService**: store + listeners + sync transport (`service.rs`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      CacheService                        │
//! │                   (src/cache/service.rs)                 │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌────────────┐   ┌──────────────────┐   ┌────────────┐  │
//! │  │ CacheStore │   │ ListenerRegistry │   │ Transport  │  │
//! │  │  TTL store │   │  per-key subs    │   │ (peers)    │  │
//! │  └────────────┘   └──────────────────┘   └────────────┘  │
//! │        ▲                   ▲                   │         │
//! │        └── inbound msgs ───┘     outbound ─────┘         │
//! │            (never re-broadcast)                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use loandesk_settings::cache::CacheService;
//!
//! let cache = CacheService::single_instance();
//! cache.set("system-settings", value, SETTINGS_CACHE_TTL);
//! let current = cache.get("system-settings");
//! ```

// TTL-bounded key/value store
mod store;
pub use store::CacheStore;

// Per-key change listeners
mod listeners;
pub use listeners::{Listener, ListenerRegistry, Subscription};

// Store + listeners + sync transport composition
mod service;
pub use service::CacheService;
