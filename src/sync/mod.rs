//! Cross-instance synchronization
//!
//! Cache mutations are propagated to peer instances over a pluggable
//! [`SyncTransport`]. The concrete transport is chosen at composition time:
//!
//! - [`NoopTransport`] — single-instance mode, no synchronization medium
//! - [`LocalSyncBus`] / [`LocalBusTransport`] — synchronous in-process bus
//! - [`ChannelTransport`] — tokio broadcast channel between runtime tasks

mod channel;
mod local_bus;
mod transport;

pub use channel::{ChannelTransport, SyncEnvelope};
pub use local_bus::{LocalBusTransport, LocalSyncBus};
pub use transport::{MessageHandler, NoopTransport, SyncTransport};
