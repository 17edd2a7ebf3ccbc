//! Loandesk settings cache and tiered limit resolution
//!
//! In-process, TTL-bounded caching of equipment-loan configuration (loan
//! durations, per-category borrowing limits, per-user-type limits) with
//! best-effort synchronization across concurrently running application
//! instances and a well-defined override → default → fallback resolution
//! chain.
//!
//! # Architecture
//!
//! ```text
//!                         ┌────────────────────┐
//!   application code ───▶ │   SettingsFacade   │ ◀── authoritative store
//!                         │  (settings/facade) │     (SettingsSource)
//!                         └─────────┬──────────┘
//!                 validate ▲        │ read / write
//!            (validation)  │        ▼
//!                         ┌────────────────────┐      ┌───────────────┐
//!   limit resolution ◀─── │    CacheService    │ ───▶ │ SyncTransport │──▶ peers
//!      (limits)           │  store + listeners │      │ (sync)        │◀── peers
//!                         └────────────────────┘      └───────────────┘
//! ```
//!
//! Each instance is independent; consistency across instances is eventual,
//! carried by fire-and-forget [`SyncMessage`] broadcasts. Messages received
//! from peers are applied locally but never re-broadcast. Running without
//! any synchronization medium ([`NoopTransport`]) is a supported
//! configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use loandesk_settings::{MemorySource, SettingsFacade};
//!
//! let facade = SettingsFacade::builder()
//!     .with_source(MemorySource::new())
//!     .build()?;
//! facade.load().await?;
//!
//! let limit = facade.get_category_limit("camera");
//! facade.update_setting("maxLoanDuration", 21.into()).await?;
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod limits;
pub mod settings;
pub mod sync;
pub mod types;
pub mod validation;

pub use cache::{CacheService, CacheStore, ListenerRegistry, Subscription};
pub use error::{Error, Result, SourceError};
pub use limits::{get_limit, get_user_type_limits, ResolvedDefaults};
pub use settings::{
    FacadeConfig, MemorySource, SettingsFacade, SettingsFacadeBuilder, SettingsSource,
};
pub use sync::{ChannelTransport, LocalBusTransport, LocalSyncBus, NoopTransport, SyncTransport};
pub use types::{
    LimitOverride, SettingKey, SyncMessage, SystemDefaults, UserTypeLimitOverride, UserTypeLimits,
};
pub use validation::{validate, validate_all, ValidationResult};
