//! Settings access layer
//!
//! [`SettingsFacade`] is the only surface external collaborators talk to:
//! it seeds the cache from the authoritative [`SettingsSource`] on cold
//! start, serves synchronous cache-backed reads, and runs writes through the
//! validated persist-then-cache path.

mod facade;
mod source;

pub use facade::{FacadeConfig, SettingsFacade, SettingsFacadeBuilder};
pub use source::{MemorySource, SettingsSource};
