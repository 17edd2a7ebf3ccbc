//! Authoritative settings store abstraction
//!
//! The facade talks to the durable store exclusively through this trait; the
//! concrete backend (remote document store, local file, test double) is
//! injected at composition time.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::SourceError;
use crate::types::{LimitOverride, SettingKey, SystemDefaults, UserTypeLimitOverride};

/// Pluggable backend holding the authoritative settings and limits
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Fetch the system settings document
    async fn fetch_settings(&self) -> Result<SystemDefaults, SourceError>;

    /// Fetch all per-category limit overrides
    async fn fetch_category_limits(&self) -> Result<Vec<LimitOverride>, SourceError>;

    /// Fetch all per-user-type limit overrides
    async fn fetch_user_type_limits(&self) -> Result<Vec<UserTypeLimitOverride>, SourceError>;

    /// Persist one validated setting value
    async fn persist_setting(&self, key: SettingKey, value: &Value) -> Result<(), SourceError>;
}

#[derive(Default)]
struct MemoryState {
    settings: SystemDefaults,
    category_limits: Vec<LimitOverride>,
    user_type_limits: Vec<UserTypeLimitOverride>,
    persisted: Vec<(SettingKey, Value)>,
    unavailable: bool,
}

/// In-memory source for tests and single-node setups
///
/// Records every persisted write so tests can assert on the upstream
/// traffic, and can be switched into an unavailable state to exercise the
/// degradation paths.
#[derive(Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
}

impl MemorySource {
    /// Create a source holding default settings and no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the settings document
    pub fn set_settings(&self, settings: SystemDefaults) {
        self.state.lock().settings = settings;
    }

    /// Replace the category override list
    pub fn set_category_limits(&self, limits: Vec<LimitOverride>) {
        self.state.lock().category_limits = limits;
    }

    /// Replace the user-type override list
    pub fn set_user_type_limits(&self, limits: Vec<UserTypeLimitOverride>) {
        self.state.lock().user_type_limits = limits;
    }

    /// Make every operation fail with [`SourceError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Writes persisted so far, in order
    pub fn persisted(&self) -> Vec<(SettingKey, Value)> {
        self.state.lock().persisted.clone()
    }

    fn check_available(&self) -> Result<(), SourceError> {
        if self.state.lock().unavailable {
            Err(SourceError::Unavailable("memory source offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SettingsSource for MemorySource {
    async fn fetch_settings(&self) -> Result<SystemDefaults, SourceError> {
        self.check_available()?;
        Ok(self.state.lock().settings.clone())
    }

    async fn fetch_category_limits(&self) -> Result<Vec<LimitOverride>, SourceError> {
        self.check_available()?;
        Ok(self.state.lock().category_limits.clone())
    }

    async fn fetch_user_type_limits(&self) -> Result<Vec<UserTypeLimitOverride>, SourceError> {
        self.check_available()?;
        Ok(self.state.lock().user_type_limits.clone())
    }

    async fn persist_setting(&self, key: SettingKey, value: &Value) -> Result<(), SourceError> {
        self.check_available()?;
        let mut state = self.state.lock();
        state.settings.apply(key, value);
        state.persisted.push((key, value.clone()));
        Ok(())
    }
}
