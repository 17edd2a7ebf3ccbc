//! Settings facade
//!
//! The single entry point external code talks to. On cold start it fetches
//! the authoritative settings and override lists, seeds the cache, and from
//! then on serves synchronous, cache-backed reads. Writes run through the
//! validated path: validate, persist upstream, then update the cache (which
//! propagates to local listeners and remote peers).
//!
//! Total unavailability of the authoritative store is not fatal: reads
//! degrade to the last cached values or the hard-coded defaults.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{CacheService, Subscription};
use crate::error::{Error, Result};
use crate::limits::{get_limit, get_user_type_limits, ResolvedDefaults};
use crate::sync::{NoopTransport, SyncTransport};
use crate::types::{
    cache_keys, LimitOverride, SettingKey, SystemDefaults, UserTypeLimitOverride, UserTypeLimits,
    LIMITS_CACHE_TTL, SETTINGS_CACHE_TTL,
};
use crate::validation::{validate, ValidationResult};

use super::source::SettingsSource;

// ============================================================================
// Configuration
// ============================================================================

/// Cache TTLs used by the facade
#[derive(Debug, Clone)]
pub struct FacadeConfig {
    /// TTL of the cached settings document
    pub settings_ttl: Duration,

    /// TTL of the cached override lists
    pub limits_ttl: Duration,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            settings_ttl: SETTINGS_CACHE_TTL,
            limits_ttl: LIMITS_CACHE_TTL,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for configuring the facade with pluggable collaborators
pub struct SettingsFacadeBuilder {
    source: Option<Arc<dyn SettingsSource>>,
    transport: Option<Arc<dyn SyncTransport>>,
    config: FacadeConfig,
}

impl SettingsFacadeBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            source: None,
            transport: None,
            config: FacadeConfig::default(),
        }
    }

    /// Set the authoritative settings source
    pub fn with_source<S>(mut self, source: S) -> Self
    where
        S: SettingsSource + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Set the authoritative settings source from a shared handle
    pub fn with_source_arc(mut self, source: Arc<dyn SettingsSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the synchronization transport
    pub fn with_transport<T>(mut self, transport: T) -> Self
    where
        T: SyncTransport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set the cache TTL configuration
    pub fn with_config(mut self, config: FacadeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the facade
    ///
    /// A source is required; without a transport the facade runs in
    /// single-instance mode. The cache starts empty — call
    /// [`SettingsFacade::load`] to seed it.
    pub fn build(self) -> Result<SettingsFacade> {
        let source = self
            .source
            .ok_or_else(|| Error::Configuration("No settings source configured".to_string()))?;

        let transport: Arc<dyn SyncTransport> = self
            .transport
            .unwrap_or_else(|| Arc::new(NoopTransport::new()));

        Ok(SettingsFacade {
            source,
            cache: CacheService::new(transport),
            config: self.config,
        })
    }
}

impl Default for SettingsFacadeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Facade
// ============================================================================

/// Cache-backed settings access for one application instance
pub struct SettingsFacade {
    source: Arc<dyn SettingsSource>,
    cache: CacheService,
    config: FacadeConfig,
}

impl std::fmt::Debug for SettingsFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsFacade")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SettingsFacade {
    /// Start building a facade
    pub fn builder() -> SettingsFacadeBuilder {
        SettingsFacadeBuilder::new()
    }

    /// Fetch the authoritative data and seed the cache (cold start)
    ///
    /// Each fetch failure is logged and degrades: an already cached value is
    /// kept, an empty cache slot is seeded with the hard-coded defaults.
    pub async fn load(&self) -> Result<()> {
        match self.source.fetch_settings().await {
            Ok(settings) => {
                self.cache.set(
                    cache_keys::SYSTEM_SETTINGS,
                    serde_json::to_value(&settings)?,
                    self.config.settings_ttl,
                );
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Settings fetch failed; serving cached or default values"
                );
                if !self.cache.has(cache_keys::SYSTEM_SETTINGS) {
                    self.cache.set(
                        cache_keys::SYSTEM_SETTINGS,
                        serde_json::to_value(SystemDefaults::default())?,
                        self.config.settings_ttl,
                    );
                }
            }
        }

        match self.source.fetch_category_limits().await {
            Ok(limits) => {
                self.cache.set(
                    cache_keys::CATEGORY_LIMITS,
                    serde_json::to_value(&limits)?,
                    self.config.limits_ttl,
                );
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Category limits fetch failed; serving cached or default values"
                );
                if !self.cache.has(cache_keys::CATEGORY_LIMITS) {
                    self.cache.set(
                        cache_keys::CATEGORY_LIMITS,
                        Value::Array(Vec::new()),
                        self.config.limits_ttl,
                    );
                }
            }
        }

        match self.source.fetch_user_type_limits().await {
            Ok(limits) => {
                self.cache.set(
                    cache_keys::USER_TYPE_LIMITS,
                    serde_json::to_value(&limits)?,
                    self.config.limits_ttl,
                );
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "User type limits fetch failed; serving cached or default values"
                );
                if !self.cache.has(cache_keys::USER_TYPE_LIMITS) {
                    self.cache.set(
                        cache_keys::USER_TYPE_LIMITS,
                        Value::Array(Vec::new()),
                        self.config.limits_ttl,
                    );
                }
            }
        }

        tracing::debug!("Settings cache seeded");
        Ok(())
    }

    /// Re-fetch the authoritative data (e.g. after TTL expiry)
    pub async fn refresh(&self) -> Result<()> {
        self.load().await
    }

    /// The currently effective settings document
    ///
    /// Missing or malformed cache content degrades to the hard-coded
    /// defaults.
    pub fn settings_snapshot(&self) -> SystemDefaults {
        self.cache
            .get(cache_keys::SYSTEM_SETTINGS)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// The currently cached category overrides
    pub fn category_overrides(&self) -> Vec<LimitOverride> {
        self.cache
            .get(cache_keys::CATEGORY_LIMITS)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// The currently cached user-type overrides
    pub fn user_type_overrides(&self) -> Vec<UserTypeLimitOverride> {
        self.cache
            .get(cache_keys::USER_TYPE_LIMITS)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Read a single setting value by its wire/document field name
    pub fn get_setting(&self, key: &str) -> Option<Value> {
        let key = SettingKey::parse(key)?;
        Some(self.settings_snapshot().get(key))
    }

    /// Effective borrowing limit for a category
    pub fn get_category_limit(&self, category_id: &str) -> u32 {
        let defaults = ResolvedDefaults::from(&self.settings_snapshot());
        get_limit(
            Some(category_id),
            &self.category_overrides(),
            defaults.category_limit,
        )
    }

    /// Effective limits for a user type
    ///
    /// While user-type limits are disabled in the settings, overrides are
    /// ignored and every user type gets the resolved defaults.
    pub fn get_user_type_limits(&self, user_type: &str) -> UserTypeLimits {
        let snapshot = self.settings_snapshot();
        let defaults = ResolvedDefaults::from(&snapshot);

        let overrides = if snapshot.user_type_limits_enabled {
            self.user_type_overrides()
        } else {
            Vec::new()
        };

        get_user_type_limits(Some(user_type), &overrides, &defaults)
    }

    /// Validate, persist, and cache one setting value
    ///
    /// An invalid value short-circuits before anything is persisted. A
    /// persist failure is returned as an error; the cache is only updated
    /// after the upstream write succeeded, bumping the document version.
    pub async fn update_setting(&self, key: &str, value: Value) -> Result<ValidationResult> {
        let Some(setting_key) = SettingKey::parse(key) else {
            return Ok(ValidationResult::fail(format!("Unknown setting: {key}")));
        };

        let result = validate(setting_key, &value);
        if !result.is_valid {
            return Ok(result);
        }

        self.source.persist_setting(setting_key, &value).await?;

        let mut settings = self.settings_snapshot();
        settings.apply(setting_key, &value);
        settings.version += 1;

        self.cache.set(
            cache_keys::SYSTEM_SETTINGS,
            serde_json::to_value(&settings)?,
            self.config.settings_ttl,
        );

        tracing::info!(key = %setting_key, version = settings.version, "Setting updated");
        Ok(result)
    }

    /// Register a callback for changes to a cache key
    ///
    /// Keys are the well-known cache keys in [`cache_keys`]; the callback
    /// fires for local writes and for updates arriving from peers.
    pub fn subscribe<F>(&self, key: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.cache.subscribe(key, callback)
    }

    /// The underlying cache service
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }
}
