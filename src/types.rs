//! Core data types used throughout the settings subsystem

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Unix timestamp in milliseconds
pub type UnixMillis = i64;

/// Current wall-clock time as Unix milliseconds
pub fn now_millis() -> UnixMillis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ============================================================================
// Constants
// ============================================================================

/// Last-resort limit when neither an override nor a usable default exists
pub const FALLBACK_LIMIT: u32 = 3;

/// Default maximum loan duration in days
pub const DEFAULT_MAX_LOAN_DURATION: u32 = 14;

/// Default maximum advance booking window in days
pub const DEFAULT_MAX_ADVANCE_BOOKING_DAYS: u32 = 30;

/// Default per-category borrowing limit
pub const DEFAULT_CATEGORY_LIMIT: u32 = 3;

/// TTL for the cached system settings document
pub const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(300);

/// TTL for cached override lists
pub const LIMITS_CACHE_TTL: Duration = Duration::from_secs(300);

/// Topic name used by message-based sync transports
pub const SYNC_CHANNEL_NAME: &str = "settings-cache-sync";

/// Well-known cache keys
pub mod cache_keys {
    /// System settings document
    pub const SYSTEM_SETTINGS: &str = "system-settings";
    /// Per-category limit overrides
    pub const CATEGORY_LIMITS: &str = "category-limits";
    /// Per-user-type limit overrides
    pub const USER_TYPE_LIMITS: &str = "user-type-limits";
}

// ============================================================================
// Setting Keys
// ============================================================================

/// Identifiers of the individual system settings
///
/// Declaration order here is the order `validate_all` reports failures in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    /// Maximum loan duration in days
    MaxLoanDuration,
    /// Maximum advance booking window in days
    MaxAdvanceBookingDays,
    /// System-wide default per-category limit
    DefaultCategoryLimit,
    /// Discord webhook endpoint for notifications
    DiscordWebhookUrl,
    /// Whether Discord notifications are enabled
    DiscordEnabled,
    /// Whether per-user-type limits are enforced
    UserTypeLimitsEnabled,
}

impl SettingKey {
    /// All keys in declaration order
    pub const ALL: [SettingKey; 6] = [
        SettingKey::MaxLoanDuration,
        SettingKey::MaxAdvanceBookingDays,
        SettingKey::DefaultCategoryLimit,
        SettingKey::DiscordWebhookUrl,
        SettingKey::DiscordEnabled,
        SettingKey::UserTypeLimitsEnabled,
    ];

    /// Wire/document field name for this key
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::MaxLoanDuration => "maxLoanDuration",
            SettingKey::MaxAdvanceBookingDays => "maxAdvanceBookingDays",
            SettingKey::DefaultCategoryLimit => "defaultCategoryLimit",
            SettingKey::DiscordWebhookUrl => "discordWebhookUrl",
            SettingKey::DiscordEnabled => "discordEnabled",
            SettingKey::UserTypeLimitsEnabled => "userTypeLimitsEnabled",
        }
    }

    /// Parse a wire/document field name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// System Defaults
// ============================================================================

/// The singleton system settings document
///
/// Numeric fields are kept raw (`i64`) as fetched from the store; consumers
/// resolve them through the limit resolver, which sanitizes and falls back to
/// the hard-coded constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemDefaults {
    /// Maximum loan duration in days
    pub max_loan_duration: i64,

    /// Maximum advance booking window in days
    pub max_advance_booking_days: i64,

    /// Default per-category borrowing limit
    pub default_category_limit: i64,

    /// Discord webhook endpoint ("" when unset)
    pub discord_webhook_url: String,

    /// Whether Discord notifications are enabled
    pub discord_enabled: bool,

    /// Whether per-user-type limits are enforced
    pub user_type_limits_enabled: bool,

    /// Document version, bumped on every validated write
    pub version: u64,
}

impl Default for SystemDefaults {
    fn default() -> Self {
        Self {
            max_loan_duration: DEFAULT_MAX_LOAN_DURATION as i64,
            max_advance_booking_days: DEFAULT_MAX_ADVANCE_BOOKING_DAYS as i64,
            default_category_limit: DEFAULT_CATEGORY_LIMIT as i64,
            discord_webhook_url: String::new(),
            discord_enabled: false,
            user_type_limits_enabled: false,
            version: 0,
        }
    }
}

impl SystemDefaults {
    /// Read a single field as a JSON value
    pub fn get(&self, key: SettingKey) -> Value {
        match key {
            SettingKey::MaxLoanDuration => Value::from(self.max_loan_duration),
            SettingKey::MaxAdvanceBookingDays => Value::from(self.max_advance_booking_days),
            SettingKey::DefaultCategoryLimit => Value::from(self.default_category_limit),
            SettingKey::DiscordWebhookUrl => Value::from(self.discord_webhook_url.clone()),
            SettingKey::DiscordEnabled => Value::from(self.discord_enabled),
            SettingKey::UserTypeLimitsEnabled => Value::from(self.user_type_limits_enabled),
        }
    }

    /// Assign a single field from a JSON value
    ///
    /// Returns `false` when the value's type does not match the field; the
    /// document is left unchanged in that case. Callers are expected to have
    /// validated the value first.
    pub fn apply(&mut self, key: SettingKey, value: &Value) -> bool {
        match key {
            SettingKey::MaxLoanDuration => match value.as_i64() {
                Some(v) => {
                    self.max_loan_duration = v;
                    true
                }
                None => false,
            },
            SettingKey::MaxAdvanceBookingDays => match value.as_i64() {
                Some(v) => {
                    self.max_advance_booking_days = v;
                    true
                }
                None => false,
            },
            SettingKey::DefaultCategoryLimit => match value.as_i64() {
                Some(v) => {
                    self.default_category_limit = v;
                    true
                }
                None => false,
            },
            SettingKey::DiscordWebhookUrl => match value.as_str() {
                Some(v) => {
                    self.discord_webhook_url = v.to_string();
                    true
                }
                None => false,
            },
            SettingKey::DiscordEnabled => match value.as_bool() {
                Some(v) => {
                    self.discord_enabled = v;
                    true
                }
                None => false,
            },
            SettingKey::UserTypeLimitsEnabled => match value.as_bool() {
                Some(v) => {
                    self.user_type_limits_enabled = v;
                    true
                }
                None => false,
            },
        }
    }
}

// ============================================================================
// Limit Overrides
// ============================================================================

/// A per-scope limit override (one per distinct `scope_id`)
///
/// `limit` is kept raw as fetched; non-positive values are treated as absent
/// at resolution time, never as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOverride {
    /// Scope the override applies to (a category id)
    pub scope_id: String,

    /// Human-readable scope name
    #[serde(default)]
    pub scope_name: String,

    /// Configured limit (raw; sanitized at read time)
    pub limit: i64,

    /// Last modification time (Unix ms)
    #[serde(default)]
    pub updated_at: UnixMillis,

    /// Administrator who last modified the override
    #[serde(default)]
    pub updated_by: String,
}

/// A per-user-type override carrying the three user-type limits
///
/// Each field is sanitized independently through the same positive-integer
/// rule as [`LimitOverride::limit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTypeLimitOverride {
    /// User type the override applies to
    pub user_type: String,

    /// Human-readable user type name
    #[serde(default)]
    pub user_type_name: String,

    /// Maximum concurrently borrowed items (raw)
    pub max_items: i64,

    /// Maximum loan duration in days (raw)
    pub max_days: i64,

    /// Maximum advance booking window in days (raw)
    pub max_advance_booking_days: i64,

    /// Last modification time (Unix ms)
    #[serde(default)]
    pub updated_at: UnixMillis,

    /// Administrator who last modified the override
    #[serde(default)]
    pub updated_by: String,
}

/// Fully resolved limits for one user type — always positive integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTypeLimits {
    /// Maximum concurrently borrowed items
    pub max_items: u32,

    /// Maximum loan duration in days
    pub max_days: u32,

    /// Maximum advance booking window in days
    pub max_advance_booking_days: u32,
}

// ============================================================================
// Sync Messages
// ============================================================================

/// A cache mutation broadcast to peer instances
///
/// Transient wire format; never persisted. `ttl` is carried in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SyncMessage {
    /// A key was written
    Set {
        /// Cache key
        key: String,
        /// New value
        value: Value,
        /// Entry TTL in milliseconds
        #[serde(rename = "ttl")]
        ttl_ms: u64,
        /// Send time (Unix ms)
        sent_at: UnixMillis,
    },
    /// A key was invalidated
    Invalidate {
        /// Cache key
        key: String,
        /// Send time (Unix ms)
        sent_at: UnixMillis,
    },
    /// The whole cache was invalidated
    InvalidateAll {
        /// Send time (Unix ms)
        sent_at: UnixMillis,
    },
}

impl SyncMessage {
    /// Build a `set` message stamped with the current time
    pub fn set(key: impl Into<String>, value: Value, ttl: Duration) -> Self {
        SyncMessage::Set {
            key: key.into(),
            value,
            ttl_ms: ttl.as_millis() as u64,
            sent_at: now_millis(),
        }
    }

    /// Build an `invalidate` message stamped with the current time
    pub fn invalidate(key: impl Into<String>) -> Self {
        SyncMessage::Invalidate {
            key: key.into(),
            sent_at: now_millis(),
        }
    }

    /// Build an `invalidateAll` message stamped with the current time
    pub fn invalidate_all() -> Self {
        SyncMessage::InvalidateAll {
            sent_at: now_millis(),
        }
    }

    /// Send time of the message (Unix ms)
    pub fn sent_at(&self) -> UnixMillis {
        match self {
            SyncMessage::Set { sent_at, .. }
            | SyncMessage::Invalidate { sent_at, .. }
            | SyncMessage::InvalidateAll { sent_at } => *sent_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setting_key_roundtrip() {
        for key in SettingKey::ALL {
            assert_eq!(SettingKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(SettingKey::parse("noSuchSetting"), None);
    }

    #[test]
    fn test_system_defaults_default() {
        let defaults = SystemDefaults::default();
        assert_eq!(defaults.max_loan_duration, 14);
        assert_eq!(defaults.default_category_limit, 3);
        assert!(!defaults.discord_enabled);
        assert_eq!(defaults.version, 0);
    }

    #[test]
    fn test_system_defaults_apply() {
        let mut defaults = SystemDefaults::default();

        assert!(defaults.apply(SettingKey::MaxLoanDuration, &json!(21)));
        assert_eq!(defaults.max_loan_duration, 21);

        // Type mismatch leaves the document unchanged
        assert!(!defaults.apply(SettingKey::MaxLoanDuration, &json!("21")));
        assert_eq!(defaults.max_loan_duration, 21);

        assert!(defaults.apply(SettingKey::DiscordEnabled, &json!(true)));
        assert!(defaults.discord_enabled);
    }

    #[test]
    fn test_limit_override_wire_shape() {
        let json = json!({
            "scopeId": "camera",
            "scopeName": "Cameras",
            "limit": 2,
            "updatedAt": 1_700_000_000_000_i64,
            "updatedBy": "admin"
        });
        let over: LimitOverride = serde_json::from_value(json).unwrap();
        assert_eq!(over.scope_id, "camera");
        assert_eq!(over.limit, 2);
    }

    #[test]
    fn test_sync_message_wire_shape() {
        let msg = SyncMessage::set("system-settings", json!({"v": 1}), Duration::from_secs(60));
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["kind"], "set");
        assert_eq!(wire["key"], "system-settings");
        assert_eq!(wire["ttl"], 60_000);
        assert!(wire["sentAt"].is_i64());

        let back: SyncMessage = serde_json::from_value(wire).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_sync_message_kinds() {
        let wire = serde_json::to_value(SyncMessage::invalidate_all()).unwrap();
        assert_eq!(wire["kind"], "invalidateAll");

        let wire = serde_json::to_value(SyncMessage::invalidate("x")).unwrap();
        assert_eq!(wire["kind"], "invalidate");
        assert_eq!(wire["key"], "x");
    }
}
