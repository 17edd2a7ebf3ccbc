//! Setting value validation
//!
//! Every setting key carries a declared constraint: an integer range, a
//! bounded string, a boolean, or the Discord webhook URL format. Validation
//! never panics or errors — it always returns a structured
//! [`ValidationResult`], and failure messages name the violated bound or the
//! expected format.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::types::SettingKey;

/// Maximum accepted webhook URL length
const WEBHOOK_URL_MAX_LEN: usize = 500;

fn webhook_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https://(discord\.com|discordapp\.com)/api/webhooks/\d+/[A-Za-z0-9_-]+$")
            .expect("webhook pattern is valid")
    })
}

// ============================================================================
// Result & Constraints
// ============================================================================

/// Outcome of validating a candidate setting value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the value satisfies the declared constraint
    pub is_valid: bool,

    /// Failure description (`None` when valid)
    pub error: Option<String>,
}

impl ValidationResult {
    /// A passing result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    /// A failing result with a description
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

/// Declared constraint for one setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Integer within `[min, max]`, inclusive
    IntRange {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },
    /// Boolean flag
    Bool,
    /// Discord webhook URL with a bounded length
    WebhookUrl {
        /// Maximum accepted length in characters
        max_len: usize,
    },
}

/// The declared constraint for a setting key
pub fn constraint(key: SettingKey) -> Constraint {
    match key {
        SettingKey::MaxLoanDuration => Constraint::IntRange { min: 1, max: 365 },
        SettingKey::MaxAdvanceBookingDays => Constraint::IntRange { min: 1, max: 365 },
        SettingKey::DefaultCategoryLimit => Constraint::IntRange { min: 1, max: 100 },
        SettingKey::DiscordWebhookUrl => Constraint::WebhookUrl {
            max_len: WEBHOOK_URL_MAX_LEN,
        },
        SettingKey::DiscordEnabled | SettingKey::UserTypeLimitsEnabled => Constraint::Bool,
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a candidate value for a setting key
pub fn validate(key: SettingKey, value: &Value) -> ValidationResult {
    match constraint(key) {
        Constraint::IntRange { min, max } => validate_int_range(key, value, min, max),
        Constraint::Bool => match value.as_bool() {
            Some(_) => ValidationResult::ok(),
            None => ValidationResult::fail(format!("{key} must be true or false")),
        },
        Constraint::WebhookUrl { max_len } => validate_webhook_url(key, value, max_len),
    }
}

/// Validate a value for a setting named by its wire/document field name
///
/// Unknown names fail with a structured result rather than an error, so the
/// write path can surface them like any other validation failure.
pub fn validate_named(name: &str, value: &Value) -> ValidationResult {
    match SettingKey::parse(name) {
        Some(key) => validate(key, value),
        None => ValidationResult::fail(format!("Unknown setting: {name}")),
    }
}

fn validate_int_range(key: SettingKey, value: &Value, min: i64, max: i64) -> ValidationResult {
    let Some(number) = value.as_i64() else {
        return ValidationResult::fail(format!("{key} must be an integer"));
    };
    if number < min {
        return ValidationResult::fail(format!("{key} must be at least {min}"));
    }
    if number > max {
        return ValidationResult::fail(format!("{key} must be at most {max}"));
    }
    ValidationResult::ok()
}

fn validate_webhook_url(key: SettingKey, value: &Value, max_len: usize) -> ValidationResult {
    let Some(url) = value.as_str() else {
        return ValidationResult::fail(format!("{key} must be a string"));
    };
    if url.trim().is_empty() {
        return ValidationResult::fail(format!("{key} must not be empty"));
    }
    if url.len() > max_len {
        return ValidationResult::fail(format!("{key} must be at most {max_len} characters"));
    }
    if !webhook_pattern().is_match(url) {
        return ValidationResult::fail(format!(
            "{key} must be a Discord webhook URL (https://discord.com/api/webhooks/<id>/<token>)"
        ));
    }
    ValidationResult::ok()
}

/// Validate every known key present in a settings document
///
/// Results are reported in the declaration order of [`SettingKey::ALL`];
/// unknown fields in the document are ignored.
pub fn validate_all(settings: &Map<String, Value>) -> Vec<(SettingKey, ValidationResult)> {
    SettingKey::ALL
        .iter()
        .filter_map(|&key| {
            settings
                .get(key.as_str())
                .map(|value| (key, validate(key, value)))
        })
        .collect()
}

/// First failing result, scanning in declaration order
pub fn first_failure(
    results: &[(SettingKey, ValidationResult)],
) -> Option<&(SettingKey, ValidationResult)> {
    results.iter().find(|(_, result)| !result.is_valid)
}
