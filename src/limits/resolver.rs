//! Tiered limit resolution
//!
//! Every limit is resolved through the same fallback chain:
//! scope override → resolved system default → hard-coded constant. The
//! resolver never errors and never returns a non-positive value: malformed
//! input at any tier simply falls through to the next one. A non-positive
//! override limit is treated as absent, never as zero.

use serde_json::Value;

use crate::types::{
    LimitOverride, SystemDefaults, UserTypeLimitOverride, UserTypeLimits,
    DEFAULT_CATEGORY_LIMIT, DEFAULT_MAX_ADVANCE_BOOKING_DAYS, DEFAULT_MAX_LOAN_DURATION,
};

/// Sanitize a raw limit: positive integers only
pub fn sanitize_limit(raw: i64) -> Option<u32> {
    if raw > 0 {
        u32::try_from(raw).ok()
    } else {
        None
    }
}

/// Sanitize a raw JSON limit: integral, positive numbers only
///
/// Fractional numbers and non-numbers are treated as absent.
pub fn sanitize_json_limit(raw: &Value) -> Option<u32> {
    raw.as_i64().and_then(sanitize_limit)
}

/// Normalize a scope identifier
///
/// Trims surrounding whitespace; an absent or effectively empty id yields
/// `None` ("no scope").
pub fn normalize_scope(raw: Option<&str>) -> Option<&str> {
    match raw {
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        None => None,
    }
}

/// Resolve a raw system default against its hard-coded fallback
pub fn resolve_default(raw: Option<i64>, fallback: u32) -> u32 {
    raw.and_then(sanitize_limit).unwrap_or(fallback)
}

/// Resolve the effective limit for a scope
///
/// 1. Normalize the scope id; no usable id ⇒ the resolved default.
/// 2. Find an override whose normalized scope id matches.
/// 3. A matching override with a sanitizable limit wins.
/// 4. Otherwise the resolved default.
///
/// The same algorithm serves category-scoped and user-type-scoped limits;
/// call sites differ only in which override list and default they supply.
pub fn get_limit(
    scope_id: Option<&str>,
    overrides: &[LimitOverride],
    resolved_default: u32,
) -> u32 {
    let Some(scope) = normalize_scope(scope_id) else {
        return resolved_default;
    };

    overrides
        .iter()
        .find(|over| normalize_scope(Some(&over.scope_id)) == Some(scope))
        .and_then(|over| sanitize_limit(over.limit))
        .unwrap_or(resolved_default)
}

/// System defaults after their own fallback resolution — always positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDefaults {
    /// Per-category borrowing limit
    pub category_limit: u32,
    /// Maximum loan duration in days
    pub max_loan_duration: u32,
    /// Maximum advance booking window in days
    pub max_advance_booking_days: u32,
}

impl From<&SystemDefaults> for ResolvedDefaults {
    fn from(defaults: &SystemDefaults) -> Self {
        Self {
            category_limit: resolve_default(
                Some(defaults.default_category_limit),
                DEFAULT_CATEGORY_LIMIT,
            ),
            max_loan_duration: resolve_default(
                Some(defaults.max_loan_duration),
                DEFAULT_MAX_LOAN_DURATION,
            ),
            max_advance_booking_days: resolve_default(
                Some(defaults.max_advance_booking_days),
                DEFAULT_MAX_ADVANCE_BOOKING_DAYS,
            ),
        }
    }
}

impl Default for ResolvedDefaults {
    fn default() -> Self {
        Self::from(&SystemDefaults::default())
    }
}

/// Resolve all three limits for a user type
///
/// Applies the [`get_limit`] algorithm per field: normalize the user type,
/// find its override, then sanitize each field independently, falling back to
/// the corresponding resolved default.
pub fn get_user_type_limits(
    user_type: Option<&str>,
    overrides: &[UserTypeLimitOverride],
    defaults: &ResolvedDefaults,
) -> UserTypeLimits {
    let fallback = UserTypeLimits {
        max_items: defaults.category_limit,
        max_days: defaults.max_loan_duration,
        max_advance_booking_days: defaults.max_advance_booking_days,
    };

    let Some(scope) = normalize_scope(user_type) else {
        return fallback;
    };

    match overrides
        .iter()
        .find(|over| normalize_scope(Some(&over.user_type)) == Some(scope))
    {
        Some(over) => UserTypeLimits {
            max_items: sanitize_limit(over.max_items).unwrap_or(fallback.max_items),
            max_days: sanitize_limit(over.max_days).unwrap_or(fallback.max_days),
            max_advance_booking_days: sanitize_limit(over.max_advance_booking_days)
                .unwrap_or(fallback.max_advance_booking_days),
        },
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn over(scope_id: &str, limit: i64) -> LimitOverride {
        LimitOverride {
            scope_id: scope_id.to_string(),
            scope_name: scope_id.to_string(),
            limit,
            updated_at: 0,
            updated_by: "admin".to_string(),
        }
    }

    #[test]
    fn test_sanitize_limit() {
        assert_eq!(sanitize_limit(5), Some(5));
        assert_eq!(sanitize_limit(1), Some(1));
        assert_eq!(sanitize_limit(0), None);
        assert_eq!(sanitize_limit(-3), None);
        assert_eq!(sanitize_limit(i64::MAX), None); // does not fit u32
    }

    #[test]
    fn test_sanitize_json_limit() {
        assert_eq!(sanitize_json_limit(&json!(4)), Some(4));
        assert_eq!(sanitize_json_limit(&json!(0)), None);
        assert_eq!(sanitize_json_limit(&json!(2.5)), None);
        assert_eq!(sanitize_json_limit(&json!("4")), None);
        assert_eq!(sanitize_json_limit(&json!(null)), None);
    }

    #[test]
    fn test_normalize_scope() {
        assert_eq!(normalize_scope(Some("  camera ")), Some("camera"));
        assert_eq!(normalize_scope(Some("   ")), None);
        assert_eq!(normalize_scope(Some("")), None);
        assert_eq!(normalize_scope(None), None);
    }

    #[test]
    fn test_resolve_default() {
        assert_eq!(resolve_default(Some(5), 3), 5);
        assert_eq!(resolve_default(Some(0), 3), 3);
        assert_eq!(resolve_default(Some(-1), 3), 3);
        assert_eq!(resolve_default(None, 3), 3);
    }

    #[test]
    fn test_no_overrides_uses_default() {
        // No override configured falls back to the system default.
        assert_eq!(get_limit(Some("projector"), &[], 3), 3);
    }

    #[test]
    fn test_override_wins_others_fall_back() {
        let overrides = vec![over("camera", 2)];
        assert_eq!(get_limit(Some("camera"), &overrides, 5), 2);
        assert_eq!(get_limit(Some("laptop"), &overrides, 5), 5);
    }

    #[test]
    fn test_unusable_scope_returns_default() {
        let overrides = vec![over("camera", 2)];
        assert_eq!(get_limit(None, &overrides, 5), 5);
        assert_eq!(get_limit(Some("  "), &overrides, 5), 5);
    }

    #[test]
    fn test_scope_match_is_normalized() {
        let overrides = vec![over(" camera ", 2)];
        assert_eq!(get_limit(Some("camera"), &overrides, 5), 2);
        assert_eq!(get_limit(Some("  camera"), &overrides, 5), 2);
    }

    #[test]
    fn test_malformed_override_treated_as_absent() {
        // A non-positive override never resolves to zero.
        let overrides = vec![over("camera", 0), over("tripod", -7)];
        assert_eq!(get_limit(Some("camera"), &overrides, 5), 5);
        assert_eq!(get_limit(Some("tripod"), &overrides, 5), 5);
    }

    #[test]
    fn test_resolved_defaults_sanitize_raw_settings() {
        let mut defaults = SystemDefaults::default();
        defaults.default_category_limit = -1;
        defaults.max_loan_duration = 30;

        let resolved = ResolvedDefaults::from(&defaults);
        assert_eq!(resolved.category_limit, DEFAULT_CATEGORY_LIMIT);
        assert_eq!(resolved.max_loan_duration, 30);
    }

    #[test]
    fn test_user_type_limits_without_override() {
        let defaults = ResolvedDefaults {
            category_limit: 3,
            max_loan_duration: 14,
            max_advance_booking_days: 30,
        };
        let limits = get_user_type_limits(Some("student"), &[], &defaults);
        assert_eq!(limits.max_items, 3);
        assert_eq!(limits.max_days, 14);
        assert_eq!(limits.max_advance_booking_days, 30);
    }

    #[test]
    fn test_user_type_limits_per_field_fallback() {
        let defaults = ResolvedDefaults {
            category_limit: 3,
            max_loan_duration: 14,
            max_advance_booking_days: 30,
        };
        let overrides = vec![UserTypeLimitOverride {
            user_type: "staff".to_string(),
            user_type_name: "Staff".to_string(),
            max_items: 10,
            max_days: 0, // malformed — falls back per field
            max_advance_booking_days: 60,
            updated_at: 0,
            updated_by: "admin".to_string(),
        }];

        let limits = get_user_type_limits(Some("staff"), &overrides, &defaults);
        assert_eq!(limits.max_items, 10);
        assert_eq!(limits.max_days, 14);
        assert_eq!(limits.max_advance_booking_days, 60);

        let other = get_user_type_limits(Some("student"), &overrides, &defaults);
        assert_eq!(other.max_items, 3);
    }
}
