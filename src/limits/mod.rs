//! Limit resolution
//!
//! Pure functions resolving borrowing limits through the override →
//! resolved-default → hard-coded-fallback chain. No IO, no errors; malformed
//! input always degrades to the next tier.

mod resolver;

pub use resolver::{
    get_limit, get_user_type_limits, normalize_scope, resolve_default, sanitize_json_limit,
    sanitize_limit, ResolvedDefaults,
};
