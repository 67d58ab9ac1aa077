//! Cache key and TTL policy
//!
//! Pure functions defining the hierarchical key space, the glob patterns used
//! for bulk invalidation, and the per-operation TTL table. Keys follow the
//! format `jobnimbus:{entity}:{operation}:{identifier}`; the identifier is
//! opaque and may itself contain colons.

use crate::constants::{APP_NAMESPACE, DEFAULT_TTL_SECS};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Per-operation TTLs, tiered by data volatility.
///
/// Hot data (5-20 min) changes frequently in the CRM; warm data (20-30 min)
/// changes a few times a day; cold analytics aggregates (60 min) tolerate the
/// most staleness in exchange for fewer origin round trips.
static TTL_TABLE: Lazy<HashMap<&'static str, u64>> = Lazy::new(|| {
    HashMap::from([
        // Hot: frequently-changing operational data
        ("ACTIVITIES_LIST", 300),
        ("TASKS_LIST", 600),
        ("CONTACTS_LIST", 600),
        ("JOBS_LIST", 600),
        ("CONTACTS_GET", 900),
        ("JOBS_GET", 900),
        ("TASKS_GET", 900),
        ("ATTACHMENTS_LIST", 900),
        ("ATTACHMENTS_GET", 900),
        ("ESTIMATES_LIST", 1200),
        ("ESTIMATES_GET", 1200),
        ("WORKFLOWS_LIST", 1200),
        // Warm: reference data that changes a few times a day
        ("USERS_LIST", 1800),
        ("PRODUCTS_LIST", 1800),
        ("WEBHOOKS_LIST", 1800),
        ("LOCATIONS_LIST", 1800),
        // Cold: analytics aggregates
        ("ANALYTICS_REVENUE_FORECAST", 3600),
        ("ANALYTICS_SALES_VELOCITY", 3600),
        ("ANALYTICS_TASK_METRICS", 3600),
        ("ANALYTICS_PIPELINE", 3600),
    ])
});

/// Parsed representation of a hierarchical cache key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub namespace: String,
    pub entity: String,
    pub operation: String,
    pub identifier: String,
}

/// Build a namespaced cache key from the `(entity, operation, identifier)` triple
pub fn build_key(entity: &str, operation: &str, identifier: &str) -> String {
    format!("{APP_NAMESPACE}:{entity}:{operation}:{identifier}")
}

/// Build a glob pattern matching all keys for an entity/operation pair
///
/// Pass `"*"` for either segment to widen the match; `("*", "*")` covers the
/// entire application namespace.
pub fn build_invalidation_pattern(entity: &str, operation: &str) -> String {
    format!("{APP_NAMESPACE}:{entity}:{operation}:*")
}

/// Parse a stored key back into its segments
///
/// Returns `None` if the key has fewer than four colon-delimited segments.
/// Everything past the third colon belongs to the identifier and is never
/// re-split.
pub fn parse_key(key: &str) -> Option<ParsedKey> {
    let mut parts = key.splitn(4, ':');
    let namespace = parts.next()?;
    let entity = parts.next()?;
    let operation = parts.next()?;
    let identifier = parts.next()?;

    Some(ParsedKey {
        namespace: namespace.to_string(),
        entity: entity.to_string(),
        operation: operation.to_string(),
        identifier: identifier.to_string(),
    })
}

/// Look up the TTL for a named operation, falling back to the default (15 min)
pub fn ttl_for(operation_key: &str) -> u64 {
    TTL_TABLE
        .get(operation_key)
        .copied()
        .unwrap_or(DEFAULT_TTL_SECS)
}
