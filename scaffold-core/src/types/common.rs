use std::collections::BTreeMap;

pub type AnyValue = serde_json::Value;

/// Resolved recipe variables, keyed by variable name.
pub type Variables = BTreeMap<String, serde_json::Value>;

pub(crate) fn is_false(v: &bool) -> bool {
    !*v
}

pub(crate) fn default_true() -> bool {
    true
}
