//! Schema Validator
//!
//! Checks that supplied data carries every required feature before anything
//! downstream runs. Read-only, never attempts partial inference.

use std::collections::BTreeMap;

use super::layout::{feature_index, FEATURE_LAYOUT};
use crate::logic::error::SchemaError;

/// Required feature names, in canonical order
pub fn required_features() -> &'static [&'static str] {
    FEATURE_LAYOUT
}

/// Validate table columns: must be a superset of the schema, order irrelevant.
pub fn validate_columns<S: AsRef<str>>(columns: &[S]) -> Result<(), SchemaError> {
    let missing: Vec<String> = FEATURE_LAYOUT
        .iter()
        .filter(|required| !columns.iter().any(|c| c.as_ref() == **required))
        .map(|s| s.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingFeatures { missing })
    }
}

/// Validate a name → value mapping (manual entry).
///
/// Unlike tables, manual fields may not carry extra names: an unknown name is
/// almost always a typo that would otherwise be dropped silently.
pub fn validate_named(fields: &BTreeMap<String, f32>) -> Result<(), SchemaError> {
    if let Some(unknown) = fields.keys().find(|name| feature_index(name).is_none()) {
        return Err(SchemaError::UnknownFeature { name: unknown.clone() });
    }

    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    validate_columns(&names)
}
