//! Field-level updates merged into an existing entry.

use std::collections::BTreeMap;

use sonic_db_common::FieldMap;

/// Change requested for one field of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Set or overwrite the field.
    Set(String),
    /// Remove the field.
    Unset,
}

impl FieldUpdate {
    /// Creates a set update.
    pub fn set(value: impl Into<String>) -> Self {
        FieldUpdate::Set(value.into())
    }
}

impl From<Option<String>> for FieldUpdate {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldUpdate::Unset, FieldUpdate::Set)
    }
}

/// Field updates keyed by field name.
pub type FieldUpdates = BTreeMap<String, FieldUpdate>;

/// Applies `updates` on top of `original`.
///
/// Fields not mentioned in `updates` keep their original value.
pub fn merge_fields(original: &FieldMap, updates: &FieldUpdates) -> FieldMap {
    let mut merged = original.clone();
    for (field, update) in updates {
        match update {
            FieldUpdate::Set(value) => {
                merged.insert(field.clone(), value.clone());
            }
            FieldUpdate::Unset => {
                merged.remove(field);
            }
        }
    }
    merged
}
