//! Field maps and key helpers for table entries.

use std::collections::BTreeMap;

/// Field-name to field-value mapping for one table entry.
///
/// An empty map is the same as an absent entry.
pub type FieldMap = BTreeMap<String, String>;

/// Separator between table name and key in CONFIG_DB / STATE_DB.
pub const TABLE_KEY_SEPARATOR: char = '|';

/// Placeholder field written for entries that carry no data.
pub const NULL_FIELD: &str = "NULL";

/// Suffix marking a field whose value is a comma separated list.
const LIST_FIELD_SUFFIX: char = '@';

/// Builds the Redis key `<table>|<key>`.
pub fn table_key(table: &str, key: &str) -> String {
    format!("{}{}{}", table, TABLE_KEY_SEPARATOR, key)
}

/// Converts raw hash fields into a typed entry.
///
/// The `NULL` placeholder field is dropped and the `@` list marker is
/// stripped from field names; list values keep their comma separated form.
pub fn raw_to_typed<I>(raw: I) -> FieldMap
where
    I: IntoIterator<Item = (String, String)>,
{
    raw.into_iter()
        .filter(|(field, _)| field != NULL_FIELD)
        .map(|(field, value)| match field.strip_suffix(LIST_FIELD_SUFFIX) {
            Some(name) => (name.to_string(), value),
            None => (field, value),
        })
        .collect()
}

/// Helper trait for reading entry fields.
pub trait FieldMapExt {
    /// Gets the value for a field, if present.
    fn get_field(&self, field: &str) -> Option<&str>;

    /// Gets the value for a field, returning the default if not present.
    fn get_field_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str;

    /// Checks if a field exists.
    fn has_field(&self, field: &str) -> bool;
}

impl FieldMapExt for FieldMap {
    fn get_field(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }

    fn get_field_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str {
        self.get_field(field).unwrap_or(default)
    }

    fn has_field(&self, field: &str) -> bool {
        self.contains_key(field)
    }
}

/// Builds a [`FieldMap`] from field => value pairs.
#[macro_export]
macro_rules! field_map {
    ($($field:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::FieldMap::new();
        $(map.insert($field.to_string(), $value.to_string());)*
        map
    }};
}
