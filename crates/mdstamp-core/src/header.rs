//! The header fields mdstamp owns: `created`, `modified` and `hash`.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Header key names used for the three managed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldNames {
    pub created: String,
    pub modified: String,
    pub hash: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            created: "created".to_string(),
            modified: "modified".to_string(),
            hash: "hash".to_string(),
        }
    }
}

/// Current values of the managed fields in a document header.
///
/// A field counts as present only if it holds a non-empty string or a
/// non-zero number. Nulls, empty strings, booleans and nested values are
/// treated as absent and get overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub created: Option<String>,
    pub modified: Option<String>,
    pub hash: Option<String>,
}

impl HeaderFields {
    /// Read the managed fields out of a parsed header mapping.
    #[must_use]
    pub fn from_mapping(mapping: &Mapping, names: &FieldNames) -> Self {
        Self {
            created: scalar(mapping, &names.created),
            modified: scalar(mapping, &names.modified),
            hash: scalar(mapping, &names.hash),
        }
    }

    /// Whether all three fields are populated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.created.is_some() && self.modified.is_some() && self.hash.is_some()
    }
}

fn scalar(mapping: &Mapping, key: &str) -> Option<String> {
    match mapping.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Field values to write into a header. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderUpdate {
    pub created: Option<String>,
    pub modified: Option<String>,
    pub hash: Option<String>,
}

impl HeaderUpdate {
    /// `(key, value)` pairs to set, in header order.
    #[must_use]
    pub fn entries<'a>(&'a self, names: &'a FieldNames) -> Vec<(&'a str, &'a str)> {
        [
            (names.created.as_str(), self.created.as_deref()),
            (names.modified.as_str(), self.modified.as_deref()),
            (names.hash.as_str(), self.hash.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }

    /// Merge this update into a header mapping, leaving every other key as is.
    #[must_use]
    pub fn apply(&self, mapping: &Mapping, names: &FieldNames) -> Mapping {
        let mut merged = mapping.clone();
        for (key, value) in self.entries(names) {
            merged.insert(Value::from(key), Value::from(value));
        }
        merged
    }
}
