//! Stable row identifiers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a row.
///
/// Rows with a usable id field are keyed by that id. Numeric ids are stored in
/// their decimal form so that `7` and `"7"` name the same row. Rows without an
/// id fall back to their absolute offset, kept in a separate variant so a
/// position never equals an id.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum RowKey {
    /// Key taken from the row's id field
    #[display("{_0}")]
    Id(String),
    /// Absolute offset of a row that has no id
    #[display("#{_0}")]
    Position(u64),
}

impl RowKey {
    /// Key from any string-like id.
    pub fn new(key: impl Into<String>) -> Self {
        Self::Id(key.into())
    }

    /// Key from a JSON scalar. Objects, arrays, null and empty strings have no key.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Id(s.clone())),
            Value::Number(n) => Some(Self::Id(n.to_string())),
            Value::Bool(b) => Some(Self::Id(b.to_string())),
            _ => None,
        }
    }

    /// Reads `id_field` from the serialized form of `row`.
    pub fn from_row<T: Serialize>(row: &T, id_field: &str) -> Option<Self> {
        let value = serde_json::to_value(row).ok()?;
        value.get(id_field).and_then(Self::from_value)
    }

    /// Positional key for rows without an id, from the row's absolute offset.
    pub fn positional(offset: u64) -> Self {
        Self::Position(offset)
    }

    /// Whether this key was derived from a position rather than an id.
    pub fn is_positional(&self) -> bool {
        matches!(self, Self::Position(_))
    }

    /// The id text, if the key came from an id field.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Position(_) => None,
        }
    }
}

impl From<String> for RowKey {
    fn from(key: String) -> Self {
        Self::Id(key)
    }
}

impl From<&str> for RowKey {
    fn from(key: &str) -> Self {
        Self::Id(key.to_string())
    }
}
