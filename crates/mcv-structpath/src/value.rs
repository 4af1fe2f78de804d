//! Snapshot value model
//!
//! Provides [`Snapshot`], the schema-agnostic tree a configuration dump is
//! decoded into before any query runs against it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Point-in-time configuration dump from one data-plane agent
///
/// A tagged union over the shapes a dump can take. Mappings keep insertion
/// order so query results come back in document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    /// Explicit null
    #[default]
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Numeric scalar
    Number(serde_json::Number),
    /// String scalar
    String(String),
    /// Ordered sequence
    Sequence(Vec<Snapshot>),
    /// Key-unique mapping
    Mapping(IndexMap<String, Snapshot>),
}

impl Snapshot {
    /// Decode a snapshot from JSON text
    ///
    /// # Errors
    /// Returns `SnapshotError::Json` if the text is not valid JSON
    pub fn from_json_str(text: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(text).map_err(SnapshotError::Json)
    }

    /// Decode a snapshot from YAML text
    ///
    /// # Errors
    /// Returns `SnapshotError::Yaml` if the text is not valid YAML or uses
    /// non-string mapping keys
    pub fn from_yaml_str(text: &str) -> Result<Self, SnapshotError> {
        serde_yaml::from_str(text).map_err(SnapshotError::Yaml)
    }

    /// Short name of this node's shape, used in diagnostics
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Look up a field of a mapping
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        match self {
            Self::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// String contents, if this is a string scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements, if this is a sequence
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Snapshot]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Check if this is a scalar (not a sequence or mapping)
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }

    /// Nesting depth (scalars are depth 0)
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Sequence(items) => 1 + items.iter().map(Self::depth).max().unwrap_or(0),
            Self::Mapping(map) => 1 + map.values().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

impl From<serde_json::Value> for Snapshot {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Snapshot {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Snapshot {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Snapshot {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Snapshot {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Snapshot {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Snapshot {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<Vec<Snapshot>> for Snapshot {
    fn from(items: Vec<Snapshot>) -> Self {
        Self::Sequence(items)
    }
}

impl FromIterator<(String, Snapshot)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Snapshot)>>(iter: I) -> Self {
        Self::Mapping(iter.into_iter().collect())
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Errors decoding a snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Malformed JSON dump
    #[error("invalid JSON snapshot: {0}")]
    Json(#[source] serde_json::Error),

    /// Malformed YAML dump
    #[error("invalid YAML snapshot: {0}")]
    Yaml(#[source] serde_yaml::Error),
}
