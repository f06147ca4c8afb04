//! Table and index configuration.

use quill_document::{ValuePath, ValueType};
use serde::{Deserialize, Serialize};

/// A typed constraint on one field path.
///
/// Used both for the primary key (the value at `path` becomes the row key)
/// and for plain field constraints (the value at `path` is converted to
/// `field_type` before the document is persisted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConstraint {
    /// Dotted path of the constrained field.
    pub path: ValuePath,
    /// Target type for the value at `path`.
    pub field_type: ValueType,
}

impl FieldConstraint {
    /// Creates a constraint from a dotted path string.
    #[must_use]
    pub fn new(path: &str, field_type: ValueType) -> Self {
        Self {
            path: ValuePath::parse(path),
            field_type,
        }
    }
}

/// Persistent configuration of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Optional primary key; without one the table assigns sequential
    /// keys.
    #[serde(default)]
    pub primary_key: Option<FieldConstraint>,
    /// Field constraints applied to every inserted document.
    #[serde(default)]
    pub field_constraints: Vec<FieldConstraint>,
}

/// Persistent configuration of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Name of the index, unique across the database.
    pub index_name: String,
    /// Name of the indexed table.
    pub table_name: String,
    /// Dotted path of the indexed field.
    pub path: ValuePath,
    /// Whether the index rejects duplicate values.
    #[serde(default)]
    pub unique: bool,
    /// Expected value type; `None` accepts any scalar.
    #[serde(default)]
    pub index_type: Option<ValueType>,
}

impl IndexConfig {
    /// Creates a non-unique polymorphic index configuration.
    #[must_use]
    pub fn new(index_name: &str, table_name: &str, path: &str) -> Self {
        Self {
            index_name: index_name.to_string(),
            table_name: table_name.to_string(),
            path: ValuePath::parse(path),
            unique: false,
            index_type: None,
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Fixes the expected value type.
    #[must_use]
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.index_type = Some(value_type);
        self
    }
}
