//! Dotted paths into nested documents and arrays.

use crate::document::{Array, Document};
use crate::error::{DocumentError, DocumentResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dotted address into a nested document, e.g. `a.b.1`.
///
/// Each segment matches a document field by name or, when the current value
/// is an array, parses as a non-negative index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePath(Vec<String>);

impl ValuePath {
    /// Parses a dotted path. An empty string yields an empty path, which
    /// fails at resolution time.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self(Vec::new());
        }
        Self(path.split('.').map(str::to_string).collect())
    }

    /// Builds a path from pre-split segments.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true when the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolves the path against a document root.
    ///
    /// # Errors
    ///
    /// Returns a parse error for an empty path and
    /// [`DocumentError::FieldNotFound`] for a missing field, a non-numeric
    /// segment applied to an array, or an out-of-range index.
    pub fn get_value(&self, root: &dyn Document) -> DocumentResult<Value> {
        let (first, rest) = self
            .0
            .split_first()
            .ok_or_else(|| DocumentError::parse("empty path"))?;

        let mut current = root.get_by_field(first)?;
        for segment in rest {
            current = match current {
                Value::Document(d) => d.get_by_field(segment)?,
                Value::Array(a) => {
                    let index: usize = segment
                        .parse()
                        .map_err(|_| DocumentError::FieldNotFound)?;
                    a.get_by_index(index)?
                }
                _ => return Err(DocumentError::FieldNotFound),
            };
        }
        Ok(current)
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parse_json;

    fn resolve(data: &str, path: &str) -> DocumentResult<Value> {
        let buf = parse_json(data).unwrap();
        ValuePath::parse(path).get_value(&buf)
    }

    #[test]
    fn empty_path_fails() {
        assert!(resolve(r#"{"a": 1}"#, "").is_err());
    }

    #[test]
    fn root_field() {
        let v = resolve(r#"{"a": {"b": [1, 2, 3]}}"#, "a").unwrap();
        assert!(matches!(v, Value::Document(_)));
    }

    #[test]
    fn nested_document_and_array() {
        let v = resolve(r#"{"a": {"b": [1, 2, 3]}}"#, "a.b").unwrap();
        assert!(matches!(v, Value::Array(_)));

        let v = resolve(r#"{"a": {"b": [1, 2, 3]}}"#, "a.b.1").unwrap();
        assert_eq!(v, Value::Int8(2));
    }

    #[test]
    fn numeric_field_name() {
        let v = resolve(r#"{"a": {"0": [1, 2, 3]}}"#, "a.0").unwrap();
        assert!(matches!(v, Value::Array(_)));
    }

    #[test]
    fn index_out_of_range() {
        assert_eq!(
            resolve(r#"{"a": {"b": [1, 2, 3]}}"#, "a.b.1000").unwrap_err(),
            DocumentError::FieldNotFound
        );
    }

    #[test]
    fn letter_index_on_array() {
        assert_eq!(
            resolve(r#"{"a": {"b": [1, 2, 3]}}"#, "a.b.c").unwrap_err(),
            DocumentError::FieldNotFound
        );
    }

    #[test]
    fn unknown_path() {
        assert_eq!(
            resolve(r#"{"a": {"b": [1, 2, 3]}}"#, "a.e.f").unwrap_err(),
            DocumentError::FieldNotFound
        );
    }

    #[test]
    fn display_joins_segments() {
        assert_eq!(ValuePath::parse("a.b.1").to_string(), "a.b.1");
    }
}
