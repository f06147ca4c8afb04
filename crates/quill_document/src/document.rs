//! Document and array capabilities and their canonical in-memory buffers.

use crate::error::{DocumentError, DocumentResult};
use crate::path::ValuePath;
use crate::value::Value;

/// An ordered collection of named values.
///
/// This is the primary record capability: anything that can emit its fields
/// in definition order and look one up by name is a document. Concrete
/// implementors include [`FieldBuffer`], the lazy
/// [`EncodedDocument`](crate::decoder::EncodedDocument) view over persisted
/// bytes, and adapters over host data built by
/// [`to_document`](crate::bridge::to_document).
pub trait Document {
    /// Calls `visit` for each `(name, value)` pair in definition order.
    ///
    /// Any error returned by the visitor short-circuits the iteration and
    /// is surfaced verbatim.
    fn iterate(&self, visit: &mut dyn FnMut(&str, Value) -> DocumentResult<()>)
        -> DocumentResult<()>;

    /// Returns the value of the first field with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::FieldNotFound`] when no field matches.
    fn get_by_field(&self, name: &str) -> DocumentResult<Value>;
}

/// An ordered collection of values indexed by position.
pub trait Array {
    /// Calls `visit` for each `(index, value)` pair in order.
    fn iterate(&self, visit: &mut dyn FnMut(usize, Value) -> DocumentResult<()>)
        -> DocumentResult<()>;

    /// Returns the value at the given index.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::FieldNotFound`] when the index is out of
    /// range.
    fn get_by_index(&self, index: usize) -> DocumentResult<Value>;
}

impl<T: Document + ?Sized> Document for &T {
    fn iterate(
        &self,
        visit: &mut dyn FnMut(&str, Value) -> DocumentResult<()>,
    ) -> DocumentResult<()> {
        (**self).iterate(visit)
    }

    fn get_by_field(&self, name: &str) -> DocumentResult<Value> {
        (**self).get_by_field(name)
    }
}

/// The canonical in-memory mutable document.
///
/// Fields keep their insertion order and duplicate names are permitted;
/// lookup always resolves to the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBuffer {
    fields: Vec<(String, Value)>,
}

impl FieldBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, keeping any existing field with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Replaces the first field with the given name, or appends it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Replaces the first field with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::FieldNotFound`] when no field matches.
    pub fn replace(&mut self, name: &str, value: impl Into<Value>) -> DocumentResult<()> {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => {
                *v = value.into();
                Ok(())
            }
            None => Err(DocumentError::FieldNotFound),
        }
    }

    /// Removes the first field with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::FieldNotFound`] when no field matches.
    pub fn delete(&mut self, name: &str) -> DocumentResult<()> {
        match self.fields.iter().position(|(n, _)| n == name) {
            Some(i) => {
                self.fields.remove(i);
                Ok(())
            }
            None => Err(DocumentError::FieldNotFound),
        }
    }

    /// Returns the number of fields, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the buffer has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns a reference to the value of the first field with this name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value of the first field with
    /// this name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterates over `(name, value)` pairs without copying.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Appends every field of `other`, duplicates included.
    ///
    /// # Errors
    ///
    /// Propagates any error from iterating `other`.
    pub fn scan_document(&mut self, other: &dyn Document) -> DocumentResult<()> {
        other.iterate(&mut |name, value| {
            self.fields.push((name.to_string(), value));
            Ok(())
        })
    }

    /// Replaces the value at `path` in place, descending through nested
    /// documents and arrays.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::FieldNotFound`] when the path does not
    /// resolve, and a parse error when the path is empty.
    pub fn replace_at_path(&mut self, path: &ValuePath, value: Value) -> DocumentResult<()> {
        let segments = path.segments();
        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| DocumentError::parse("empty path"))?;

        let mut current = self.get_mut(first).ok_or(DocumentError::FieldNotFound)?;
        for segment in rest {
            current = match current {
                Value::Document(d) => d.get_mut(segment).ok_or(DocumentError::FieldNotFound)?,
                Value::Array(a) => {
                    let index: usize = segment
                        .parse()
                        .map_err(|_| DocumentError::FieldNotFound)?;
                    a.get_mut(index).ok_or(DocumentError::FieldNotFound)?
                }
                _ => return Err(DocumentError::FieldNotFound),
            };
        }
        *current = value;
        Ok(())
    }
}

impl Document for FieldBuffer {
    fn iterate(
        &self,
        visit: &mut dyn FnMut(&str, Value) -> DocumentResult<()>,
    ) -> DocumentResult<()> {
        for (name, value) in &self.fields {
            visit(name, value.clone())?;
        }
        Ok(())
    }

    fn get_by_field(&self, name: &str) -> DocumentResult<Value> {
        self.get(name).cloned().ok_or(DocumentError::FieldNotFound)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldBuffer {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Builds a document from any map-shaped iterator of `(name, value)` pairs.
///
/// Iteration order follows the source map; `get_by_field` succeeds for
/// every present key.
pub fn from_map<I, K, V>(map: I) -> FieldBuffer
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    map.into_iter().collect()
}

/// The canonical in-memory mutable array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueBuffer {
    values: Vec<Value>,
}

impl ValueBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value.
    pub fn append(&mut self, value: impl Into<Value>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the buffer has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a reference to the value at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns a mutable reference to the value at the given index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.values.get_mut(index)
    }

    /// Iterates over the values without copying.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Appends every value of `other`.
    ///
    /// # Errors
    ///
    /// Propagates any error from iterating `other`.
    pub fn scan_array(&mut self, other: &dyn Array) -> DocumentResult<()> {
        other.iterate(&mut |_, value| {
            self.values.push(value);
            Ok(())
        })
    }
}

impl Array for ValueBuffer {
    fn iterate(
        &self,
        visit: &mut dyn FnMut(usize, Value) -> DocumentResult<()>,
    ) -> DocumentResult<()> {
        for (i, value) in self.values.iter().enumerate() {
            visit(i, value.clone())?;
        }
        Ok(())
    }

    fn get_by_index(&self, index: usize) -> DocumentResult<Value> {
        self.values
            .get(index)
            .cloned()
            .ok_or(DocumentError::FieldNotFound)
    }
}

impl From<Vec<Value>> for ValueBuffer {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl<V: Into<Value>> FromIterator<V> for ValueBuffer {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}
