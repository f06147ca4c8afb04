//! Typed single-column ordered index.

use crate::error::{CoreError, CoreResult};
use quill_document::{decoder, encoder, Value, ValueType};
use quill_engine::Store;

/// Starting point for an ordered index scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Pivot {
    /// Start at the first (or, descending, the last) entry of the index.
    #[default]
    Unbounded,
    /// Start at the beginning (or end) of a type's domain.
    Empty(ValueType),
    /// Start at the encoding of a concrete value.
    Value(Value),
}

impl Pivot {
    /// Typed zero pivot: scans start at the boundary of the type's domain
    /// while still giving the caller a typed view of the index.
    #[must_use]
    pub fn empty(value_type: ValueType) -> Self {
        Self::Empty(value_type)
    }
}

impl From<Value> for Pivot {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// An ordered secondary index over one store.
///
/// Entries map a single value to a row key. All numeric values normalize
/// to `Float64` before encoding so every number collates in one class; a
/// null entry keeps an empty payload and its tag sorts below every other
/// type, so rows missing the indexed field always come first in ascending
/// order.
///
/// Key layout: `tag(normalized type) ‖ enc(normalized value)`, with the
/// row key appended for non-unique indexes to disambiguate duplicates.
/// The store value holds the row key in both layouts, which lets scans
/// split the value bytes from the key without a length prefix.
pub struct Index<'a> {
    store: Box<dyn Store + 'a>,
    index_type: Option<ValueType>,
    unique: bool,
}

impl<'a> Index<'a> {
    /// Wraps an index store.
    #[must_use]
    pub fn new(store: Box<dyn Store + 'a>, index_type: Option<ValueType>, unique: bool) -> Self {
        Self {
            store,
            index_type,
            unique,
        }
    }

    /// Returns the expected value type, `None` for polymorphic indexes.
    #[must_use]
    pub fn index_type(&self) -> Option<ValueType> {
        self.index_type
    }

    /// Returns true when the index rejects duplicate values.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Adds an entry mapping `value` to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateIndex`] when a unique index already
    /// holds the value.
    pub fn set(&mut self, value: &Value, key: &[u8]) -> CoreResult<()> {
        let mut store_key = self.encode_entry_value(value)?;
        if self.unique {
            if self.store.get(&store_key)?.is_some() {
                return Err(CoreError::DuplicateIndex);
            }
        } else {
            store_key.extend_from_slice(key);
        }
        self.store.put(&store_key, key)?;
        Ok(())
    }

    /// Removes the entry mapping `value` to `key`.
    ///
    /// # Errors
    ///
    /// Surfaces the engine's key-not-found error when the entry is absent.
    pub fn delete(&mut self, value: &Value, key: &[u8]) -> CoreResult<()> {
        let mut store_key = self.encode_entry_value(value)?;
        if !self.unique {
            store_key.extend_from_slice(key);
        }
        self.store.delete(&store_key)?;
        Ok(())
    }

    /// Visits entries with values `>=` the pivot in ascending order.
    ///
    /// The visitor receives the decoded (normalized) value and the row
    /// key; any error it returns stops the scan and is surfaced verbatim.
    ///
    /// # Errors
    ///
    /// Propagates engine, decoding and visitor errors.
    pub fn ascend_greater_or_equal<F>(&self, pivot: &Pivot, mut visit: F) -> CoreResult<()>
    where
        F: FnMut(&Value, &[u8]) -> CoreResult<()>,
    {
        let seek = self.seek_key(pivot, false)?;
        let cursor = self.store.ascend_greater_or_equal(seek.as_deref())?;
        for (store_key, row_key) in cursor {
            let value = self.decode_entry_value(&store_key, &row_key)?;
            visit(&value, &row_key)?;
        }
        Ok(())
    }

    /// Visits entries with values `<=` the pivot in descending order.
    ///
    /// # Errors
    ///
    /// Propagates engine, decoding and visitor errors.
    pub fn descend_less_or_equal<F>(&self, pivot: &Pivot, mut visit: F) -> CoreResult<()>
    where
        F: FnMut(&Value, &[u8]) -> CoreResult<()>,
    {
        let seek = self.seek_key(pivot, true)?;
        let cursor = self.store.descend_less_or_equal(seek.as_deref())?;
        for (store_key, row_key) in cursor {
            let value = self.decode_entry_value(&store_key, &row_key)?;
            visit(&value, &row_key)?;
        }
        Ok(())
    }

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub fn truncate(&mut self) -> CoreResult<()> {
        self.store.truncate()?;
        Ok(())
    }

    /// Normalizes a value for index storage: typed indexes convert to
    /// their declared type first, then every numeric type collapses to
    /// `Float64`.
    fn normalize(&self, value: &Value) -> CoreResult<Value> {
        let value = match self.index_type {
            Some(t) if !value.is_null() => value.convert_to(t)?,
            _ => value.clone(),
        };
        if value.value_type().is_number() && value.value_type() != ValueType::Float64 {
            return Ok(value.convert_to(ValueType::Float64)?);
        }
        Ok(value)
    }

    fn encode_entry_value(&self, value: &Value) -> CoreResult<Vec<u8>> {
        let normalized = self.normalize(value)?;
        let mut bytes = vec![normalized.value_type().tag()];
        bytes.extend_from_slice(&encoder::encode_value(&normalized)?);
        Ok(bytes)
    }

    fn decode_entry_value(&self, store_key: &[u8], row_key: &[u8]) -> CoreResult<Value> {
        let value_bytes = if self.unique {
            store_key
        } else {
            let end = store_key
                .len()
                .checked_sub(row_key.len())
                .ok_or_else(|| CoreError::corruption("index key shorter than its row key"))?;
            &store_key[..end]
        };
        let (tag, payload) = value_bytes
            .split_first()
            .ok_or_else(|| CoreError::corruption("empty index key"))?;
        let value_type = ValueType::from_tag(*tag)
            .ok_or_else(|| CoreError::corruption(format!("unknown index tag {tag:#04x}")))?;
        Ok(decoder::decode_value(value_type, payload)?)
    }

    /// Computes the engine seek key for a pivot.
    ///
    /// Descending seeks append a `0xff` byte so entries equal to the pivot
    /// (whose keys carry a row-key suffix) are included.
    fn seek_key(&self, pivot: &Pivot, descending: bool) -> CoreResult<Option<Vec<u8>>> {
        let mut seek = match pivot {
            Pivot::Unbounded => return Ok(None),
            Pivot::Empty(t) => vec![normalized_tag(*t)],
            Pivot::Value(v) => self.encode_entry_value(v)?,
        };
        if descending {
            seek.push(0xff);
        }
        Ok(Some(seek))
    }
}

fn normalized_tag(value_type: ValueType) -> u8 {
    if value_type.is_number() {
        ValueType::Float64.tag()
    } else {
        value_type.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_engine::{Engine, EngineTransaction, MemoryEngine};

    fn with_index(unique: bool, f: impl FnOnce(Index<'_>)) {
        let engine = MemoryEngine::new();
        let tx = engine.begin(true).unwrap();
        tx.create_store("idx").unwrap();
        let index = Index::new(tx.store("idx").unwrap(), None, unique);
        f(index);
    }

    fn entries(index: &Index<'_>, pivot: &Pivot) -> Vec<(Value, Vec<u8>)> {
        let mut out = Vec::new();
        index
            .ascend_greater_or_equal(pivot, |value, key| {
                out.push((value.clone(), key.to_vec()));
                Ok(())
            })
            .unwrap();
        out
    }

    #[test]
    fn numbers_collate_across_widths() {
        with_index(false, |mut index| {
            index.set(&Value::Int8(10), b"k10").unwrap();
            index.set(&Value::Uint64(2), b"k2").unwrap();
            index.set(&Value::Float64(1.5), b"k15").unwrap();

            let got = entries(&index, &Pivot::Unbounded);
            assert_eq!(
                got,
                vec![
                    (Value::Float64(1.5), b"k15".to_vec()),
                    (Value::Float64(2.0), b"k2".to_vec()),
                    (Value::Float64(10.0), b"k10".to_vec()),
                ]
            );
        });
    }

    #[test]
    fn null_sorts_first() {
        with_index(false, |mut index| {
            index.set(&Value::Float64(10.0), b"k1").unwrap();
            index.set(&Value::Null, b"k2").unwrap();

            let got = entries(&index, &Pivot::Unbounded);
            assert_eq!(
                got,
                vec![
                    (Value::Null, b"k2".to_vec()),
                    (Value::Float64(10.0), b"k1".to_vec()),
                ]
            );
        });
    }

    #[test]
    fn empty_pivot_skips_lower_domains() {
        with_index(false, |mut index| {
            index.set(&Value::Null, b"knull").unwrap();
            index.set(&Value::Bool(true), b"kbool").unwrap();
            index.set(&Value::Int64(3), b"k3").unwrap();
            index.set(&Value::from("zz"), b"kzz").unwrap();

            let got = entries(&index, &Pivot::empty(ValueType::Int64));
            assert_eq!(got[0], (Value::Float64(3.0), b"k3".to_vec()));
            // the scan continues past the numeric domain into text
            assert_eq!(got[1], (Value::from("zz"), b"kzz".to_vec()));
        });
    }

    #[test]
    fn value_pivot_seeks_within_domain() {
        with_index(false, |mut index| {
            for i in 0..5i64 {
                index
                    .set(&Value::Int64(i), format!("k{i}").as_bytes())
                    .unwrap();
            }

            let got = entries(&index, &Pivot::from(Value::Int64(2)));
            let values: Vec<_> = got.into_iter().map(|(v, _)| v).collect();
            assert_eq!(
                values,
                vec![Value::Float64(2.0), Value::Float64(3.0), Value::Float64(4.0)]
            );
        });
    }

    #[test]
    fn descend_includes_pivot_value() {
        with_index(false, |mut index| {
            for i in 0..5i64 {
                index
                    .set(&Value::Int64(i), format!("k{i}").as_bytes())
                    .unwrap();
            }

            let mut values = Vec::new();
            index
                .descend_less_or_equal(&Pivot::from(Value::Int64(2)), |value, _| {
                    values.push(value.clone());
                    Ok(())
                })
                .unwrap();
            assert_eq!(
                values,
                vec![Value::Float64(2.0), Value::Float64(1.0), Value::Float64(0.0)]
            );
        });
    }

    #[test]
    fn descend_unbounded_starts_at_the_end() {
        with_index(false, |mut index| {
            index.set(&Value::Int64(1), b"k1").unwrap();
            index.set(&Value::from("a"), b"ka").unwrap();

            let mut values = Vec::new();
            index
                .descend_less_or_equal(&Pivot::Unbounded, |value, _| {
                    values.push(value.clone());
                    Ok(())
                })
                .unwrap();
            assert_eq!(values, vec![Value::from("a"), Value::Float64(1.0)]);
        });
    }

    #[test]
    fn duplicate_values_coexist_in_non_unique() {
        with_index(false, |mut index| {
            index.set(&Value::Int64(7), b"a").unwrap();
            index.set(&Value::Int64(7), b"b").unwrap();

            let got = entries(&index, &Pivot::Unbounded);
            assert_eq!(got.len(), 2);
            assert_eq!(got[0].1, b"a".to_vec());
            assert_eq!(got[1].1, b"b".to_vec());
        });
    }

    #[test]
    fn unique_index_rejects_duplicates() {
        with_index(true, |mut index| {
            index.set(&Value::Int64(7), b"a").unwrap();
            assert!(matches!(
                index.set(&Value::Int64(7), b"b").unwrap_err(),
                CoreError::DuplicateIndex
            ));
            // a different width of the same number is still a duplicate
            assert!(matches!(
                index.set(&Value::Float64(7.0), b"c").unwrap_err(),
                CoreError::DuplicateIndex
            ));
        });
    }

    #[test]
    fn delete_removes_one_entry() {
        with_index(false, |mut index| {
            index.set(&Value::Int64(7), b"a").unwrap();
            index.set(&Value::Int64(7), b"b").unwrap();
            index.delete(&Value::Int64(7), b"a").unwrap();

            let got = entries(&index, &Pivot::Unbounded);
            assert_eq!(got.len(), 1);
            assert_eq!(got[0].1, b"b".to_vec());

            assert!(index.delete(&Value::Int64(7), b"a").is_err());
        });
    }

    #[test]
    fn truncate_empties_the_index() {
        with_index(false, |mut index| {
            index.set(&Value::Int64(7), b"a").unwrap();
            index.truncate().unwrap();
            assert!(entries(&index, &Pivot::Unbounded).is_empty());
        });
    }

    #[test]
    fn typed_index_converts_on_insert() {
        let engine = MemoryEngine::new();
        let tx = engine.begin(true).unwrap();
        tx.create_store("idx").unwrap();
        let mut index = Index::new(tx.store("idx").unwrap(), Some(ValueType::Int32), false);

        index.set(&Value::Float64(3.0), b"a").unwrap();
        assert!(index.set(&Value::from("nope"), b"b").is_err());

        let got = entries(&index, &Pivot::Unbounded);
        assert_eq!(got[0].0, Value::Float64(3.0));
    }

    #[test]
    fn visitor_error_stops_scan() {
        with_index(false, |mut index| {
            for i in 0..10i64 {
                index
                    .set(&Value::Int64(i), format!("k{i}").as_bytes())
                    .unwrap();
            }

            let mut count = 0;
            let err = index
                .ascend_greater_or_equal(&Pivot::Unbounded, |_, _| {
                    count += 1;
                    if count >= 5 {
                        return Err(CoreError::invalid_operation("stop"));
                    }
                    Ok(())
                })
                .unwrap_err();
            assert_eq!(err, CoreError::invalid_operation("stop"));
            assert_eq!(count, 5);
        });
    }
}
