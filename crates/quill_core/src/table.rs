//! Tables: document materialization, key assignment, constraint
//! enforcement and index upkeep.

use crate::config::TableConfig;
use crate::error::{CoreError, CoreResult};
use crate::index::Index;
use crate::transaction::Transaction;
use quill_document::{
    decode_document, encode_document, encoder, Document, DocumentError, DocumentResult,
    EncodedDocument, FieldBuffer, Value, ValuePath,
};
use quill_engine::Store;
use std::collections::BTreeMap;

/// A handle on one table within a transaction.
///
/// The handle owns the table's data store and consults the transaction's
/// index catalog to keep secondary indexes in sync with every mutation.
/// Handles are cheap views; they hold no locks of their own.
pub struct Table<'a> {
    tx: &'a Transaction<'a>,
    name: String,
    config: TableConfig,
    store: Box<dyn Store + 'a>,
}

impl<'a> Table<'a> {
    pub(crate) fn new(
        tx: &'a Transaction<'a>,
        name: &str,
        config: TableConfig,
        store: Box<dyn Store + 'a>,
    ) -> Self {
        Self {
            tx,
            name: name.to_string(),
            config,
            store,
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table configuration.
    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Inserts a document and returns its key.
    ///
    /// Field constraints convert the affected values in place before the
    /// document is persisted; the returned key is either the encoded
    /// primary key or the next sequential identifier. Every index on the
    /// table receives a matching entry (null when the indexed path is
    /// absent).
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingPrimaryKey`] when the PK field is absent or
    ///   empty
    /// - [`CoreError::ConstraintViolation`] when a constrained value does
    ///   not convert
    /// - [`CoreError::DuplicateDocument`] when the key already exists
    /// - [`CoreError::DuplicateIndex`] when a unique index rejects the
    ///   document
    pub fn insert(&mut self, doc: &dyn Document) -> CoreResult<Vec<u8>> {
        let mut buf = FieldBuffer::new();
        buf.scan_document(doc)?;
        self.apply_constraints(&mut buf)?;

        let key = self.key_for(&buf)?;
        if self.store.get(&key)?.is_some() {
            return Err(CoreError::DuplicateDocument);
        }
        self.write_row(&key, &buf)?;
        tracing::trace!(table = %self.name, "inserted document");
        Ok(key)
    }

    /// Returns the document stored under `key` as a lazy view.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentNotFound`] when the key is absent.
    pub fn get_document(&self, key: &[u8]) -> CoreResult<StoredDocument> {
        let bytes = self
            .store
            .get(key)?
            .ok_or(CoreError::DocumentNotFound)?;
        Ok(StoredDocument { bytes })
    }

    /// Deletes the document stored under `key` along with its index
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentNotFound`] when the key is absent.
    pub fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        let bytes = self
            .store
            .get(key)?
            .ok_or(CoreError::DocumentNotFound)?;
        let buf = decode_document(&bytes)?;

        for config in self.tx.table_index_configs(&self.name)? {
            let mut index = self.tx.index_from_config(&config)?;
            let value = value_or_null(&config.path, &buf)?;
            index.delete(&value, key)?;
        }
        self.store.delete(key)?;
        tracing::trace!(table = %self.name, "deleted document");
        Ok(())
    }

    /// Replaces the document stored under `key`, keeping the key fixed.
    ///
    /// Constraint enforcement and index upkeep match [`Table::insert`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentNotFound`] when the key is absent.
    pub fn replace(&mut self, key: &[u8], doc: &dyn Document) -> CoreResult<()> {
        self.delete(key)?;

        let mut buf = FieldBuffer::new();
        buf.scan_document(doc)?;
        self.apply_constraints(&mut buf)?;
        self.write_row(key, &buf)?;
        Ok(())
    }

    /// Removes every document and clears every index of this table.
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub fn truncate(&mut self) -> CoreResult<()> {
        self.store.truncate()?;
        for config in self.tx.table_index_configs(&self.name)? {
            self.tx.index_from_config(&config)?.truncate()?;
        }
        Ok(())
    }

    /// Visits every document in ascending key order.
    ///
    /// With sequential keys this is insertion order; with a primary key it
    /// is PK-sorted order. The visitor receives a [`KeyedDocument`] so it
    /// can recover the row key; any error it returns stops the scan and is
    /// surfaced verbatim. The visitor must not mutate this table.
    ///
    /// # Errors
    ///
    /// Propagates engine and visitor errors.
    pub fn iterate<F>(&self, mut visit: F) -> CoreResult<()>
    where
        F: FnMut(KeyedDocument<'_>) -> CoreResult<()>,
    {
        let cursor = self.store.ascend_greater_or_equal(None)?;
        for (key, bytes) in cursor {
            visit(KeyedDocument {
                key: &key,
                doc: EncodedDocument::new(&bytes),
            })?;
        }
        Ok(())
    }

    /// Returns this table's indexes keyed by their dotted path.
    ///
    /// # Errors
    ///
    /// Propagates catalog errors.
    pub fn indexes(&self) -> CoreResult<BTreeMap<String, Index<'a>>> {
        let mut map = BTreeMap::new();
        for config in self.tx.table_index_configs(&self.name)? {
            map.insert(config.path.to_string(), self.tx.index_from_config(&config)?);
        }
        Ok(map)
    }

    /// Applies every field constraint in place: the value at each
    /// constrained path converts to the declared type, and the converted
    /// value is what gets persisted. Absent paths are skipped.
    fn apply_constraints(&self, buf: &mut FieldBuffer) -> CoreResult<()> {
        for constraint in &self.config.field_constraints {
            let value = match constraint.path.get_value(&*buf) {
                Ok(value) => value,
                Err(DocumentError::FieldNotFound) => continue,
                Err(err) => return Err(err.into()),
            };
            let converted = value.convert_to(constraint.field_type).map_err(|err| {
                CoreError::constraint_violation(constraint.path.to_string(), err)
            })?;
            buf.replace_at_path(&constraint.path, converted)?;
        }
        Ok(())
    }

    /// Computes the row key: the bare-scalar encoding of the primary key
    /// value, or the next sequential identifier big-endian.
    fn key_for(&mut self, buf: &FieldBuffer) -> CoreResult<Vec<u8>> {
        let Some(pk) = &self.config.primary_key else {
            let seq = self.store.next_sequence()?;
            return Ok(encoder::encode_u64(seq).to_vec());
        };

        let value = match pk.path.get_value(buf) {
            Ok(value) => value,
            Err(DocumentError::FieldNotFound) => return Err(CoreError::MissingPrimaryKey),
            Err(err) => return Err(err.into()),
        };
        if is_empty_key(&value) {
            return Err(CoreError::MissingPrimaryKey);
        }
        let value = value
            .convert_to(pk.field_type)
            .map_err(|err| CoreError::constraint_violation(pk.path.to_string(), err))?;
        Ok(encoder::encode_value(&value)?)
    }

    fn write_row(&mut self, key: &[u8], buf: &FieldBuffer) -> CoreResult<()> {
        let encoded = encode_document(buf)?;
        self.store.put(key, &encoded)?;

        for config in self.tx.table_index_configs(&self.name)? {
            let mut index = self.tx.index_from_config(&config)?;
            let value = value_or_null(&config.path, buf)?;
            index.set(&value, key)?;
        }
        Ok(())
    }
}

fn value_or_null(path: &ValuePath, doc: &dyn Document) -> CoreResult<Value> {
    match path.get_value(doc) {
        Ok(value) => Ok(value),
        Err(DocumentError::FieldNotFound) => Ok(Value::Null),
        Err(err) => Err(err.into()),
    }
}

fn is_empty_key(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.is_empty(),
        Value::Bytes(b) => b.is_empty(),
        _ => false,
    }
}

/// A document read back from a table, decoded lazily.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    bytes: Vec<u8>,
}

impl StoredDocument {
    /// Returns the raw encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decodes the whole document.
    ///
    /// # Errors
    ///
    /// Returns a corruption error for malformed bytes.
    pub fn to_field_buffer(&self) -> DocumentResult<FieldBuffer> {
        decode_document(&self.bytes)
    }
}

impl Document for StoredDocument {
    fn iterate(
        &self,
        visit: &mut dyn FnMut(&str, Value) -> DocumentResult<()>,
    ) -> DocumentResult<()> {
        EncodedDocument::new(&self.bytes).iterate(visit)
    }

    fn get_by_field(&self, name: &str) -> DocumentResult<Value> {
        EncodedDocument::new(&self.bytes).get_by_field(name)
    }
}

/// A document yielded by [`Table::iterate`], carrying its row key.
///
/// Valid only for the duration of the visit; copy what you need out of it
/// (for example with [`KeyedDocument::to_field_buffer`]).
#[derive(Debug, Clone, Copy)]
pub struct KeyedDocument<'a> {
    key: &'a [u8],
    doc: EncodedDocument<'a>,
}

impl KeyedDocument<'_> {
    /// Returns the row key.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        self.key
    }

    /// Decodes the whole document.
    ///
    /// # Errors
    ///
    /// Returns a corruption error for malformed bytes.
    pub fn to_field_buffer(&self) -> DocumentResult<FieldBuffer> {
        self.doc.to_field_buffer()
    }
}

impl Document for KeyedDocument<'_> {
    fn iterate(
        &self,
        visit: &mut dyn FnMut(&str, Value) -> DocumentResult<()>,
    ) -> DocumentResult<()> {
        self.doc.iterate(visit)
    }

    fn get_by_field(&self, name: &str) -> DocumentResult<Value> {
        self.doc.get_by_field(name)
    }
}
