//! Transactions, the system catalog and DDL.

use crate::config::{IndexConfig, TableConfig};
use crate::error::{CoreError, CoreResult};
use crate::index::Index;
use crate::table::Table;
use quill_document::{DocumentError, Value};
use quill_engine::{EngineTransaction, Store};

/// Catalog store holding `table name -> TableConfig`.
pub(crate) const TABLE_CATALOG_STORE: &str = "__quill_tables";

/// Catalog store holding `index name -> IndexConfig`.
pub(crate) const INDEX_CATALOG_STORE: &str = "__quill_indexes";

/// Prefix reserved for internal store names; user tables cannot use it.
pub(crate) const RESERVED_PREFIX: &str = "__quill_";

/// Internal store name for an index. The prefix keeps it collision-free
/// with user table names.
fn index_store_name(index_name: &str) -> String {
    format!("{RESERVED_PREFIX}index_{index_name}")
}

/// A database transaction.
///
/// Wraps an engine transaction and adds the system catalog on top: table
/// and index configurations live in two dedicated stores, so every DDL
/// effect commits or rolls back together with the data it describes.
pub struct Transaction<'db> {
    engine_tx: Box<dyn EngineTransaction + 'db>,
    writable: bool,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(engine_tx: Box<dyn EngineTransaction + 'db>, writable: bool) -> Self {
        Self {
            engine_tx,
            writable,
        }
    }

    /// Returns true when the transaction accepts writes.
    #[must_use]
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// Atomically applies every effect of this transaction: data, index
    /// entries and catalog changes together.
    ///
    /// # Errors
    ///
    /// Propagates the engine's commit failure modes.
    pub fn commit(self) -> CoreResult<()> {
        self.engine_tx.commit()?;
        Ok(())
    }

    /// Discards every effect of this transaction, including stores created
    /// by DDL.
    ///
    /// # Errors
    ///
    /// Propagates the engine's rollback failure modes.
    pub fn rollback(self) -> CoreResult<()> {
        self.engine_tx.rollback()?;
        Ok(())
    }

    /// Creates a table with an optional configuration.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ReservedName`] for names starting with the internal
    ///   prefix
    /// - [`CoreError::TableAlreadyExists`] when the name is taken
    pub fn create_table(&self, name: &str, config: Option<TableConfig>) -> CoreResult<()> {
        if name.starts_with(RESERVED_PREFIX) {
            return Err(CoreError::reserved_name(name));
        }
        let mut catalog = self.store(TABLE_CATALOG_STORE)?;
        if catalog.get(name.as_bytes())?.is_some() {
            return Err(CoreError::table_already_exists(name));
        }

        let config = config.unwrap_or_default();
        catalog.put(name.as_bytes(), &encode_config(&config)?)?;
        self.engine_tx.create_store(name)?;
        tracing::debug!(table = name, "created table");
        Ok(())
    }

    /// Returns a handle on an existing table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] when the table is absent.
    pub fn get_table(&self, name: &str) -> CoreResult<Table<'_>> {
        let config = self.table_config(name)?;
        let store = self.engine_tx.store(name)?;
        Ok(Table::new(self, name, config, store))
    }

    /// Drops a table, its data store, and every index defined on it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] when the table is absent.
    pub fn drop_table(&self, name: &str) -> CoreResult<()> {
        let mut catalog = self.store(TABLE_CATALOG_STORE)?;
        if catalog.get(name.as_bytes())?.is_none() {
            return Err(CoreError::table_not_found(name));
        }

        for config in self.table_index_configs(name)? {
            self.drop_index(&config.index_name)?;
        }
        self.engine_tx.drop_store(name)?;
        catalog.delete(name.as_bytes())?;
        tracing::debug!(table = name, "dropped table");
        Ok(())
    }

    /// Returns every table name, in ascending order.
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub fn list_tables(&self) -> CoreResult<Vec<String>> {
        let catalog = self.store(TABLE_CATALOG_STORE)?;
        let mut names = Vec::new();
        for (key, _) in catalog.ascend_greater_or_equal(None)? {
            let name = String::from_utf8(key)
                .map_err(|_| CoreError::corruption("table name is not UTF-8"))?;
            names.push(name);
        }
        Ok(names)
    }

    /// Creates an index on an existing table.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TableNotFound`] when the target table is absent
    /// - [`CoreError::IndexAlreadyExists`] when the name is taken
    pub fn create_index(&self, config: IndexConfig) -> CoreResult<()> {
        self.table_config(&config.table_name)?;

        let mut catalog = self.store(INDEX_CATALOG_STORE)?;
        if catalog.get(config.index_name.as_bytes())?.is_some() {
            return Err(CoreError::index_already_exists(&config.index_name));
        }
        catalog.put(config.index_name.as_bytes(), &encode_config(&config)?)?;
        self.engine_tx
            .create_store(&index_store_name(&config.index_name))?;
        tracing::debug!(
            index = %config.index_name,
            table = %config.table_name,
            "created index"
        );
        Ok(())
    }

    /// Drops an index and its store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexNotFound`] when the index is absent.
    pub fn drop_index(&self, name: &str) -> CoreResult<()> {
        let mut catalog = self.store(INDEX_CATALOG_STORE)?;
        if catalog.get(name.as_bytes())?.is_none() {
            return Err(CoreError::index_not_found(name));
        }
        self.engine_tx.drop_store(&index_store_name(name))?;
        catalog.delete(name.as_bytes())?;
        tracing::debug!(index = name, "dropped index");
        Ok(())
    }

    /// Returns a handle on an existing index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexNotFound`] when the index is absent.
    pub fn get_index(&self, name: &str) -> CoreResult<Index<'_>> {
        let config = self.index_config(name)?;
        self.index_from_config(&config)
    }

    /// Rebuilds one index from its owning table.
    ///
    /// The index store is truncated, then every row contributes one entry:
    /// the value at the indexed path, or null when the row does not carry
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexNotFound`] when the index is absent.
    pub fn re_index(&self, name: &str) -> CoreResult<()> {
        let config = self.index_config(name)?;
        let mut index = self.index_from_config(&config)?;
        index.truncate()?;

        let table = self.get_table(&config.table_name)?;
        table.iterate(|doc| {
            let value = match config.path.get_value(&doc) {
                Ok(value) => value,
                Err(DocumentError::FieldNotFound) => Value::Null,
                Err(err) => return Err(err.into()),
            };
            index.set(&value, doc.key())
        })?;
        tracing::debug!(index = name, "rebuilt index");
        Ok(())
    }

    /// Rebuilds every index in the database.
    ///
    /// # Errors
    ///
    /// Propagates the first rebuild failure.
    pub fn re_index_all(&self) -> CoreResult<()> {
        for config in self.all_index_configs()? {
            self.re_index(&config.index_name)?;
        }
        Ok(())
    }

    /// Returns the configs of every index defined on `table`.
    pub(crate) fn table_index_configs(&self, table: &str) -> CoreResult<Vec<IndexConfig>> {
        Ok(self
            .all_index_configs()?
            .into_iter()
            .filter(|config| config.table_name == table)
            .collect())
    }

    /// Opens the store of a configured index.
    pub(crate) fn index_from_config(&self, config: &IndexConfig) -> CoreResult<Index<'_>> {
        let store = self
            .engine_tx
            .store(&index_store_name(&config.index_name))?;
        Ok(Index::new(store, config.index_type, config.unique))
    }

    fn store(&self, name: &str) -> CoreResult<Box<dyn Store + '_>> {
        Ok(self.engine_tx.store(name)?)
    }

    fn table_config(&self, name: &str) -> CoreResult<TableConfig> {
        let catalog = self.store(TABLE_CATALOG_STORE)?;
        let bytes = catalog
            .get(name.as_bytes())?
            .ok_or_else(|| CoreError::table_not_found(name))?;
        decode_config(&bytes)
    }

    fn index_config(&self, name: &str) -> CoreResult<IndexConfig> {
        let catalog = self.store(INDEX_CATALOG_STORE)?;
        let bytes = catalog
            .get(name.as_bytes())?
            .ok_or_else(|| CoreError::index_not_found(name))?;
        decode_config(&bytes)
    }

    fn all_index_configs(&self) -> CoreResult<Vec<IndexConfig>> {
        let catalog = self.store(INDEX_CATALOG_STORE)?;
        let mut configs = Vec::new();
        for (_, bytes) in catalog.ascend_greater_or_equal(None)? {
            configs.push(decode_config(&bytes)?);
        }
        Ok(configs)
    }
}

fn encode_config<T: serde::Serialize>(config: &T) -> CoreResult<Vec<u8>> {
    serde_json::to_vec(config).map_err(|err| CoreError::corruption(err.to_string()))
}

fn decode_config<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> CoreResult<T> {
    serde_json::from_slice(bytes).map_err(|err| CoreError::corruption(err.to_string()))
}
