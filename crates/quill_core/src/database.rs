//! Database facade.

use crate::error::CoreResult;
use crate::transaction::{Transaction, INDEX_CATALOG_STORE, TABLE_CATALOG_STORE};
use quill_engine::{Engine, EngineError};

/// The main database handle.
///
/// A `Database` owns a storage engine and hands out [`Transaction`]s.
/// Opening it creates the two catalog stores when they do not exist yet.
///
/// # Example
///
/// ```
/// use quill_core::Database;
/// use quill_document::parse_json;
/// use quill_engine::MemoryEngine;
///
/// let db = Database::new(MemoryEngine::new()).unwrap();
/// db.update(|tx| {
///     tx.create_table("users", None)?;
///     let mut users = tx.get_table("users")?;
///     users.insert(&parse_json(r#"{"name": "Asta"}"#).unwrap())?;
///     Ok(())
/// })
/// .unwrap();
/// ```
pub struct Database {
    engine: Box<dyn Engine>,
}

impl Database {
    /// Opens a database over the given engine.
    ///
    /// # Errors
    ///
    /// Propagates engine failures while preparing the catalog stores.
    pub fn new(engine: impl Engine + 'static) -> CoreResult<Self> {
        let db = Self {
            engine: Box::new(engine),
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> CoreResult<()> {
        let tx = self.engine.begin(true)?;
        for name in [TABLE_CATALOG_STORE, INDEX_CATALOG_STORE] {
            match tx.create_store(name) {
                Ok(()) | Err(EngineError::StoreAlreadyExists { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Begins a transaction. Only one writable transaction exists at a
    /// time; beginning a second one blocks until the first finishes.
    ///
    /// # Errors
    ///
    /// Propagates engine failures.
    pub fn begin(&self, writable: bool) -> CoreResult<Transaction<'_>> {
        let engine_tx = self.engine.begin(writable)?;
        Ok(Transaction::new(engine_tx, writable))
    }

    /// Runs `f` inside a read-only transaction.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error.
    pub fn view<F, R>(&self, f: F) -> CoreResult<R>
    where
        F: FnOnce(&Transaction<'_>) -> CoreResult<R>,
    {
        let tx = self.begin(false)?;
        let result = f(&tx)?;
        tx.rollback()?;
        Ok(result)
    }

    /// Runs `f` inside a writable transaction, committing on success and
    /// rolling back on error.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error, or the commit failure.
    pub fn update<F, R>(&self, f: F) -> CoreResult<R>
    where
        F: FnOnce(&Transaction<'_>) -> CoreResult<R>,
    {
        let tx = self.begin(true)?;
        match f(&tx) {
            Ok(result) => {
                tx.commit()?;
                Ok(result)
            }
            Err(err) => {
                let _ = tx.rollback();
                Err(err)
            }
        }
    }

    /// Closes the underlying engine. Transactions begun afterwards fail.
    ///
    /// # Errors
    ///
    /// Propagates engine failures.
    pub fn close(self) -> CoreResult<()> {
        self.engine.close()?;
        Ok(())
    }
}
