//! Engine trait definitions.
//!
//! The storage engine is an abstract two-level key/value contract:
//! an [`Engine`] begins [`EngineTransaction`]s, and a transaction exposes
//! named [`Store`]s. Engines are **opaque byte stores**: they never
//! interpret keys or values, and every higher-level format decision
//! (document encoding, index key layout, catalog payloads) belongs to the
//! layers above.

use crate::error::EngineResult;

/// A cursor over `(key, value)` pairs in key order.
pub type KvCursor<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// A storage engine.
///
/// # Invariants
///
/// - A read-only transaction observes a consistent snapshot taken at
///   `begin`.
/// - At most one writable transaction exists at a time; `begin(true)`
///   blocks until the writer slot is free.
/// - `commit` applies every effect of the transaction atomically across
///   all stores; `rollback` discards all of them.
///
/// # Implementors
///
/// - [`MemoryEngine`](crate::MemoryEngine) — the reference in-memory
///   engine. On-disk engines plug in by implementing the same contract.
pub trait Engine: Send + Sync {
    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EngineClosed`](crate::EngineError::EngineClosed)
    /// after `close`.
    fn begin(&self, writable: bool) -> EngineResult<Box<dyn EngineTransaction + '_>>;

    /// Closes the engine. Transactions begun afterwards fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot release its resources.
    fn close(&self) -> EngineResult<()>;
}

/// A transaction over an engine.
///
/// Store handles borrow the transaction immutably so a caller can hold
/// several at once (a table and its indexes); implementations use interior
/// mutability. After `commit` or `rollback`, every handle derived from the
/// transaction is invalid and fails with
/// [`EngineError::TransactionDiscarded`](crate::EngineError::TransactionDiscarded).
pub trait EngineTransaction {
    /// Creates a new empty store.
    ///
    /// # Errors
    ///
    /// Fails with `StoreAlreadyExists` when the name is taken and
    /// `ReadOnlyTransaction` on a read-only transaction.
    fn create_store(&self, name: &str) -> EngineResult<()>;

    /// Returns a handle on an existing store.
    ///
    /// # Errors
    ///
    /// Fails with `StoreNotFound` when the store does not exist.
    fn store(&self, name: &str) -> EngineResult<Box<dyn Store + '_>>;

    /// Removes a store and all its contents.
    ///
    /// # Errors
    ///
    /// Fails with `StoreNotFound` when the store does not exist and
    /// `ReadOnlyTransaction` on a read-only transaction.
    fn drop_store(&self, name: &str) -> EngineResult<()>;

    /// Returns the names of all stores, in ascending order.
    ///
    /// # Errors
    ///
    /// Fails with `TransactionDiscarded` after commit or rollback.
    fn store_names(&self) -> EngineResult<Vec<String>>;

    /// Atomically applies every effect of this transaction.
    ///
    /// # Errors
    ///
    /// Fails with `ReadOnlyTransaction` on a read-only transaction and
    /// `TransactionDiscarded` when already finished.
    fn commit(self: Box<Self>) -> EngineResult<()>;

    /// Discards every effect of this transaction.
    ///
    /// # Errors
    ///
    /// Fails with `TransactionDiscarded` when already finished.
    fn rollback(self: Box<Self>) -> EngineResult<()>;
}

/// A named key/value namespace within a transaction.
pub trait Store: std::fmt::Debug {
    /// Returns the value stored under `key`, or `None`.
    ///
    /// # Errors
    ///
    /// Fails with `TransactionDiscarded` after the transaction finished.
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Fails with `ReadOnlyTransaction` on a read-only transaction.
    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Removes the entry under `key`.
    ///
    /// # Errors
    ///
    /// Fails with `KeyNotFound` when the key is absent.
    fn delete(&mut self, key: &[u8]) -> EngineResult<()>;

    /// Removes every entry.
    ///
    /// The store's sequence counter is not reset.
    ///
    /// # Errors
    ///
    /// Fails with `ReadOnlyTransaction` on a read-only transaction.
    fn truncate(&mut self) -> EngineResult<()>;

    /// Returns the next value of this store's monotonic counter.
    ///
    /// # Errors
    ///
    /// Fails with `ReadOnlyTransaction` on a read-only transaction.
    fn next_sequence(&mut self) -> EngineResult<u64>;

    /// Returns a cursor over entries with keys `>=` the pivot, ascending.
    /// A `None` pivot starts at the first key.
    ///
    /// # Errors
    ///
    /// Fails with `TransactionDiscarded` after the transaction finished.
    fn ascend_greater_or_equal(&self, pivot: Option<&[u8]>) -> EngineResult<KvCursor<'_>>;

    /// Returns a cursor over entries with keys `<=` the pivot, descending.
    /// A `None` pivot starts at the last key.
    ///
    /// # Errors
    ///
    /// Fails with `TransactionDiscarded` after the transaction finished.
    fn descend_less_or_equal(&self, pivot: Option<&[u8]>) -> EngineResult<KvCursor<'_>>;
}
