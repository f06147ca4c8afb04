//! Error types for the engine crate.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by engines, transactions and stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The named store does not exist in this transaction's view.
    #[error("store not found: {name}")]
    StoreNotFound {
        /// Name of the missing store.
        name: String,
    },

    /// A store with this name already exists.
    #[error("store already exists: {name}")]
    StoreAlreadyExists {
        /// Name of the conflicting store.
        name: String,
    },

    /// The key is absent from the store.
    #[error("key not found")]
    KeyNotFound,

    /// The transaction was already committed or rolled back.
    #[error("transaction has been discarded")]
    TransactionDiscarded,

    /// A write was attempted through a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnlyTransaction,

    /// The engine was closed.
    #[error("engine is closed")]
    EngineClosed,
}

impl EngineError {
    /// Creates a store-not-found error.
    pub fn store_not_found(name: impl Into<String>) -> Self {
        Self::StoreNotFound { name: name.into() }
    }

    /// Creates a store-already-exists error.
    pub fn store_already_exists(name: impl Into<String>) -> Self {
        Self::StoreAlreadyExists { name: name.into() }
    }
}
