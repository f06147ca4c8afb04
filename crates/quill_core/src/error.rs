//! Error types for QuillDB core.

use quill_document::DocumentError;
use quill_engine::EngineError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in table, index and catalog operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Document model error.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Storage engine error.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The named table is not in the catalog.
    #[error("table not found: {name}")]
    TableNotFound {
        /// Name of the missing table.
        name: String,
    },

    /// A table with this name already exists.
    #[error("table already exists: {name}")]
    TableAlreadyExists {
        /// Name of the conflicting table.
        name: String,
    },

    /// The named index is not in the catalog.
    #[error("index not found: {name}")]
    IndexNotFound {
        /// Name of the missing index.
        name: String,
    },

    /// An index with this name already exists.
    #[error("index already exists: {name}")]
    IndexAlreadyExists {
        /// Name of the conflicting index.
        name: String,
    },

    /// The key is absent from the table.
    #[error("document not found")]
    DocumentNotFound,

    /// An insert produced a key that already exists.
    #[error("duplicate document")]
    DuplicateDocument,

    /// A unique index already holds this value.
    #[error("duplicate index entry")]
    DuplicateIndex,

    /// The primary key field is absent or empty.
    #[error("missing or empty primary key")]
    MissingPrimaryKey,

    /// A declared field constraint could not be applied.
    #[error("field constraint on `{path}` violated: {source}")]
    ConstraintViolation {
        /// Dotted path of the constrained field.
        path: String,
        /// The conversion failure.
        source: DocumentError,
    },

    /// The name uses the reserved internal prefix.
    #[error("name is reserved: {name}")]
    ReservedName {
        /// The offending name.
        name: String,
    },

    /// Persisted catalog bytes were rejected.
    #[error("corrupted catalog entry: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a table-not-found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    /// Creates a table-already-exists error.
    pub fn table_already_exists(name: impl Into<String>) -> Self {
        Self::TableAlreadyExists { name: name.into() }
    }

    /// Creates an index-not-found error.
    pub fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound { name: name.into() }
    }

    /// Creates an index-already-exists error.
    pub fn index_already_exists(name: impl Into<String>) -> Self {
        Self::IndexAlreadyExists { name: name.into() }
    }

    /// Creates a constraint violation error.
    pub fn constraint_violation(path: impl Into<String>, source: DocumentError) -> Self {
        Self::ConstraintViolation {
            path: path.into(),
            source,
        }
    }

    /// Creates a reserved-name error.
    pub fn reserved_name(name: impl Into<String>) -> Self {
        Self::ReservedName { name: name.into() }
    }

    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
