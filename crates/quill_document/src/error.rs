//! Error types for the document crate.

use thiserror::Error;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors that can occur while building, addressing, converting or
/// (de)serializing documents and values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A requested field or array index is absent.
    #[error("field not found")]
    FieldNotFound,

    /// JSON or path text could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// Persisted bytes were rejected by the decoder.
    #[error("corrupted encoding: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// A value could not be converted to the requested type.
    #[error("cannot convert {from} to {to}")]
    InvalidConversion {
        /// Name of the source type.
        from: &'static str,
        /// Name of the target type.
        to: &'static str,
    },

    /// A host value could not be represented as a document.
    #[error("cannot build a document: {message}")]
    NotADocument {
        /// Description of the offending shape.
        message: String,
    },

    /// Writing serialized output failed.
    #[error("I/O error: {message}")]
    Io {
        /// Stringified source error.
        message: String,
    },
}

impl From<std::io::Error> for DocumentError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl DocumentError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an invalid conversion error.
    pub fn invalid_conversion(from: &'static str, to: &'static str) -> Self {
        Self::InvalidConversion { from, to }
    }

    /// Creates a not-a-document error.
    pub fn not_a_document(message: impl Into<String>) -> Self {
        Self::NotADocument {
            message: message.into(),
        }
    }
}
