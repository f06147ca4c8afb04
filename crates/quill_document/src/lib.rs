//! # QuillDB Document Model
//!
//! The typed value and document model at the heart of QuillDB.
//!
//! This crate provides:
//! - A self-describing [`Value`] taxonomy with a stable tag per type
//! - The [`Document`] and [`Array`] capabilities and their canonical
//!   in-memory buffers, [`FieldBuffer`] and [`ValueBuffer`]
//! - Dotted [`ValuePath`] addressing into nested values
//! - A canonical, order-preserving binary encoding with lazy decoded views
//! - JSON ingestion and JSON/CSV output adapters
//! - A serde bridge turning any host record shape into a document
//!
//! ## Ordering guarantee
//!
//! For two values of the same type, comparing their encodings bytewise is
//! the same as comparing the values:
//!
//! ```
//! use quill_document::{encoder, Value};
//!
//! let a = encoder::encode_value(&Value::Int64(-2)).unwrap();
//! let b = encoder::encode_value(&Value::Int64(3)).unwrap();
//! assert!(a < b);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod document;
mod error;
mod json;
mod path;
mod value;

pub mod decoder;
pub mod encoder;

pub use bridge::{to_document, to_value};
pub use decoder::{decode_document, decode_value, EncodedDocument};
pub use document::{from_map, Array, Document, FieldBuffer, ValueBuffer};
pub use encoder::{encode_document, encode_value, MAX_DEPTH};
pub use error::{DocumentError, DocumentResult};
pub use json::{
    iterator_to_csv, iterator_to_json, iterator_to_json_array, parse_json, parse_json_value,
    to_json,
};
pub use path::ValuePath;
pub use value::{Value, ValueType};
