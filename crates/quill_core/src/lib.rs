//! # QuillDB Core
//!
//! The database core of QuillDB: tables, secondary indexes, transactions
//! and the system catalog, built on the abstract key/value engine from
//! `quill_engine` and the document model from `quill_document`.
//!
//! A [`Database`] wraps an engine. Transactions create tables and indexes
//! whose configurations persist in two catalog stores, hand out [`Table`]
//! and [`Index`] handles, and commit or roll back every effect — data,
//! index entries and catalog — atomically through the engine transaction.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod index;
mod table;
mod transaction;

pub use config::{FieldConstraint, IndexConfig, TableConfig};
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use index::{Index, Pivot};
pub use table::{KeyedDocument, StoredDocument, Table};
pub use transaction::Transaction;
