//! # QuillDB Engine
//!
//! Abstract key/value storage contract for QuillDB.
//!
//! This crate defines the three-level engine boundary — [`Engine`] →
//! [`EngineTransaction`] → [`Store`] — and ships [`MemoryEngine`], the
//! reference in-memory implementation used by tests and ephemeral
//! databases. On-disk engines plug in by implementing the same traits.
//!
//! Engines never interpret bytes: key encodings, document formats and
//! catalog payloads are all decided by the layers above.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod memory;

pub use engine::{Engine, EngineTransaction, KvCursor, Store};
pub use error::{EngineError, EngineResult};
pub use memory::MemoryEngine;
