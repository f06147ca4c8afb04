//! Benchmark utilities.

use quill_document::{FieldBuffer, Value};

/// Builds a flat document with `fields` integer fields.
#[must_use]
pub fn flat_document(fields: usize) -> FieldBuffer {
    let mut buf = FieldBuffer::new();
    for i in 0..fields {
        buf.add(format!("name-{i}"), Value::Int64(i as i64));
    }
    buf
}

/// Builds a nested document of the given depth and width.
#[must_use]
pub fn nested_document(depth: usize, width: usize) -> FieldBuffer {
    let mut buf = FieldBuffer::new();
    for i in 0..width {
        let value = if depth == 0 {
            Value::from("leaf")
        } else {
            Value::Document(nested_document(depth - 1, width))
        };
        buf.add(format!("key_{i}"), value);
    }
    buf
}
