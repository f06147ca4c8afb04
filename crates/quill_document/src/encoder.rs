//! Canonical order-preserving binary encoding.
//!
//! Every value maps to a byte string such that, for two values of the same
//! type, lexical comparison of the encodings matches the value order:
//!
//! - signed integers are big-endian with the sign bit flipped
//! - unsigned integers are plain big-endian
//! - floats use the IEEE sign trick: positive values flip only the sign
//!   bit, negative values flip every bit; NaN canonicalizes to a single
//!   bit pattern that sorts after positive infinity
//! - text and bytes are their raw bytes
//!
//! Containers do not need to be order-preserving; they are framed with the
//! one-byte type tag and a big-endian `u32` length so they can be walked
//! without decoding (see [`EncodedDocument`](crate::decoder::EncodedDocument)).

use crate::document::{Document, ValueBuffer};
use crate::error::{DocumentError, DocumentResult};
use crate::value::Value;

/// Maximum container nesting depth accepted by the encoder and decoder.
///
/// Deeper values are rejected as corrupt rather than risking stack
/// exhaustion on untrusted input.
pub const MAX_DEPTH: usize = 64;

const SIGN_BIT: u64 = 1 << 63;

/// Encodes a boolean as a single byte.
#[must_use]
pub fn encode_bool(v: bool) -> [u8; 1] {
    [u8::from(v)]
}

/// Encodes an `i8` so that lexical order matches numeric order.
#[must_use]
pub fn encode_i8(v: i8) -> [u8; 1] {
    [(v as u8) ^ 0x80]
}

/// Encodes an `i16` so that lexical order matches numeric order.
#[must_use]
pub fn encode_i16(v: i16) -> [u8; 2] {
    ((v as u16) ^ 0x8000).to_be_bytes()
}

/// Encodes an `i32` so that lexical order matches numeric order.
#[must_use]
pub fn encode_i32(v: i32) -> [u8; 4] {
    ((v as u32) ^ 0x8000_0000).to_be_bytes()
}

/// Encodes an `i64` so that lexical order matches numeric order.
#[must_use]
pub fn encode_i64(v: i64) -> [u8; 8] {
    ((v as u64) ^ SIGN_BIT).to_be_bytes()
}

/// Encodes a `u8` as is.
#[must_use]
pub fn encode_u8(v: u8) -> [u8; 1] {
    [v]
}

/// Encodes a `u16` big-endian.
#[must_use]
pub fn encode_u16(v: u16) -> [u8; 2] {
    v.to_be_bytes()
}

/// Encodes a `u32` big-endian.
#[must_use]
pub fn encode_u32(v: u32) -> [u8; 4] {
    v.to_be_bytes()
}

/// Encodes a `u64` big-endian.
#[must_use]
pub fn encode_u64(v: u64) -> [u8; 8] {
    v.to_be_bytes()
}

/// Encodes an `f64` so that lexical order matches the IEEE total order.
///
/// All NaN payloads canonicalize to one encoding that sorts after positive
/// infinity.
#[must_use]
pub fn encode_f64(v: f64) -> [u8; 8] {
    let v = if v.is_nan() { f64::NAN } else { v };
    let bits = v.to_bits();
    let mapped = if bits & SIGN_BIT == 0 {
        bits ^ SIGN_BIT
    } else {
        !bits
    };
    mapped.to_be_bytes()
}

/// Encodes the payload of a single value, without a type tag.
///
/// This is the bare scalar encoding used for primary keys; for containers
/// it produces the framed body.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] when nesting exceeds
/// [`MAX_DEPTH`].
pub fn encode_value(value: &Value) -> DocumentResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, 0)?;
    Ok(buf)
}

/// Encodes a document into its canonical framed body.
///
/// The result is the persisted row format; it can be read back lazily with
/// [`EncodedDocument`](crate::decoder::EncodedDocument).
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] when nesting exceeds
/// [`MAX_DEPTH`], and propagates any iteration error.
pub fn encode_document(doc: &dyn Document) -> DocumentResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_document_body(&mut buf, doc, 0)?;
    Ok(buf)
}

fn check_depth(depth: usize) -> DocumentResult<()> {
    if depth > MAX_DEPTH {
        return Err(DocumentError::corruption(format!(
            "nesting deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

fn write_value(buf: &mut Vec<u8>, value: &Value, depth: usize) -> DocumentResult<()> {
    check_depth(depth)?;
    match value {
        Value::Null => {}
        Value::Bool(b) => buf.extend_from_slice(&encode_bool(*b)),
        Value::Int8(n) => buf.extend_from_slice(&encode_i8(*n)),
        Value::Int16(n) => buf.extend_from_slice(&encode_i16(*n)),
        Value::Int32(n) => buf.extend_from_slice(&encode_i32(*n)),
        Value::Int64(n) | Value::Int(n) => buf.extend_from_slice(&encode_i64(*n)),
        Value::Uint8(n) => buf.extend_from_slice(&encode_u8(*n)),
        Value::Uint16(n) => buf.extend_from_slice(&encode_u16(*n)),
        Value::Uint32(n) => buf.extend_from_slice(&encode_u32(*n)),
        Value::Uint64(n) | Value::Uint(n) => buf.extend_from_slice(&encode_u64(*n)),
        Value::Float64(f) => buf.extend_from_slice(&encode_f64(*f)),
        Value::Text(s) => buf.extend_from_slice(s.as_bytes()),
        Value::Bytes(b) => buf.extend_from_slice(b),
        Value::Array(a) => write_array_body(buf, a, depth)?,
        Value::Document(d) => write_document_body(buf, d, depth)?,
    }
    Ok(())
}

fn write_len(buf: &mut Vec<u8>, len: usize) -> DocumentResult<()> {
    let len = u32::try_from(len)
        .map_err(|_| DocumentError::corruption("frame longer than u32::MAX"))?;
    buf.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

fn write_array_body(buf: &mut Vec<u8>, array: &ValueBuffer, depth: usize) -> DocumentResult<()> {
    check_depth(depth)?;
    for value in array.iter() {
        buf.push(value.value_type().tag());
        let payload = {
            let mut p = Vec::new();
            write_value(&mut p, value, depth + 1)?;
            p
        };
        write_len(buf, payload.len())?;
        buf.extend_from_slice(&payload);
    }
    Ok(())
}

fn write_document_body(buf: &mut Vec<u8>, doc: &dyn Document, depth: usize) -> DocumentResult<()> {
    check_depth(depth)?;
    doc.iterate(&mut |name, value| {
        write_len(buf, name.len())?;
        buf.extend_from_slice(name.as_bytes());
        buf.push(value.value_type().tag());
        let mut payload = Vec::new();
        write_value(&mut payload, &value, depth + 1)?;
        write_len(buf, payload.len())?;
        buf.extend_from_slice(&payload);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_value;
    use crate::document::FieldBuffer;
    use crate::value::ValueType;

    #[test]
    fn signed_encoding_orders() {
        let values = [i64::MIN, -1000, -1, 0, 1, 1000, i64::MAX];
        for pair in values.windows(2) {
            assert!(encode_i64(pair[0]) < encode_i64(pair[1]));
        }
        assert!(encode_i8(-1) < encode_i8(0));
        assert!(encode_i16(-300) < encode_i16(-299));
        assert!(encode_i32(i32::MIN) < encode_i32(i32::MAX));
    }

    #[test]
    fn unsigned_encoding_orders() {
        let values = [0u64, 1, 255, 256, u64::MAX];
        for pair in values.windows(2) {
            assert!(encode_u64(pair[0]) < encode_u64(pair[1]));
        }
    }

    #[test]
    fn float_encoding_orders() {
        let values = [
            f64::NEG_INFINITY,
            f64::MIN,
            -1.5,
            -0.0,
            0.0,
            f64::MIN_POSITIVE,
            1.5,
            f64::MAX,
            f64::INFINITY,
        ];
        for pair in values.windows(2) {
            assert!(
                encode_f64(pair[0]) < encode_f64(pair[1]),
                "{} should sort before {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn nan_is_canonical_and_last() {
        let quiet = encode_f64(f64::NAN);
        let weird = encode_f64(f64::from_bits(0xfff8_0000_0000_0001));
        assert_eq!(quiet, weird);
        assert!(encode_f64(f64::INFINITY) < quiet);
    }

    #[test]
    fn null_is_empty() {
        assert!(encode_value(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn bare_scalar_matches_encode_value() {
        assert_eq!(
            encode_value(&Value::Int32(10)).unwrap(),
            encode_i32(10).to_vec()
        );
        assert_eq!(
            encode_value(&Value::from("hey")).unwrap(),
            b"hey".to_vec()
        );
    }

    #[test]
    fn over_deep_nesting_is_rejected() {
        let mut value = Value::Document(FieldBuffer::new());
        for _ in 0..=MAX_DEPTH {
            let mut outer = FieldBuffer::new();
            outer.add("a", value);
            value = Value::Document(outer);
        }
        assert!(matches!(
            encode_value(&value).unwrap_err(),
            DocumentError::Corruption { .. }
        ));
    }

    #[test]
    fn array_frames_round_trip() {
        let mut array = ValueBuffer::new();
        array.append(Value::Int8(1)).append("two").append(Value::Null);
        let encoded = encode_value(&Value::Array(array.clone())).unwrap();
        let decoded = decode_value(ValueType::Array, &encoded).unwrap();
        assert_eq!(decoded, Value::Array(array));
    }
}
