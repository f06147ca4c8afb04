//! Decoding of the canonical binary encoding.

use crate::document::{Document, FieldBuffer, ValueBuffer};
use crate::encoder::MAX_DEPTH;
use crate::error::{DocumentError, DocumentResult};
use crate::value::{Value, ValueType};

/// Decodes a boolean payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length or byte.
pub fn decode_bool(data: &[u8]) -> DocumentResult<bool> {
    match data {
        [0] => Ok(false),
        [1] => Ok(true),
        _ => Err(DocumentError::corruption("invalid bool payload")),
    }
}

/// Decodes an `i8` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_i8(data: &[u8]) -> DocumentResult<i8> {
    let b = fixed::<1>(data, "int8")?;
    Ok((b[0] ^ 0x80) as i8)
}

/// Decodes an `i16` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_i16(data: &[u8]) -> DocumentResult<i16> {
    let b = fixed::<2>(data, "int16")?;
    Ok((u16::from_be_bytes(b) ^ 0x8000) as i16)
}

/// Decodes an `i32` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_i32(data: &[u8]) -> DocumentResult<i32> {
    let b = fixed::<4>(data, "int32")?;
    Ok((u32::from_be_bytes(b) ^ 0x8000_0000) as i32)
}

/// Decodes an `i64` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_i64(data: &[u8]) -> DocumentResult<i64> {
    let b = fixed::<8>(data, "int64")?;
    Ok((u64::from_be_bytes(b) ^ (1 << 63)) as i64)
}

/// Decodes a `u8` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_u8(data: &[u8]) -> DocumentResult<u8> {
    Ok(fixed::<1>(data, "uint8")?[0])
}

/// Decodes a `u16` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_u16(data: &[u8]) -> DocumentResult<u16> {
    Ok(u16::from_be_bytes(fixed::<2>(data, "uint16")?))
}

/// Decodes a `u32` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_u32(data: &[u8]) -> DocumentResult<u32> {
    Ok(u32::from_be_bytes(fixed::<4>(data, "uint32")?))
}

/// Decodes a `u64` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_u64(data: &[u8]) -> DocumentResult<u64> {
    Ok(u64::from_be_bytes(fixed::<8>(data, "uint64")?))
}

/// Decodes an `f64` payload.
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for a wrong length.
pub fn decode_f64(data: &[u8]) -> DocumentResult<f64> {
    let bits = u64::from_be_bytes(fixed::<8>(data, "float64")?);
    let sign = 1u64 << 63;
    let mapped = if bits & sign != 0 { bits ^ sign } else { !bits };
    Ok(f64::from_bits(mapped))
}

fn fixed<const N: usize>(data: &[u8], what: &str) -> DocumentResult<[u8; N]> {
    data.try_into()
        .map_err(|_| DocumentError::corruption(format!("invalid {what} payload length")))
}

/// Decodes a value payload of the given type.
///
/// This is the inverse of [`encode_value`](crate::encoder::encode_value).
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for malformed payloads, unknown
/// tags in container frames, or nesting beyond the depth limit.
pub fn decode_value(value_type: ValueType, data: &[u8]) -> DocumentResult<Value> {
    decode_value_at(value_type, data, 0)
}

fn decode_value_at(value_type: ValueType, data: &[u8], depth: usize) -> DocumentResult<Value> {
    if depth > MAX_DEPTH {
        return Err(DocumentError::corruption(format!(
            "nesting deeper than {MAX_DEPTH} levels"
        )));
    }

    Ok(match value_type {
        ValueType::Null => {
            if !data.is_empty() {
                return Err(DocumentError::corruption("null payload must be empty"));
            }
            Value::Null
        }
        ValueType::Bool => Value::Bool(decode_bool(data)?),
        ValueType::Int8 => Value::Int8(decode_i8(data)?),
        ValueType::Int16 => Value::Int16(decode_i16(data)?),
        ValueType::Int32 => Value::Int32(decode_i32(data)?),
        ValueType::Int64 => Value::Int64(decode_i64(data)?),
        ValueType::Int => Value::Int(decode_i64(data)?),
        ValueType::Uint8 => Value::Uint8(decode_u8(data)?),
        ValueType::Uint16 => Value::Uint16(decode_u16(data)?),
        ValueType::Uint32 => Value::Uint32(decode_u32(data)?),
        ValueType::Uint64 => Value::Uint64(decode_u64(data)?),
        ValueType::Uint => Value::Uint(decode_u64(data)?),
        ValueType::Float64 => Value::Float64(decode_f64(data)?),
        ValueType::Text => Value::Text(
            std::str::from_utf8(data)
                .map_err(|_| DocumentError::corruption("text payload is not UTF-8"))?
                .to_string(),
        ),
        ValueType::Bytes => Value::Bytes(data.to_vec()),
        ValueType::Array => Value::Array(decode_array_body(data, depth)?),
        ValueType::Document => Value::Document(decode_document_body(data, depth)?),
    })
}

fn decode_array_body(data: &[u8], depth: usize) -> DocumentResult<ValueBuffer> {
    let mut reader = FrameReader::new(data);
    let mut buf = ValueBuffer::new();
    while !reader.is_empty() {
        let tag = reader.read_tag()?;
        let payload = reader.read_frame()?;
        buf.append(decode_value_at(tag, payload, depth + 1)?);
    }
    Ok(buf)
}

fn decode_document_body(data: &[u8], depth: usize) -> DocumentResult<FieldBuffer> {
    let mut reader = FrameReader::new(data);
    let mut buf = FieldBuffer::new();
    while !reader.is_empty() {
        let name = reader.read_name()?;
        let tag = reader.read_tag()?;
        let payload = reader.read_frame()?;
        buf.add(name, decode_value_at(tag, payload, depth + 1)?);
    }
    Ok(buf)
}

/// Decodes a full document body into a [`FieldBuffer`].
///
/// # Errors
///
/// Returns [`DocumentError::Corruption`] for malformed bytes.
pub fn decode_document(data: &[u8]) -> DocumentResult<FieldBuffer> {
    decode_document_body(data, 0)
}

/// A lazy [`Document`] view over a canonical encoded body.
///
/// Field lookup walks the frames and decodes only the matching payload, so
/// reading one field of a large row does not materialize the rest.
#[derive(Debug, Clone, Copy)]
pub struct EncodedDocument<'a> {
    data: &'a [u8],
}

impl<'a> EncodedDocument<'a> {
    /// Wraps an encoded document body.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Decodes the whole body into an owned [`FieldBuffer`].
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Corruption`] for malformed bytes.
    pub fn to_field_buffer(&self) -> DocumentResult<FieldBuffer> {
        decode_document(self.data)
    }
}

impl Document for EncodedDocument<'_> {
    fn iterate(
        &self,
        visit: &mut dyn FnMut(&str, Value) -> DocumentResult<()>,
    ) -> DocumentResult<()> {
        let mut reader = FrameReader::new(self.data);
        while !reader.is_empty() {
            let name = reader.read_name()?;
            let tag = reader.read_tag()?;
            let payload = reader.read_frame()?;
            visit(name, decode_value_at(tag, payload, 1)?)?;
        }
        Ok(())
    }

    fn get_by_field(&self, name: &str) -> DocumentResult<Value> {
        let mut reader = FrameReader::new(self.data);
        while !reader.is_empty() {
            let field = reader.read_name()?;
            let tag = reader.read_tag()?;
            let payload = reader.read_frame()?;
            if field == name {
                return decode_value_at(tag, payload, 1);
            }
        }
        Err(DocumentError::FieldNotFound)
    }
}

/// Sequential reader over length-prefixed frames.
struct FrameReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_bytes(&mut self, len: usize) -> DocumentResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| DocumentError::corruption("truncated frame"))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_len(&mut self) -> DocumentResult<usize> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().expect("4 bytes")) as usize)
    }

    fn read_tag(&mut self) -> DocumentResult<ValueType> {
        let byte = self.read_bytes(1)?[0];
        ValueType::from_tag(byte)
            .ok_or_else(|| DocumentError::corruption(format!("unknown type tag {byte:#04x}")))
    }

    fn read_name(&mut self) -> DocumentResult<&'a str> {
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map_err(|_| DocumentError::corruption("field name is not UTF-8"))
    }

    fn read_frame(&mut self) -> DocumentResult<&'a [u8]> {
        let len = self.read_len()?;
        self.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_document, encode_f64, encode_value};

    fn sample() -> FieldBuffer {
        let mut address = FieldBuffer::new();
        address.add("city", "Ajaccio");
        let mut friends = ValueBuffer::new();
        friends.append("fred").append("jamie");

        let mut buf = FieldBuffer::new();
        buf.add("name", "John");
        buf.add("age", Value::Uint16(10));
        buf.add("address", address);
        buf.add("friends", friends);
        buf.add("score", Value::Null);
        buf
    }

    #[test]
    fn document_round_trip() {
        let buf = sample();
        let encoded = encode_document(&buf).unwrap();
        let decoded = decode_document(&encoded).unwrap();
        assert_eq!(decoded, buf);
    }

    #[test]
    fn scalar_round_trips() {
        let values = [
            Value::Null,
            Value::Bool(true),
            Value::Int8(-3),
            Value::Int16(-300),
            Value::Int32(70_000),
            Value::Int64(-5_000_000_000),
            Value::int(42),
            Value::Uint8(255),
            Value::Uint16(65_535),
            Value::Uint32(4_000_000_000),
            Value::Uint64(u64::MAX),
            Value::uint(7),
            Value::Float64(-1.25),
            Value::from("hello"),
            Value::Bytes(vec![0, 1, 2]),
        ];
        for value in values {
            let encoded = encode_value(&value).unwrap();
            let decoded = decode_value(value.value_type(), &encoded).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn lazy_lookup_finds_fields() {
        let buf = sample();
        let encoded = encode_document(&buf).unwrap();
        let doc = EncodedDocument::new(&encoded);

        assert_eq!(doc.get_by_field("name").unwrap(), Value::from("John"));
        assert_eq!(doc.get_by_field("age").unwrap(), Value::Uint16(10));
        assert_eq!(doc.get_by_field("score").unwrap(), Value::Null);
        assert_eq!(
            doc.get_by_field("missing").unwrap_err(),
            DocumentError::FieldNotFound
        );
    }

    #[test]
    fn lazy_iterate_matches_source() {
        let buf = sample();
        let encoded = encode_document(&buf).unwrap();
        let doc = EncodedDocument::new(&encoded);

        let mut rebuilt = FieldBuffer::new();
        rebuilt.scan_document(&doc).unwrap();
        assert_eq!(rebuilt, buf);
    }

    #[test]
    fn unknown_tag_is_corruption() {
        // name "a" + bogus tag 0xee + empty payload
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.push(b'a');
        data.push(0xee);
        data.extend_from_slice(&0u32.to_be_bytes());

        assert!(matches!(
            decode_document(&data).unwrap_err(),
            DocumentError::Corruption { .. }
        ));
    }

    #[test]
    fn truncated_frame_is_corruption() {
        let buf = sample();
        let encoded = encode_document(&buf).unwrap();
        assert!(matches!(
            decode_document(&encoded[..encoded.len() - 2]).unwrap_err(),
            DocumentError::Corruption { .. }
        ));
    }

    #[test]
    fn float_decode_inverts_sign_trick() {
        for f in [-1.0, -0.0, 0.0, 1.0, f64::INFINITY, f64::NEG_INFINITY] {
            let decoded = decode_f64(&encode_f64(f)).unwrap();
            assert_eq!(decoded.to_bits(), f.to_bits());
        }
        assert!(decode_f64(&encode_f64(f64::NAN)).unwrap().is_nan());
    }
}
