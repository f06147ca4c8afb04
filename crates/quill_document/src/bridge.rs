//! Bridge from host data shapes into documents.
//!
//! Any type implementing `serde::Serialize` can be turned into a document:
//! struct fields become document fields in declaration order, scalar widths
//! carry over one to one, `Option::None` becomes Null and sequences become
//! arrays. The usual serde attributes drive naming: `#[serde(rename)]`
//! renames a field and `#[serde(skip)]` drops it.

use crate::document::{FieldBuffer, ValueBuffer};
use crate::error::{DocumentError, DocumentResult};
use crate::value::Value;
use serde::ser::{self, Serialize};
use std::fmt;

impl ser::Error for DocumentError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DocumentError::not_a_document(msg.to_string())
    }
}

/// Builds a document from any serializable record shape.
///
/// The top-level value must serialize as a struct or map; scalars and
/// sequences are rejected because a document is a named collection.
///
/// # Errors
///
/// Returns [`DocumentError::NotADocument`] when the value does not
/// serialize to a document shape.
pub fn to_document<T: Serialize>(value: &T) -> DocumentResult<FieldBuffer> {
    match to_value(value)? {
        Value::Document(buf) => Ok(buf),
        other => Err(DocumentError::not_a_document(format!(
            "expected a record shape, got {}",
            other.value_type()
        ))),
    }
}

/// Converts any serializable host value into a [`Value`].
///
/// # Errors
///
/// Returns [`DocumentError::NotADocument`] for shapes the value model
/// cannot express (for example maps with non-string keys).
pub fn to_value<T: Serialize>(value: &T) -> DocumentResult<Value> {
    value.serialize(ValueSerializer)
}

/// serde serializer producing a [`Value`].
struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = DocumentError;

    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = VariantSeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = VariantStructSerializer;

    fn serialize_bool(self, v: bool) -> DocumentResult<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> DocumentResult<Value> {
        Ok(Value::Int8(v))
    }

    fn serialize_i16(self, v: i16) -> DocumentResult<Value> {
        Ok(Value::Int16(v))
    }

    fn serialize_i32(self, v: i32) -> DocumentResult<Value> {
        Ok(Value::Int32(v))
    }

    fn serialize_i64(self, v: i64) -> DocumentResult<Value> {
        Ok(Value::Int64(v))
    }

    fn serialize_u8(self, v: u8) -> DocumentResult<Value> {
        Ok(Value::Uint8(v))
    }

    fn serialize_u16(self, v: u16) -> DocumentResult<Value> {
        Ok(Value::Uint16(v))
    }

    fn serialize_u32(self, v: u32) -> DocumentResult<Value> {
        Ok(Value::Uint32(v))
    }

    fn serialize_u64(self, v: u64) -> DocumentResult<Value> {
        Ok(Value::Uint64(v))
    }

    fn serialize_f32(self, v: f32) -> DocumentResult<Value> {
        Ok(Value::Float64(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> DocumentResult<Value> {
        Ok(Value::Float64(v))
    }

    fn serialize_char(self, v: char) -> DocumentResult<Value> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> DocumentResult<Value> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> DocumentResult<Value> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> DocumentResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> DocumentResult<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> DocumentResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> DocumentResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> DocumentResult<Value> {
        Ok(Value::Text(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> DocumentResult<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> DocumentResult<Value> {
        let mut buf = FieldBuffer::new();
        buf.add(variant, value.serialize(ValueSerializer)?);
        Ok(Value::Document(buf))
    }

    fn serialize_seq(self, len: Option<usize>) -> DocumentResult<Self::SerializeSeq> {
        let _ = len;
        Ok(SeqSerializer {
            values: ValueBuffer::new(),
        })
    }

    fn serialize_tuple(self, len: usize) -> DocumentResult<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> DocumentResult<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> DocumentResult<Self::SerializeTupleVariant> {
        Ok(VariantSeqSerializer {
            variant,
            values: ValueBuffer::new(),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> DocumentResult<Self::SerializeMap> {
        Ok(MapSerializer {
            fields: FieldBuffer::new(),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> DocumentResult<Self::SerializeStruct> {
        Ok(StructSerializer {
            fields: FieldBuffer::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> DocumentResult<Self::SerializeStructVariant> {
        Ok(VariantStructSerializer {
            variant,
            fields: FieldBuffer::new(),
        })
    }
}

struct SeqSerializer {
    values: ValueBuffer,
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Value;
    type Error = DocumentError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> DocumentResult<()> {
        self.values.append(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> DocumentResult<Value> {
        Ok(Value::Array(self.values))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Value;
    type Error = DocumentError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> DocumentResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> DocumentResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Value;
    type Error = DocumentError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> DocumentResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> DocumentResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

struct VariantSeqSerializer {
    variant: &'static str,
    values: ValueBuffer,
}

impl ser::SerializeTupleVariant for VariantSeqSerializer {
    type Ok = Value;
    type Error = DocumentError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> DocumentResult<()> {
        self.values.append(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> DocumentResult<Value> {
        let mut buf = FieldBuffer::new();
        buf.add(self.variant, Value::Array(self.values));
        Ok(Value::Document(buf))
    }
}

struct MapSerializer {
    fields: FieldBuffer,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = DocumentError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> DocumentResult<()> {
        match key.serialize(ValueSerializer)? {
            Value::Text(s) => {
                self.pending_key = Some(s);
                Ok(())
            }
            other => Err(DocumentError::not_a_document(format!(
                "map key must be a string, got {}",
                other.value_type()
            ))),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> DocumentResult<()> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| DocumentError::not_a_document("map value without a key"))?;
        self.fields.add(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> DocumentResult<Value> {
        Ok(Value::Document(self.fields))
    }
}

struct StructSerializer {
    fields: FieldBuffer,
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = Value;
    type Error = DocumentError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> DocumentResult<()> {
        self.fields.add(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> DocumentResult<Value> {
        Ok(Value::Document(self.fields))
    }
}

struct VariantStructSerializer {
    variant: &'static str,
    fields: FieldBuffer,
}

impl ser::SerializeStructVariant for VariantStructSerializer {
    type Ok = Value;
    type Error = DocumentError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> DocumentResult<()> {
        self.fields.add(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> DocumentResult<Value> {
        let mut buf = FieldBuffer::new();
        buf.add(self.variant, Value::Document(self.fields));
        Ok(Value::Document(buf))
    }
}
