//! Dynamic typed value.

use crate::document::{FieldBuffer, ValueBuffer};
use crate::error::{DocumentError, DocumentResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The type of a [`Value`].
///
/// Each type carries a stable one-byte tag used on the wire wherever
/// self-describing framing is required. The tag order doubles as the
/// cross-type comparison order: Null first, then Bool, the integer types,
/// Float64, Text, Bytes and finally the container types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    /// Absent value.
    Null = 1,
    /// Boolean.
    Bool = 2,
    /// 8-bit signed integer.
    Int8 = 3,
    /// 16-bit signed integer.
    Int16 = 4,
    /// 32-bit signed integer.
    Int32 = 5,
    /// 64-bit signed integer.
    Int64 = 6,
    /// Signed integer of unspecified width, stored as 64 bits.
    Int = 7,
    /// 8-bit unsigned integer.
    Uint8 = 8,
    /// 16-bit unsigned integer.
    Uint16 = 9,
    /// 32-bit unsigned integer.
    Uint32 = 10,
    /// 64-bit unsigned integer.
    Uint64 = 11,
    /// Unsigned integer of unspecified width, stored as 64 bits.
    Uint = 12,
    /// IEEE-754 double precision float.
    Float64 = 13,
    /// UTF-8 text.
    Text = 14,
    /// Raw bytes.
    Bytes = 15,
    /// Ordered sequence of values.
    Array = 16,
    /// Ordered sequence of named values.
    Document = 17,
}

impl ValueType {
    /// Returns the wire tag for this type.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns the type for a wire tag, if the tag is known.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => Self::Null,
            2 => Self::Bool,
            3 => Self::Int8,
            4 => Self::Int16,
            5 => Self::Int32,
            6 => Self::Int64,
            7 => Self::Int,
            8 => Self::Uint8,
            9 => Self::Uint16,
            10 => Self::Uint32,
            11 => Self::Uint64,
            12 => Self::Uint,
            13 => Self::Float64,
            14 => Self::Text,
            15 => Self::Bytes,
            16 => Self::Array,
            17 => Self::Document,
            _ => return None,
        })
    }

    /// Returns true for the integer and float types.
    #[must_use]
    pub const fn is_number(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Int
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
                | Self::Uint
                | Self::Float64
        )
    }

    /// Returns the human-readable name of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Int => "int",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uint => "uint",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Array => "array",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamic typed value.
///
/// `Value` is the tagged pair at the heart of the data model: every field of
/// a document and every element of an array is one of these. Containers nest
/// to arbitrary depth; the encoder bounds recursion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// Signed integer of unspecified width.
    Int(i64),
    /// 8-bit unsigned integer.
    Uint8(u8),
    /// 16-bit unsigned integer.
    Uint16(u16),
    /// 32-bit unsigned integer.
    Uint32(u32),
    /// 64-bit unsigned integer.
    Uint64(u64),
    /// Unsigned integer of unspecified width.
    Uint(u64),
    /// IEEE-754 double precision float.
    Float64(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Array(ValueBuffer),
    /// Ordered sequence of named values.
    Document(FieldBuffer),
}

/// Numeric payload of a value, unified for conversions and comparisons.
#[derive(Debug, Clone, Copy)]
enum Num {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Num {
    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        match self {
            Num::Signed(n) => n as f64,
            Num::Unsigned(n) => n as f64,
            Num::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Signed(n) => n == 0,
            Num::Unsigned(n) => n == 0,
            Num::Float(f) => f == 0.0,
        }
    }
}

impl Value {
    /// Creates a signed integer value of unspecified width.
    #[must_use]
    pub const fn int(n: i64) -> Self {
        Self::Int(n)
    }

    /// Creates an unsigned integer value of unspecified width.
    #[must_use]
    pub const fn uint(n: u64) -> Self {
        Self::Uint(n)
    }

    /// Returns the type of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Bool(_) => ValueType::Bool,
            Self::Int8(_) => ValueType::Int8,
            Self::Int16(_) => ValueType::Int16,
            Self::Int32(_) => ValueType::Int32,
            Self::Int64(_) => ValueType::Int64,
            Self::Int(_) => ValueType::Int,
            Self::Uint8(_) => ValueType::Uint8,
            Self::Uint16(_) => ValueType::Uint16,
            Self::Uint32(_) => ValueType::Uint32,
            Self::Uint64(_) => ValueType::Uint64,
            Self::Uint(_) => ValueType::Uint,
            Self::Float64(_) => ValueType::Float64,
            Self::Text(_) => ValueType::Text,
            Self::Bytes(_) => ValueType::Bytes,
            Self::Array(_) => ValueType::Array,
            Self::Document(_) => ValueType::Document,
        }
    }

    /// Check if this value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get this value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as text, if it is one.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as bytes, if it is a byte string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&ValueBuffer> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a document, if it is one.
    #[must_use]
    pub fn as_document(&self) -> Option<&FieldBuffer> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    fn as_num(&self) -> Option<Num> {
        match self {
            Self::Int8(n) => Some(Num::Signed(i64::from(*n))),
            Self::Int16(n) => Some(Num::Signed(i64::from(*n))),
            Self::Int32(n) => Some(Num::Signed(i64::from(*n))),
            Self::Int64(n) | Self::Int(n) => Some(Num::Signed(*n)),
            Self::Uint8(n) => Some(Num::Unsigned(u64::from(*n))),
            Self::Uint16(n) => Some(Num::Unsigned(u64::from(*n))),
            Self::Uint32(n) => Some(Num::Unsigned(u64::from(*n))),
            Self::Uint64(n) | Self::Uint(n) => Some(Num::Unsigned(*n)),
            Self::Float64(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    /// Returns the float interpretation of a numeric value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_num().map(Num::as_f64)
    }

    /// Compare two values with the documented total order.
    ///
    /// Integer pairs compare exactly regardless of width or sign; a float
    /// operand forces the float interpretation of both sides under IEEE
    /// total ordering, so `-0.0 < 0.0` and the canonical NaN sorts after
    /// positive infinity. Text and bytes compare bytewise with each other.
    /// Any other mixed pair compares by type tag.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (a, b) if a.value_type().is_number() && b.value_type().is_number() => {
                // both are numbers, as_num cannot fail
                match (a.as_num(), b.as_num()) {
                    (Some(x), Some(y)) => cmp_num(x, y),
                    _ => Ordering::Equal,
                }
            }
            (Self::Text(a), Self::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Text(a), Self::Bytes(b)) => a.as_bytes().cmp(b.as_slice()),
            (Self::Bytes(a), Self::Text(b)) => a.as_slice().cmp(b.as_bytes()),
            (a, b) => a.value_type().tag().cmp(&b.value_type().tag()),
        }
    }

    /// Convert this value to the given target type.
    ///
    /// Conversions are defined between numeric types (overflow and
    /// fractional floats fail), between text and bytes, and between scalars
    /// and booleans (zero is false, non-zero is true). Everything else
    /// fails with an invalid conversion error.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidConversion`] when the conversion is
    /// undefined or the payload does not fit the target.
    pub fn convert_to(&self, target: ValueType) -> DocumentResult<Value> {
        if self.value_type() == target {
            return Ok(self.clone());
        }

        let fail = || DocumentError::invalid_conversion(self.value_type().name(), target.name());

        match target {
            ValueType::Bool => match self {
                Self::Null => Ok(Self::Bool(false)),
                Self::Text(s) => Ok(Self::Bool(!s.is_empty())),
                Self::Bytes(b) => Ok(Self::Bool(!b.is_empty())),
                v => v.as_num().map(|n| Self::Bool(!n.is_zero())).ok_or_else(fail),
            },
            ValueType::Text => match self {
                Self::Bytes(b) => String::from_utf8(b.clone())
                    .map(Self::Text)
                    .map_err(|_| fail()),
                _ => Err(fail()),
            },
            ValueType::Bytes => match self {
                Self::Text(s) => Ok(Self::Bytes(s.clone().into_bytes())),
                _ => Err(fail()),
            },
            t if t.is_number() => self.convert_to_number(t).ok_or_else(fail),
            _ => Err(fail()),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn convert_to_number(&self, target: ValueType) -> Option<Value> {
        let num = match self {
            Self::Bool(b) => Num::Signed(i64::from(*b)),
            v => v.as_num()?,
        };

        if target == ValueType::Float64 {
            return Some(Self::Float64(num.as_f64()));
        }

        // Integer target: reject fractional or out-of-range floats, then
        // funnel through i128 for a single range check per width.
        let wide: i128 = match num {
            Num::Signed(n) => i128::from(n),
            Num::Unsigned(n) => i128::from(n),
            Num::Float(f) => {
                if !f.is_finite() || f.fract() != 0.0 {
                    return None;
                }
                f as i128
            }
        };

        Some(match target {
            ValueType::Int8 => Self::Int8(i8::try_from(wide).ok()?),
            ValueType::Int16 => Self::Int16(i16::try_from(wide).ok()?),
            ValueType::Int32 => Self::Int32(i32::try_from(wide).ok()?),
            ValueType::Int64 => Self::Int64(i64::try_from(wide).ok()?),
            ValueType::Int => Self::Int(i64::try_from(wide).ok()?),
            ValueType::Uint8 => Self::Uint8(u8::try_from(wide).ok()?),
            ValueType::Uint16 => Self::Uint16(u16::try_from(wide).ok()?),
            ValueType::Uint32 => Self::Uint32(u32::try_from(wide).ok()?),
            ValueType::Uint64 => Self::Uint64(u64::try_from(wide).ok()?),
            ValueType::Uint => Self::Uint(u64::try_from(wide).ok()?),
            _ => return None,
        })
    }
}

/// Total numeric comparison: exact for integer pairs, float interpretation
/// as soon as one side is a float.
#[allow(clippy::cast_sign_loss)]
fn cmp_num(a: Num, b: Num) -> Ordering {
    match (a, b) {
        (Num::Signed(x), Num::Signed(y)) => x.cmp(&y),
        (Num::Unsigned(x), Num::Unsigned(y)) => x.cmp(&y),
        (Num::Signed(x), Num::Unsigned(y)) => {
            if x < 0 {
                Ordering::Less
            } else {
                (x as u64).cmp(&y)
            }
        }
        (Num::Unsigned(_), Num::Signed(_)) => cmp_num(b, a).reverse(),
        (x, y) => cmp_f64(x.as_f64(), y.as_f64()),
    }
}

/// Total float comparison with the canonical NaN position.
///
/// NaN compares equal to NaN and greater than everything else, matching the
/// canonical NaN encoding which sorts after positive infinity.
pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i8> for Value {
    fn from(n: i8) -> Self {
        Self::Int8(n)
    }
}

impl From<i16> for Value {
    fn from(n: i16) -> Self {
        Self::Int16(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int64(n)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Self::Uint8(n)
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Self::Uint16(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Uint32(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Uint64(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<ValueBuffer> for Value {
    fn from(a: ValueBuffer) -> Self {
        Self::Array(a)
    }
}

impl From<FieldBuffer> for Value {
    fn from(d: FieldBuffer) -> Self {
        Self::Document(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for tag in 1..=17u8 {
            let t = ValueType::from_tag(tag).unwrap();
            assert_eq!(t.tag(), tag);
        }
        assert_eq!(ValueType::from_tag(0), None);
        assert_eq!(ValueType::from_tag(18), None);
    }

    #[test]
    fn value_type_of_every_variant() {
        assert_eq!(Value::Null.value_type(), ValueType::Null);
        assert_eq!(Value::Bool(true).value_type(), ValueType::Bool);
        assert_eq!(Value::Int8(1).value_type(), ValueType::Int8);
        assert_eq!(Value::int(1).value_type(), ValueType::Int);
        assert_eq!(Value::uint(1).value_type(), ValueType::Uint);
        assert_eq!(Value::Float64(1.0).value_type(), ValueType::Float64);
        assert_eq!(Value::from("x").value_type(), ValueType::Text);
        assert_eq!(Value::from(vec![1u8]).value_type(), ValueType::Bytes);
    }

    #[test]
    fn numeric_comparison_crosses_types() {
        assert_eq!(
            Value::Int8(10).total_cmp(&Value::Float64(10.0)),
            Ordering::Equal
        );
        assert_eq!(
            Value::Uint64(11).total_cmp(&Value::Int32(10)),
            Ordering::Greater
        );
        assert_eq!(
            Value::Float64(-0.5).total_cmp(&Value::Int(0)),
            Ordering::Less
        );
    }

    #[test]
    fn large_integers_compare_exactly() {
        // beyond 2^53 a float interpretation would collapse these
        let a = Value::Uint64((1 << 53) + 1);
        let b = Value::Uint64(1 << 53);
        assert_eq!(a.total_cmp(&b), Ordering::Greater);
        assert_eq!(
            Value::Int64(-1).total_cmp(&Value::Uint64(0)),
            Ordering::Less
        );
    }

    #[test]
    fn float_total_order_edges() {
        assert_eq!(cmp_f64(-0.0, 0.0), Ordering::Less);
        assert_eq!(cmp_f64(f64::NEG_INFINITY, f64::MIN), Ordering::Less);
        assert_eq!(cmp_f64(f64::INFINITY, f64::NAN), Ordering::Less);
        assert_eq!(cmp_f64(f64::NAN, f64::NAN), Ordering::Equal);
    }

    #[test]
    fn text_and_bytes_compare_bytewise() {
        assert_eq!(
            Value::from("abc").total_cmp(&Value::Bytes(b"abd".to_vec())),
            Ordering::Less
        );
    }

    #[test]
    fn mixed_types_compare_by_tag() {
        assert_eq!(
            Value::Null.total_cmp(&Value::Bool(false)),
            Ordering::Less
        );
        assert_eq!(
            Value::from("a").total_cmp(&Value::Int64(1)),
            Ordering::Greater
        );
    }

    #[test]
    fn convert_numeric_widths() {
        assert_eq!(
            Value::int(1).convert_to(ValueType::Int32).unwrap(),
            Value::Int32(1)
        );
        assert_eq!(
            Value::Float64(10.0).convert_to(ValueType::Uint8).unwrap(),
            Value::Uint8(10)
        );
        assert_eq!(
            Value::Int64(-1).convert_to(ValueType::Uint64).unwrap_err(),
            DocumentError::invalid_conversion("int64", "uint64")
        );
        assert!(Value::Int16(1000).convert_to(ValueType::Int8).is_err());
        assert!(Value::Float64(10.5).convert_to(ValueType::Int32).is_err());
        assert!(Value::Float64(f64::NAN).convert_to(ValueType::Int64).is_err());
    }

    #[test]
    fn convert_text_bytes_and_bool() {
        assert_eq!(
            Value::from("hi").convert_to(ValueType::Bytes).unwrap(),
            Value::Bytes(b"hi".to_vec())
        );
        assert_eq!(
            Value::Bytes(b"hi".to_vec())
                .convert_to(ValueType::Text)
                .unwrap(),
            Value::from("hi")
        );
        assert!(Value::Bytes(vec![0xff]).convert_to(ValueType::Text).is_err());
        assert_eq!(
            Value::Int64(0).convert_to(ValueType::Bool).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            Value::Float64(0.1).convert_to(ValueType::Bool).unwrap(),
            Value::Bool(true)
        );
        assert!(Value::from("x").convert_to(ValueType::Int64).is_err());
    }
}
