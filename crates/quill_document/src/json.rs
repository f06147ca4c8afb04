//! JSON and CSV adapters for documents.

use crate::document::{Document, FieldBuffer, ValueBuffer};
use crate::error::{DocumentError, DocumentResult};
use crate::value::Value;
use std::io::Write;

/// Parses a JSON object into a [`FieldBuffer`].
///
/// Field order follows the source text. Numbers take the narrowest signed
/// integer type that holds them; integral magnitudes beyond `i64` become
/// `Uint64`; anything with a fraction or exponent becomes `Float64`.
///
/// # Errors
///
/// Returns [`DocumentError::Parse`] for malformed JSON or a non-object
/// root.
pub fn parse_json(data: &str) -> DocumentResult<FieldBuffer> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| DocumentError::parse(e.to_string()))?;
    match value {
        serde_json::Value::Object(map) => Ok(object_to_buffer(map)),
        other => Err(DocumentError::parse(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Parses any JSON text into a [`Value`] with the same number rules as
/// [`parse_json`].
///
/// # Errors
///
/// Returns [`DocumentError::Parse`] for malformed JSON.
pub fn parse_json_value(data: &str) -> DocumentResult<Value> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| DocumentError::parse(e.to_string()))?;
    Ok(json_to_value(value))
}

fn object_to_buffer(map: serde_json::Map<String, serde_json::Value>) -> FieldBuffer {
    let mut buf = FieldBuffer::new();
    for (name, value) in map {
        buf.add(name, json_to_value(value));
    }
    buf
}

fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => number_to_value(&n),
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Array(items) => {
            let mut buf = ValueBuffer::new();
            for item in items {
                buf.append(json_to_value(item));
            }
            Value::Array(buf)
        }
        serde_json::Value::Object(map) => Value::Document(object_to_buffer(map)),
    }
}

fn number_to_value(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        narrowest_int(i)
    } else if let Some(u) = n.as_u64() {
        Value::Uint64(u)
    } else {
        Value::Float64(n.as_f64().unwrap_or(f64::NAN))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn narrowest_int(i: i64) -> Value {
    if let Ok(n) = i8::try_from(i) {
        Value::Int8(n)
    } else if let Ok(n) = i16::try_from(i) {
        Value::Int16(n)
    } else if let Ok(n) = i32::try_from(i) {
        Value::Int32(n)
    } else {
        Value::Int64(i)
    }
}

/// Writes a document as one compact JSON object followed by a newline.
///
/// Duplicate fields are written as they appear; the output is a faithful
/// transcript of the document, not a deduplicated map.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] on writer failures and
/// [`DocumentError::Parse`] for values JSON cannot represent (non-finite
/// floats).
pub fn to_json<W: Write>(w: &mut W, doc: &dyn Document) -> DocumentResult<()> {
    write_document(w, doc)?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Writes each document as one JSON object per line.
///
/// # Errors
///
/// Same failure modes as [`to_json`].
pub fn iterator_to_json<W, I, D>(w: &mut W, iter: I) -> DocumentResult<()>
where
    W: Write,
    I: IntoIterator<Item = D>,
    D: Document,
{
    for doc in iter {
        to_json(w, &doc)?;
    }
    Ok(())
}

/// Writes the documents as a single JSON array.
///
/// # Errors
///
/// Same failure modes as [`to_json`].
pub fn iterator_to_json_array<W, I, D>(w: &mut W, iter: I) -> DocumentResult<()>
where
    W: Write,
    I: IntoIterator<Item = D>,
    D: Document,
{
    w.write_all(b"[")?;
    for (i, doc) in iter.into_iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        write_document(w, &doc)?;
    }
    w.write_all(b"]")?;
    Ok(())
}

/// Writes one CSV line per document: the values in field order, comma
/// separated, with minimal quoting. There is no header line; a document
/// missing trailing fields simply produces a shorter row.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] on writer failures and propagates
/// iteration errors.
pub fn iterator_to_csv<W, I, D>(w: &mut W, iter: I) -> DocumentResult<()>
where
    W: Write,
    I: IntoIterator<Item = D>,
    D: Document,
{
    for doc in iter {
        let mut fields: Vec<String> = Vec::new();
        doc.iterate(&mut |_, value| {
            fields.push(csv_field(&value)?);
            Ok(())
        })?;
        w.write_all(quote_csv_row(&fields).as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

fn write_document<W: Write>(w: &mut W, doc: &dyn Document) -> DocumentResult<()> {
    w.write_all(b"{")?;
    let mut first = true;
    doc.iterate(&mut |name, value| {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write_json_string(w, name)?;
        w.write_all(b":")?;
        write_value(w, &value)
    })?;
    w.write_all(b"}")?;
    Ok(())
}

fn write_value<W: Write>(w: &mut W, value: &Value) -> DocumentResult<()> {
    match value {
        Value::Null => w.write_all(b"null")?,
        Value::Bool(b) => w.write_all(if *b { b"true" } else { b"false" })?,
        Value::Int8(n) => write!(w, "{n}")?,
        Value::Int16(n) => write!(w, "{n}")?,
        Value::Int32(n) => write!(w, "{n}")?,
        Value::Int64(n) | Value::Int(n) => write!(w, "{n}")?,
        Value::Uint8(n) => write!(w, "{n}")?,
        Value::Uint16(n) => write!(w, "{n}")?,
        Value::Uint32(n) => write!(w, "{n}")?,
        Value::Uint64(n) | Value::Uint(n) => write!(w, "{n}")?,
        Value::Float64(f) => {
            if !f.is_finite() {
                return Err(DocumentError::parse(
                    "JSON cannot represent a non-finite float",
                ));
            }
            serde_json::to_writer(&mut *w, f).map_err(|e| DocumentError::parse(e.to_string()))?;
        }
        Value::Text(s) => write_json_string(w, s)?,
        Value::Bytes(b) => write_json_string(w, &String::from_utf8_lossy(b))?,
        Value::Array(a) => {
            w.write_all(b"[")?;
            for (i, item) in a.iter().enumerate() {
                if i > 0 {
                    w.write_all(b",")?;
                }
                write_value(w, item)?;
            }
            w.write_all(b"]")?;
        }
        Value::Document(d) => write_document(w, d)?,
    }
    Ok(())
}

fn write_json_string<W: Write>(w: &mut W, s: &str) -> DocumentResult<()> {
    serde_json::to_writer(w, s).map_err(|e| DocumentError::parse(e.to_string()))
}

fn csv_field(value: &Value) -> DocumentResult<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::Text(s) => quote_csv_value(s),
        Value::Bytes(b) => quote_csv_value(&String::from_utf8_lossy(b)),
        Value::Array(_) | Value::Document(_) => {
            let mut out = Vec::new();
            write_value(&mut out, value)?;
            quote_csv_value(&String::from_utf8_lossy(&out))
        }
        other => {
            let mut out = Vec::new();
            write_value(&mut out, other)?;
            String::from_utf8_lossy(&out).into_owned()
        }
    })
}

/// Quotes a CSV field only when it contains a delimiter, quote or newline;
/// embedded quotes are doubled.
fn quote_csv_value(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn quote_csv_row(fields: &[String]) -> String {
    fields.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_object() {
        let buf = parse_json("{}").unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn parse_missing_closing_bracket_fails() {
        assert!(parse_json("{").is_err());
        assert!(parse_json(r#"{"a": 1, "b": 2"#).is_err());
    }

    #[test]
    fn parse_missing_comma_fails() {
        assert!(parse_json(r#"{"a": 1 "b": 2}"#).is_err());
    }

    #[test]
    fn parse_classic_object() {
        let buf = parse_json(r#"{"a": 1, "b": true, "c": "hello", "d": [1, 2, 3], "e": {"f": "g"}}"#)
            .unwrap();

        let mut d = ValueBuffer::new();
        d.append(Value::Int8(1))
            .append(Value::Int8(2))
            .append(Value::Int8(3));
        let mut e = FieldBuffer::new();
        e.add("f", "g");

        let expected: FieldBuffer = [
            ("a", Value::Int8(1)),
            ("b", Value::Bool(true)),
            ("c", Value::from("hello")),
            ("d", Value::Array(d)),
            ("e", Value::Document(e)),
        ]
        .into_iter()
        .collect();
        assert_eq!(buf, expected);
    }

    #[test]
    fn parse_integer_widths() {
        let cases = [
            (r#"{"a": 1}"#, Value::Int8(1)),
            (r#"{"a": -1}"#, Value::Int8(-1)),
            (r#"{"a": 1000}"#, Value::Int16(1000)),
            (r#"{"a": 1000000}"#, Value::Int32(1_000_000)),
            (r#"{"a": 10000000000}"#, Value::Int64(10_000_000_000)),
            (r#"{"a": -10000000000}"#, Value::Int64(-10_000_000_000)),
            (
                r#"{"a": 10000000000000000000}"#,
                Value::Uint64(10_000_000_000_000_000_000),
            ),
            (r#"{"a": 10000000000.0}"#, Value::Float64(1.0e10)),
            (r#"{"a": -10000000000.0}"#, Value::Float64(-1.0e10)),
            (r#"{"a": 1.0e10}"#, Value::Float64(1.0e10)),
        ];
        for (data, expected) in cases {
            let buf = parse_json(data).unwrap();
            assert_eq!(buf.get_by_field("a").unwrap(), expected, "{data}");
        }
    }

    #[test]
    fn parse_empty_and_nested_arrays() {
        let buf = parse_json(r#"{"a": []}"#).unwrap();
        assert_eq!(buf.get_by_field("a").unwrap(), Value::Array(ValueBuffer::new()));

        let buf = parse_json(r#"{"a": [[1,  2]]}"#).unwrap();
        let mut inner = ValueBuffer::new();
        inner.append(Value::Int8(1)).append(Value::Int8(2));
        let mut outer = ValueBuffer::new();
        outer.append(Value::Array(inner));
        assert_eq!(buf.get_by_field("a").unwrap(), Value::Array(outer));
    }

    #[test]
    fn to_json_flat() {
        let mut buf = FieldBuffer::new();
        buf.add("name", "John");
        buf.add("age", Value::Uint16(10));

        let mut out = Vec::new();
        to_json(&mut out, &buf).unwrap();
        assert_eq!(out, b"{\"name\":\"John\",\"age\":10}\n");
    }

    #[test]
    fn to_json_nested() {
        let mut address = FieldBuffer::new();
        address.add("city", "Ajaccio");
        address.add("country", "France");
        let mut friends = ValueBuffer::new();
        friends.append("fred").append("jamie");

        let mut buf = FieldBuffer::new();
        buf.add("name", "John");
        buf.add("age", Value::Uint16(10));
        buf.add("address", address);
        buf.add("friends", friends);

        let mut out = Vec::new();
        to_json(&mut out, &buf).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"name\":\"John\",\"age\":10,\"address\":{\"city\":\"Ajaccio\",\"country\":\"France\"},\"friends\":[\"fred\",\"jamie\"]}\n"
        );
    }

    #[test]
    fn iterator_to_json_array_shape() {
        let docs: Vec<FieldBuffer> = (0..3)
            .map(|i| parse_json(&format!(r#"{{"a": {i}}}"#)).unwrap())
            .collect();

        let mut out = Vec::new();
        iterator_to_json_array(&mut out, docs.iter()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"[{"a":0},{"a":1},{"a":2}]"#
        );
    }

    #[test]
    fn iterator_to_json_lines() {
        let docs: Vec<FieldBuffer> = (0..2)
            .map(|i| parse_json(&format!(r#"{{"a": {i}}}"#)).unwrap())
            .collect();

        let mut out = Vec::new();
        iterator_to_json(&mut out, docs.iter()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":0}\n{\"a\":1}\n");
    }

    #[test]
    fn csv_rows_follow_field_order() {
        let mut doc1 = FieldBuffer::new();
        doc1.add("a", "foo1");
        doc1.add("b", "bar1");
        doc1.add("c", Value::Int8(1));
        let mut doc2 = FieldBuffer::new();
        doc2.add("a", "foo2");

        let mut out = Vec::new();
        iterator_to_csv(&mut out, [&doc1, &doc2]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "foo1,bar1,1\nfoo2\n");
    }

    #[test]
    fn csv_quotes_only_when_needed() {
        let mut doc = FieldBuffer::new();
        doc.add("a", "with,comma");
        doc.add("b", "with \"quote\"");
        doc.add("c", "plain");

        let mut out = Vec::new();
        iterator_to_csv(&mut out, [&doc]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\"with,comma\",\"with \"\"quote\"\"\",plain\n"
        );
    }

    #[test]
    fn csv_null_is_empty_column() {
        let mut doc = FieldBuffer::new();
        doc.add("a", "x");
        doc.add("b", Value::Null);
        doc.add("c", Value::Int8(3));

        let mut out = Vec::new();
        iterator_to_csv(&mut out, [&doc]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x,,3\n");
    }
}
