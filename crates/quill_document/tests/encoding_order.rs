//! Property tests for the canonical encoding: round-trips and order
//! preservation across the sortable scalar types.

use proptest::prelude::*;
use quill_document::{decoder, encoder, Value};
use std::cmp::Ordering;

fn check_order(a: &Value, b: &Value) {
    let ea = encoder::encode_value(a).unwrap();
    let eb = encoder::encode_value(b).unwrap();
    assert_eq!(
        a.total_cmp(b),
        ea.cmp(&eb),
        "value order and encoded order disagree for {a:?} / {b:?}"
    );
}

proptest! {
    #[test]
    fn i8_round_trip_and_order(a in any::<i8>(), b in any::<i8>()) {
        let decoded = decoder::decode_i8(&encoder::encode_i8(a)).unwrap();
        prop_assert_eq!(decoded, a);
        check_order(&Value::Int8(a), &Value::Int8(b));
    }

    #[test]
    fn i16_round_trip_and_order(a in any::<i16>(), b in any::<i16>()) {
        let decoded = decoder::decode_i16(&encoder::encode_i16(a)).unwrap();
        prop_assert_eq!(decoded, a);
        check_order(&Value::Int16(a), &Value::Int16(b));
    }

    #[test]
    fn i32_round_trip_and_order(a in any::<i32>(), b in any::<i32>()) {
        let decoded = decoder::decode_i32(&encoder::encode_i32(a)).unwrap();
        prop_assert_eq!(decoded, a);
        check_order(&Value::Int32(a), &Value::Int32(b));
    }

    #[test]
    fn i64_round_trip_and_order(a in any::<i64>(), b in any::<i64>()) {
        let decoded = decoder::decode_i64(&encoder::encode_i64(a)).unwrap();
        prop_assert_eq!(decoded, a);
        check_order(&Value::Int64(a), &Value::Int64(b));
    }

    #[test]
    fn u64_round_trip_and_order(a in any::<u64>(), b in any::<u64>()) {
        let decoded = decoder::decode_u64(&encoder::encode_u64(a)).unwrap();
        prop_assert_eq!(decoded, a);
        check_order(&Value::Uint64(a), &Value::Uint64(b));
    }

    #[test]
    fn f64_round_trip_and_order(a in any::<f64>(), b in any::<f64>()) {
        prop_assume!(!a.is_nan() && !b.is_nan());
        let decoded = decoder::decode_f64(&encoder::encode_f64(a)).unwrap();
        prop_assert_eq!(decoded.to_bits(), a.to_bits());
        check_order(&Value::Float64(a), &Value::Float64(b));
    }

    #[test]
    fn text_order(a in ".*", b in ".*") {
        check_order(&Value::Text(a), &Value::Text(b));
    }

    #[test]
    fn bytes_order(a in proptest::collection::vec(any::<u8>(), 0..64),
                   b in proptest::collection::vec(any::<u8>(), 0..64)) {
        check_order(&Value::Bytes(a), &Value::Bytes(b));
    }
}

#[test]
fn float_special_values_sort() {
    let ordered = [
        f64::NEG_INFINITY,
        f64::MIN,
        -0.0,
        0.0,
        f64::MAX,
        f64::INFINITY,
    ];
    for pair in ordered.windows(2) {
        let a = encoder::encode_value(&Value::Float64(pair[0])).unwrap();
        let b = encoder::encode_value(&Value::Float64(pair[1])).unwrap();
        assert_eq!(a.cmp(&b), Ordering::Less);
    }

    // every NaN encodes identically and lands after +Inf
    let nan = encoder::encode_f64(f64::NAN);
    assert_eq!(nan, encoder::encode_f64(-f64::NAN));
    assert!(encoder::encode_f64(f64::INFINITY) < nan);
}

#[test]
fn structural_round_trip() {
    let doc = quill_document::parse_json(
        r#"{"a": 1, "b": [1, 2.5, "x", null], "c": {"d": true, "e": {"f": [255]}}}"#,
    )
    .unwrap();

    let encoded = encoder::encode_document(&doc).unwrap();
    let decoded = decoder::decode_document(&encoded).unwrap();
    assert_eq!(decoded, doc);
}
