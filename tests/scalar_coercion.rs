mod common;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use tristate::{DataType, Nullable, Opaque, Scalar, ScalarKind, ScanError, State};

fn round_trip<T: DataType + Clone + PartialEq + std::fmt::Debug>(value: T) {
    let original = Nullable::new(value);
    let scanned = Nullable::<T>::from_scalar(original.to_scalar()).expect("scan");
    assert_eq!(scanned, original);
}

#[test]
fn fixed_kinds_round_trip() {
    common::init_tracing();
    round_trip(i8::MIN);
    round_trip(i8::MAX);
    round_trip(i16::MIN);
    round_trip(i32::MAX);
    round_trip(i64::MIN);
    round_trip(-1isize);
    round_trip(u8::MAX);
    round_trip(u16::MAX);
    round_trip(u32::MAX);
    round_trip(u64::MAX);
    round_trip(usize::MAX);
    round_trip(1.5f32);
    round_trip(-0.25f64);
    round_trip(true);
    round_trip(false);
    round_trip("grüße, 世界 🌍".to_string());
    round_trip(String::new());
    round_trip(vec![0u8, 1, 254, 255]);
    round_trip(Utc.with_ymd_and_hms(2024, 2, 29, 13, 37, 0).unwrap() + chrono::Duration::nanoseconds(123_456_789));
}

#[test]
fn encoding_widens() {
    assert_eq!(Nullable::new(-3i8).to_scalar(), Scalar::Integer(-3));
    assert_eq!(Nullable::new(7u16).to_scalar(), Scalar::Integer(7));
    assert_eq!(Nullable::new(0.5f32).to_scalar(), Scalar::Real(0.5));
    assert_eq!(Nullable::new("a".to_string()).to_scalar(), Scalar::Text("a".into()));
    assert_eq!(Nullable::new(true).to_scalar(), Scalar::Boolean(true));
    assert_eq!(Nullable::new(vec![9u8]).to_scalar(), Scalar::Blob(vec![9]));
}

#[test]
fn unsigned_beyond_signed_range_wraps() {
    common::init_tracing();
    assert_eq!(Nullable::new(u64::MAX).to_scalar(), Scalar::Integer(-1));
    assert_eq!(Nullable::new(1u64 << 63).to_scalar(), Scalar::Integer(i64::MIN));
}

#[test]
fn null_and_unset_encode_as_null() {
    assert_eq!(Nullable::<i32>::null().to_scalar(), Scalar::Null);
    assert_eq!(Nullable::<i32>::Unset.to_scalar(), Scalar::Null);
}

#[test]
fn scanning_null_yields_null_for_any_type() {
    assert_eq!(Nullable::<String>::from_scalar(Scalar::Null).expect("scan").state(), State::Null);
    assert_eq!(Nullable::<u8>::from_scalar(Scalar::Null).expect("scan").state(), State::Null);
    assert_eq!(Nullable::<DateTime<Utc>>::from_scalar(Scalar::Null).expect("scan").state(), State::Null);
    assert_eq!(Nullable::<serde_json::Value>::from_scalar(Scalar::Null).expect("scan").state(), State::Null);

    let mut v = Nullable::new(5i32);
    v.scan(Scalar::Null).expect("scan");
    assert!(v.is_null());
}

#[test]
fn text_accepts_text_and_bytes() {
    assert_eq!(Nullable::<String>::from_scalar(Scalar::from("hi")).expect("scan").get(), "hi");
    assert_eq!(Nullable::<String>::from_scalar(Scalar::Blob(b"raw".to_vec())).expect("scan").get(), "raw");
    let err = Nullable::<String>::from_scalar(Scalar::Blob(vec![0xff, 0xfe])).unwrap_err();
    assert!(matches!(err, ScanError::Utf8 { .. }));
    let err = Nullable::<String>::from_scalar(Scalar::Integer(1)).unwrap_err();
    assert_eq!(err.to_string(), "cannot scan integer into string");
}

#[test]
fn signed_accepts_integer_and_real() {
    assert_eq!(Nullable::<i64>::from_scalar(Scalar::Real(42.9)).expect("scan").get(), 42);
    assert_eq!(Nullable::<i16>::from_scalar(Scalar::Integer(-12)).expect("scan").get(), -12);
    // narrowing truncates
    assert_eq!(Nullable::<i8>::from_scalar(Scalar::Integer(300)).expect("scan").get(), 44);
    let err = Nullable::<i32>::from_scalar(Scalar::Unsigned(1)).unwrap_err();
    assert_eq!(err.to_string(), "cannot scan unsigned into i32");
    assert!(Nullable::<i32>::from_scalar(Scalar::from("12")).is_err());
}

#[test]
fn unsigned_accepts_unsigned_integer_and_real() {
    assert_eq!(Nullable::<u64>::from_scalar(Scalar::Unsigned(u64::MAX)).expect("scan").get(), u64::MAX);
    assert_eq!(Nullable::<u64>::from_scalar(Scalar::Integer(-1)).expect("scan").get(), u64::MAX);
    assert_eq!(Nullable::<u32>::from_scalar(Scalar::Real(7.0)).expect("scan").get(), 7);
    let err = Nullable::<u8>::from_scalar(Scalar::Boolean(true)).unwrap_err();
    assert_eq!(err.to_string(), "cannot scan boolean into u8");
}

#[test]
fn float_accepts_real_and_integer() {
    assert_eq!(Nullable::<f64>::from_scalar(Scalar::Integer(3)).expect("scan").get(), 3.0);
    assert_eq!(Nullable::<f32>::from_scalar(Scalar::Real(0.5)).expect("scan").get(), 0.5);
    assert!(Nullable::<f64>::from_scalar(Scalar::from("1.5")).is_err());
}

#[test]
fn bool_accepts_boolean_and_integer() {
    assert!(Nullable::<bool>::from_scalar(Scalar::Integer(2)).expect("scan").get());
    assert!(!Nullable::<bool>::from_scalar(Scalar::Integer(0)).expect("scan").get());
    assert!(Nullable::<bool>::from_scalar(Scalar::Boolean(true)).expect("scan").get());
    assert!(Nullable::<bool>::from_scalar(Scalar::from("true")).is_err());
}

#[test]
fn bytes_accept_blob_and_text() {
    assert_eq!(Nullable::<Vec<u8>>::from_scalar(Scalar::from("ab")).expect("scan").get(), b"ab".to_vec());
    assert!(Nullable::<Vec<u8>>::from_scalar(Scalar::Real(1.0)).is_err());
}

#[test]
fn timestamps_accept_native_text_and_bytes() {
    let expected = Utc.with_ymd_and_hms(2023, 5, 1, 8, 30, 0).unwrap();
    let from_text = Nullable::<DateTime<Utc>>::from_scalar(Scalar::from("2023-05-01T10:30:00+02:00")).expect("scan");
    assert_eq!(from_text.get(), expected);
    let from_bytes = Nullable::<DateTime<Utc>>::from_scalar(Scalar::Blob(b"2023-05-01T08:30:00Z".to_vec())).expect("scan");
    assert_eq!(from_bytes.get(), expected);
    let native = Nullable::<DateTime<Utc>>::from_scalar(Scalar::from(expected)).expect("scan");
    assert_eq!(native.get(), expected);

    let offset = Nullable::<DateTime<FixedOffset>>::from_scalar(Scalar::from("2023-05-01T10:30:00+02:00")).expect("scan");
    assert_eq!(offset.get().offset().local_minus_utc(), 7200);
}

#[test]
fn unparsable_timestamp_text_fails() {
    let err = Nullable::<DateTime<Utc>>::from_scalar(Scalar::from("yesterday")).unwrap_err();
    assert!(matches!(err, ScanError::Timestamp { .. }));
    assert!(err.to_string().starts_with("cannot parse time \"yesterday\""));
}

#[test]
fn failed_scan_keeps_previous_value() {
    let mut v = Nullable::new(9u8);
    assert!(v.scan(Scalar::from("nine")).is_err());
    assert_eq!(v, Nullable::new(9u8));
}

#[test]
fn structural_assignable_from_opaque() {
    let json = serde_json::json!({"k": [1, 2]});
    let scalar = Nullable::new(json.clone()).to_scalar();
    match &scalar {
        Scalar::Opaque(opaque) => assert_eq!(opaque.text(), Some(r#"{"k":[1,2]}"#)),
        other => panic!("expected opaque, got {other:?}"),
    }
    assert_eq!(Nullable::<serde_json::Value>::from_scalar(scalar).expect("scan").get(), json);
}

#[test]
fn structural_convertible_from_text() {
    let v = Nullable::<serde_json::Value>::from_scalar(Scalar::from("[true]")).expect("scan");
    assert_eq!(v.get(), serde_json::json!([true]));
    let d = Nullable::<BigDecimal>::from_scalar(Scalar::from("12.3400")).expect("scan");
    assert_eq!(d.get(), BigDecimal::from_str("12.34").unwrap());
    let d = Nullable::<BigDecimal>::from_scalar(Scalar::Integer(5)).expect("scan");
    assert_eq!(d.get(), BigDecimal::from(5));
}

#[test]
fn structural_rejects_unrelated_sources() {
    let err = Nullable::<serde_json::Value>::from_scalar(Scalar::Boolean(true)).unwrap_err();
    match err {
        ScanError::Unsupported { found, target } => {
            assert_eq!(found, "boolean");
            assert_eq!(target, ScalarKind::Structural("serde_json::Value"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // an opaque of another type is neither assignable nor convertible
    let err = Nullable::<BigDecimal>::from_scalar(Scalar::Opaque(Opaque::new(17u128))).unwrap_err();
    assert_eq!(err.to_string(), "cannot scan u128 into BigDecimal");
}

#[derive(Clone, Debug, PartialEq)]
struct Celsius(f64);

impl DataType for Celsius {
    const KIND: ScalarKind = ScalarKind::Structural("Celsius");
    const DATA_TYPE: &'static str = "Celsius";
    fn to_scalar(&self) -> Scalar {
        Scalar::Opaque(Opaque::new(self.clone()))
    }
    fn convert(value: Scalar) -> Result<Self, ScanError> {
        tristate::scan_structural(value, |value| match value {
            Scalar::Real(f) => Some(Celsius(f)),
            _ => None,
        })
    }
}

#[test]
fn custom_types_opt_into_the_fallback() {
    round_trip(Celsius(21.5));
    assert_eq!(Nullable::<Celsius>::from_scalar(Scalar::Real(-4.0)).expect("scan").get_or(Celsius(0.0)), Celsius(-4.0));
    assert!(Nullable::<Celsius>::from_scalar(Scalar::Integer(3)).is_err());
    assert_eq!(Celsius(1.0).data_type(), "Celsius");
    assert_eq!(42i16.kind(), ScalarKind::Signed(16));
}

#[test]
fn kinds_display() {
    assert_eq!(ScalarKind::Text.to_string(), "string");
    assert_eq!(ScalarKind::Unsigned(8).to_string(), "u8");
    assert_eq!(ScalarKind::Float(32).to_string(), "f32");
    assert_eq!(<DateTime<Utc> as DataType>::KIND.to_string(), "timestamp");
    assert_eq!(<Vec<u8> as DataType>::KIND.to_string(), "bytes");
}
