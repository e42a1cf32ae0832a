// used to carry structural payloads through the storage layer untouched
use std::any::Any;
use std::sync::Arc;

// used to print out readable forms of kinds and scalars
use std::fmt;
// used when parsing decimals from storage text
use std::str::FromStr;

// used for timestamps in the database
use chrono::{DateTime, FixedOffset, Utc};
// used for decimal numbers
use bigdecimal::BigDecimal;
use tracing::debug;

use crate::error::ScanError;

/// The destination kind of a coercion, as named in scan errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Signed(u8),
    Unsigned(u8),
    Float(u8),
    Bool,
    Bytes,
    Timestamp,
    /// A payload outside the fixed matrix, named by its type.
    Structural(&'static str),
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScalarKind::Text => write!(f, "string"),
            ScalarKind::Signed(bits) => write!(f, "i{}", bits),
            ScalarKind::Unsigned(bits) => write!(f, "u{}", bits),
            ScalarKind::Float(bits) => write!(f, "f{}", bits),
            ScalarKind::Bool => write!(f, "bool"),
            ScalarKind::Bytes => write!(f, "bytes"),
            ScalarKind::Timestamp => write!(f, "timestamp"),
            ScalarKind::Structural(name) => write!(f, "{}", name),
        }
    }
}

/// A value outside the fixed scalar set, handed to the storage layer as is.
///
/// The storage layer cannot look inside an opaque value, so it may carry a
/// text rendering to fall back to.
#[derive(Clone)]
pub struct Opaque {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    text: Option<String>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Opaque {
        Opaque {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
            text: None,
        }
    }
    pub fn with_text<T: Any + Send + Sync>(value: T, text: impl Into<String>) -> Opaque {
        Opaque {
            text: Some(text.into()),
            ..Opaque::new(value)
        }
    }
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}
impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .field("text", &self.text)
            .finish()
    }
}
// two opaque values are equal only when they share the same allocation
impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A storage scalar: what a relational binding hands to and receives from a
/// `Nullable`.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Integer(i64),
    /// Only ever produced by drivers; encoding always widens into `Integer`.
    Unsigned(u64),
    Real(f64),
    Boolean(bool),
    Text(String),
    Blob(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    Opaque(Opaque),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
    /// Name of the dynamic type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Integer(_) => "integer",
            Scalar::Unsigned(_) => "unsigned",
            Scalar::Real(_) => "real",
            Scalar::Boolean(_) => "boolean",
            Scalar::Text(_) => "text",
            Scalar::Blob(_) => "blob",
            Scalar::Timestamp(_) => "timestamp",
            Scalar::Opaque(opaque) => opaque.type_name(),
        }
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self { Scalar::Integer(i) }
}
impl From<u64> for Scalar {
    fn from(u: u64) -> Self { Scalar::Unsigned(u) }
}
impl From<f64> for Scalar {
    fn from(f: f64) -> Self { Scalar::Real(f) }
}
impl From<bool> for Scalar {
    fn from(b: bool) -> Self { Scalar::Boolean(b) }
}
impl From<&str> for Scalar {
    fn from(s: &str) -> Self { Scalar::Text(s.to_string()) }
}
impl From<String> for Scalar {
    fn from(s: String) -> Self { Scalar::Text(s) }
}
impl From<Vec<u8>> for Scalar {
    fn from(b: Vec<u8>) -> Self { Scalar::Blob(b) }
}
impl From<DateTime<Utc>> for Scalar {
    fn from(t: DateTime<Utc>) -> Self { Scalar::Timestamp(t.fixed_offset()) }
}
impl From<DateTime<FixedOffset>> for Scalar {
    fn from(t: DateTime<FixedOffset>) -> Self { Scalar::Timestamp(t) }
}

/// A payload type that can travel through the storage binding.
///
/// The fixed matrix covers text, every integer width, both float widths,
/// booleans, byte sequences and timestamps. Anything else opts in by
/// implementing this trait on top of [`scan_structural`].
pub trait DataType: Sized {
    // static stuff which needs to be implemented downstream
    const KIND: ScalarKind;
    const DATA_TYPE: &'static str;
    fn to_scalar(&self) -> Scalar;
    fn convert(value: Scalar) -> Result<Self, ScanError>;
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn kind(&self) -> ScalarKind {
        Self::KIND
    }
}

// ------------- Coercion matrix --------------
fn scan_signed(value: Scalar, target: ScalarKind) -> Result<i64, ScanError> {
    match value {
        Scalar::Integer(i) => Ok(i),
        Scalar::Real(f) => Ok(f as i64),
        other => Err(ScanError::unsupported(other.type_name(), target)),
    }
}

fn scan_unsigned(value: Scalar, target: ScalarKind) -> Result<u64, ScanError> {
    match value {
        Scalar::Unsigned(u) => Ok(u),
        Scalar::Integer(i) => Ok(i as u64),
        Scalar::Real(f) => Ok(f as u64),
        other => Err(ScanError::unsupported(other.type_name(), target)),
    }
}

fn scan_float(value: Scalar, target: ScalarKind) -> Result<f64, ScanError> {
    match value {
        Scalar::Real(f) => Ok(f),
        Scalar::Integer(i) => Ok(i as f64),
        other => Err(ScanError::unsupported(other.type_name(), target)),
    }
}

fn scan_timestamp(value: Scalar, target: ScalarKind) -> Result<DateTime<FixedOffset>, ScanError> {
    match value {
        Scalar::Timestamp(t) => Ok(t),
        Scalar::Text(s) => parse_rfc3339(&s),
        Scalar::Blob(b) => parse_rfc3339(&String::from_utf8_lossy(&b)),
        other => Err(ScanError::unsupported(other.type_name(), target)),
    }
}

pub(crate) fn parse_rfc3339(s: &str) -> Result<DateTime<FixedOffset>, ScanError> {
    DateTime::parse_from_rfc3339(s).map_err(|cause| ScanError::Timestamp {
        value: s.to_string(),
        cause,
    })
}

// values at or above 2^63 wrap around; storage has no unsigned 64-bit column
fn widen_unsigned(u: u64) -> Scalar {
    if u > i64::MAX as u64 {
        debug!(value = u, "unsigned value exceeds the signed storage range and wraps");
    }
    Scalar::Integer(u as i64)
}

macro_rules! signed_data_type {
    ($($t:ty),+) => {
        $(
            impl DataType for $t {
                const KIND: ScalarKind = ScalarKind::Signed(<$t>::BITS as u8);
                const DATA_TYPE: &'static str = stringify!($t);
                fn to_scalar(&self) -> Scalar {
                    Scalar::Integer(*self as i64)
                }
                fn convert(value: Scalar) -> Result<Self, ScanError> {
                    scan_signed(value, Self::KIND).map(|i| i as $t)
                }
            }
        )+
    };
}

macro_rules! unsigned_data_type {
    ($($t:ty),+) => {
        $(
            impl DataType for $t {
                const KIND: ScalarKind = ScalarKind::Unsigned(<$t>::BITS as u8);
                const DATA_TYPE: &'static str = stringify!($t);
                fn to_scalar(&self) -> Scalar {
                    widen_unsigned(*self as u64)
                }
                fn convert(value: Scalar) -> Result<Self, ScanError> {
                    scan_unsigned(value, Self::KIND).map(|u| u as $t)
                }
            }
        )+
    };
}

signed_data_type!(i8, i16, i32, i64, isize);
unsigned_data_type!(u8, u16, u32, u64, usize);

impl DataType for f32 {
    const KIND: ScalarKind = ScalarKind::Float(32);
    const DATA_TYPE: &'static str = "f32";
    fn to_scalar(&self) -> Scalar {
        Scalar::Real(*self as f64)
    }
    fn convert(value: Scalar) -> Result<f32, ScanError> {
        scan_float(value, Self::KIND).map(|f| f as f32)
    }
}
impl DataType for f64 {
    const KIND: ScalarKind = ScalarKind::Float(64);
    const DATA_TYPE: &'static str = "f64";
    fn to_scalar(&self) -> Scalar {
        Scalar::Real(*self)
    }
    fn convert(value: Scalar) -> Result<f64, ScanError> {
        scan_float(value, Self::KIND)
    }
}
impl DataType for bool {
    const KIND: ScalarKind = ScalarKind::Bool;
    const DATA_TYPE: &'static str = "bool";
    fn to_scalar(&self) -> Scalar {
        Scalar::Boolean(*self)
    }
    fn convert(value: Scalar) -> Result<bool, ScanError> {
        match value {
            Scalar::Boolean(b) => Ok(b),
            Scalar::Integer(i) => Ok(i != 0),
            other => Err(ScanError::unsupported(other.type_name(), Self::KIND)),
        }
    }
}
impl DataType for String {
    const KIND: ScalarKind = ScalarKind::Text;
    const DATA_TYPE: &'static str = "String";
    fn to_scalar(&self) -> Scalar {
        Scalar::Text(self.clone())
    }
    fn convert(value: Scalar) -> Result<String, ScanError> {
        match value {
            Scalar::Text(s) => Ok(s),
            Scalar::Blob(b) => String::from_utf8(b).map_err(|cause| ScanError::Utf8 {
                target: Self::KIND,
                cause,
            }),
            other => Err(ScanError::unsupported(other.type_name(), Self::KIND)),
        }
    }
}
impl DataType for Vec<u8> {
    const KIND: ScalarKind = ScalarKind::Bytes;
    const DATA_TYPE: &'static str = "Vec<u8>";
    fn to_scalar(&self) -> Scalar {
        Scalar::Blob(self.clone())
    }
    fn convert(value: Scalar) -> Result<Vec<u8>, ScanError> {
        match value {
            Scalar::Blob(b) => Ok(b),
            Scalar::Text(s) => Ok(s.into_bytes()),
            other => Err(ScanError::unsupported(other.type_name(), Self::KIND)),
        }
    }
}
impl DataType for DateTime<Utc> {
    const KIND: ScalarKind = ScalarKind::Timestamp;
    const DATA_TYPE: &'static str = "DateTime<Utc>";
    fn to_scalar(&self) -> Scalar {
        Scalar::Timestamp(self.fixed_offset())
    }
    fn convert(value: Scalar) -> Result<DateTime<Utc>, ScanError> {
        scan_timestamp(value, Self::KIND).map(|t| t.with_timezone(&Utc))
    }
}
impl DataType for DateTime<FixedOffset> {
    const KIND: ScalarKind = ScalarKind::Timestamp;
    const DATA_TYPE: &'static str = "DateTime<FixedOffset>";
    fn to_scalar(&self) -> Scalar {
        Scalar::Timestamp(*self)
    }
    fn convert(value: Scalar) -> Result<DateTime<FixedOffset>, ScanError> {
        scan_timestamp(value, Self::KIND)
    }
}

// ------------- Structural fallback --------------

/// Scans a payload outside the fixed matrix.
///
/// An opaque source holding exactly `T` is assigned directly. Any other
/// source is offered to `convert`; `None` means there is no conversion and
/// the scan fails naming both sides.
pub fn scan_structural<T, F>(value: Scalar, convert: F) -> Result<T, ScanError>
where
    T: DataType + Any + Clone,
    F: FnOnce(Scalar) -> Option<T>,
{
    if let Scalar::Opaque(opaque) = &value {
        if let Some(assignable) = opaque.downcast_ref::<T>() {
            return Ok(assignable.clone());
        }
    }
    let found = value.type_name();
    convert(value).ok_or_else(|| ScanError::unsupported(found, T::KIND))
}

impl DataType for serde_json::Value {
    const KIND: ScalarKind = ScalarKind::Structural("serde_json::Value");
    const DATA_TYPE: &'static str = "JSON";
    fn to_scalar(&self) -> Scalar {
        Scalar::Opaque(Opaque::with_text(self.clone(), self.to_string()))
    }
    fn convert(value: Scalar) -> Result<serde_json::Value, ScanError> {
        scan_structural(value, |value| match value {
            Scalar::Text(s) => serde_json::from_str(&s).ok(),
            Scalar::Blob(b) => serde_json::from_slice(&b).ok(),
            _ => None,
        })
    }
}

impl DataType for BigDecimal {
    const KIND: ScalarKind = ScalarKind::Structural("BigDecimal");
    const DATA_TYPE: &'static str = "Decimal";
    fn to_scalar(&self) -> Scalar {
        Scalar::Opaque(Opaque::with_text(self.clone(), self.to_string()))
    }
    fn convert(value: Scalar) -> Result<BigDecimal, ScanError> {
        scan_structural(value, |value| match value {
            Scalar::Text(s) => BigDecimal::from_str(&s).ok(),
            Scalar::Integer(i) => Some(BigDecimal::from(i)),
            Scalar::Unsigned(u) => Some(BigDecimal::from(u)),
            Scalar::Real(f) => BigDecimal::from_str(&f.to_string()).ok(),
            _ => None,
        })
    }
}
