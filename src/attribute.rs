//! Wide-column attribute adapter.
//!
//! [`Attr`] wraps a [`Nullable`] and translates it to and from the tagged
//! attribute values used by wide-column stores. It only goes through the
//! container's public constructors and accessors.

// used for map attributes
use std::collections::BTreeMap;
use std::ops;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::datatype::{DataType, Scalar, ScalarKind};
use crate::error::AttributeError;
use crate::nullable::Nullable;

/// A tagged attribute value, serialized the way the wire format tags it
/// (`{"S": "..."}`, `{"N": "42"}`, `{"NULL": true}`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    /// Numbers travel as decimal strings.
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    B(Vec<u8>),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(Vec<Vec<u8>>),
    L(Vec<AttributeValue>),
    M(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn tag(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::B(_) => "B",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
            AttributeValue::Bs(_) => "BS",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
        }
    }
}

/// A [`Nullable`] that can be stored as a wide-column attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Attr<T>(Nullable<T>);

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr(Nullable::Unset)
    }
}

impl<T> Attr<T> {
    pub fn new(value: T) -> Attr<T> {
        Attr(Nullable::new(value))
    }
    pub fn null() -> Attr<T> {
        Attr(Nullable::null())
    }
    pub fn from_option(value: Option<T>) -> Attr<T> {
        Attr(Nullable::from_option(value))
    }
    pub fn into_inner(self) -> Nullable<T> {
        self.0
    }
}
impl<T> From<Nullable<T>> for Attr<T> {
    fn from(value: Nullable<T>) -> Self {
        Attr(value)
    }
}
impl<T> ops::Deref for Attr<T> {
    type Target = Nullable<T>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DataType> Attr<T> {
    /// Encodes the wrapped value; anything but a valid value becomes `NULL`.
    pub fn to_attribute(&self) -> Result<AttributeValue, AttributeError> {
        let Some(value) = self.0.as_option() else {
            return Ok(AttributeValue::Null(true));
        };
        let attribute = match (T::KIND, value.to_scalar()) {
            (ScalarKind::Structural(type_name), _) => {
                return Err(AttributeError::Unsupported { type_name });
            }
            // the scalar wrapped into i64, the cast undoes it
            (ScalarKind::Unsigned(_), Scalar::Integer(i)) => AttributeValue::N((i as u64).to_string()),
            (ScalarKind::Float(32), Scalar::Real(f)) => AttributeValue::N((f as f32).to_string()),
            (_, Scalar::Integer(i)) => AttributeValue::N(i.to_string()),
            (_, Scalar::Real(f)) => AttributeValue::N(f.to_string()),
            (_, Scalar::Text(s)) => AttributeValue::S(s),
            (_, Scalar::Boolean(b)) => AttributeValue::Bool(b),
            (_, Scalar::Blob(b)) => AttributeValue::B(b),
            (_, Scalar::Timestamp(t)) => AttributeValue::S(t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            (_, other) => {
                return Err(AttributeError::Unsupported {
                    type_name: other.type_name(),
                });
            }
        };
        Ok(attribute)
    }

    /// Overwrites the wrapped value from an attribute; `NULL` yields null.
    pub fn from_attribute(&mut self, attribute: &AttributeValue) -> Result<(), AttributeError> {
        trace!(tag = attribute.tag(), kind = %T::KIND, "decode attribute");
        if let AttributeValue::Null(_) = attribute {
            self.0 = Nullable::null();
            return Ok(());
        }
        let scalar = match (T::KIND, attribute) {
            (ScalarKind::Structural(type_name), _) => {
                return Err(AttributeError::Unsupported { type_name });
            }
            (ScalarKind::Text, AttributeValue::S(s) | AttributeValue::N(s)) => Scalar::Text(s.clone()),
            (ScalarKind::Signed(_), AttributeValue::N(n)) => Scalar::Integer(parse_number(n, T::KIND)?),
            (ScalarKind::Unsigned(_), AttributeValue::N(n)) => Scalar::Unsigned(parse_number(n, T::KIND)?),
            (ScalarKind::Float(_), AttributeValue::N(n)) => Scalar::Real(parse_number(n, T::KIND)?),
            (ScalarKind::Bool, AttributeValue::Bool(b)) => Scalar::Boolean(*b),
            (ScalarKind::Bytes, AttributeValue::B(b)) => Scalar::Blob(b.clone()),
            (ScalarKind::Bytes, AttributeValue::S(s)) => Scalar::Text(s.clone()),
            (ScalarKind::Timestamp, AttributeValue::S(s)) => {
                let t = DateTime::parse_from_rfc3339(s).map_err(|cause| AttributeError::InvalidTimestamp {
                    value: s.clone(),
                    cause,
                })?;
                Scalar::Timestamp(t)
            }
            (target, other) => {
                return Err(AttributeError::Mismatch {
                    found: other.tag(),
                    target,
                });
            }
        };
        self.0 = Nullable::from_scalar(scalar)?;
        Ok(())
    }

    pub fn decode(attribute: &AttributeValue) -> Result<Attr<T>, AttributeError> {
        let mut value = Attr(Nullable::Unset);
        value.from_attribute(attribute)?;
        Ok(value)
    }
}

fn parse_number<N>(value: &str, target: ScalarKind) -> Result<N, AttributeError>
where
    N: std::str::FromStr,
    N::Err: std::fmt::Display,
{
    value.parse::<N>().map_err(|e| AttributeError::InvalidNumber {
        value: value.to_string(),
        target,
        cause: e.to_string(),
    })
}
