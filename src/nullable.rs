// used to print out readable forms of a state
use std::fmt;
use std::marker::PhantomData;

// used for the text encoding protocol
use serde::de::{Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use tracing::trace;

use crate::datatype::{DataType, Scalar};
use crate::error::{Result, ScanError};

/// The three states a [`Nullable`] can be in, ordered by information content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Never set. This is the zero value.
    #[default]
    Unset,
    /// Explicitly set to null.
    Null,
    /// Holds a value.
    Valid,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            State::Unset => write!(f, "unset"),
            State::Null => write!(f, "null"),
            State::Valid => write!(f, "valid"),
        }
    }
}

/// An optional value that keeps "never set", "set to null" and "set to a
/// value" apart.
///
/// The default is [`Nullable::Unset`], so a record deriving `Default` starts
/// out with every field unset. Validity is decided by the variant alone: an
/// empty string, zero or `false` wrapped in `Valid` is a value, not a null.
///
/// ## Records
/// A JSON null decodes to `Null`, but an absent key must never reach the
/// deserializer, otherwise serde's missing-field path would report it as
/// null too. Mark fields with `#[serde(default)]` so absent keys stay unset:
/// ```
/// use serde::{Deserialize, Serialize};
/// use tristate::Nullable;
///
/// #[derive(Deserialize, Serialize, Default)]
/// struct Patch {
///     #[serde(default, skip_serializing_if = "Nullable::is_unset")]
///     name: Nullable<String>,
///     #[serde(default, skip_serializing_if = "Nullable::is_unset")]
///     email: Nullable<String>,
/// }
///
/// let patch: Patch = serde_json::from_str(r#"{"email":null}"#).unwrap();
/// assert!(!patch.name.is_set());
/// assert!(patch.email.is_null());
/// assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"email":null}"#);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Nullable<T> {
    Unset,
    Null,
    Valid(T),
}

impl<T> Nullable<T> {
    // --- Constructors ---
    pub fn new(value: T) -> Nullable<T> {
        Nullable::Valid(value)
    }
    pub fn null() -> Nullable<T> {
        Nullable::Null
    }
    /// `None` becomes null, `Some` becomes valid.
    pub fn from_option(value: Option<T>) -> Nullable<T> {
        match value {
            Some(v) => Nullable::Valid(v),
            None => Nullable::Null,
        }
    }
    pub fn from_ref(value: Option<&T>) -> Nullable<T>
    where
        T: Clone,
    {
        Nullable::from_option(value.cloned())
    }

    // --- State queries ---
    /// True for both null and valid; false only when never set.
    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }
    pub fn is_unset(&self) -> bool {
        matches!(self, Nullable::Unset)
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Nullable::Null)
    }
    pub fn is_valid(&self) -> bool {
        matches!(self, Nullable::Valid(_))
    }
    pub fn state(&self) -> State {
        match self {
            Nullable::Unset => State::Unset,
            Nullable::Null => State::Null,
            Nullable::Valid(_) => State::Valid,
        }
    }

    // --- Value extraction ---
    /// The value, or the default of `T` unless valid.
    pub fn get(&self) -> T
    where
        T: Clone + Default,
    {
        match self {
            Nullable::Valid(v) => v.clone(),
            _ => T::default(),
        }
    }
    pub fn get_or(&self, default: T) -> T
    where
        T: Clone,
    {
        match self {
            Nullable::Valid(v) => v.clone(),
            _ => default,
        }
    }
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Nullable::Valid(v) => Some(v),
            _ => None,
        }
    }
    pub fn into_option(self) -> Option<T> {
        match self {
            Nullable::Valid(v) => Some(v),
            _ => None,
        }
    }
}

// no `T: Default` bound, unlike the derive
impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Nullable::Unset
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        Nullable::from_option(value)
    }
}
impl<T> From<Nullable<T>> for Option<T> {
    fn from(value: Nullable<T>) -> Self {
        value.into_option()
    }
}

// ------------- Scalar protocol -------------
impl<T: DataType> Nullable<T> {
    /// Storage scalar for this value; null and unset both bind as `Scalar::Null`.
    pub fn to_scalar(&self) -> Scalar {
        match self {
            Nullable::Valid(v) => v.to_scalar(),
            _ => Scalar::Null,
        }
    }

    /// Overwrites this value from a storage scalar.
    ///
    /// A failed scan leaves the previous contents in place, but callers should
    /// treat the target as unusable.
    pub fn scan(&mut self, src: Scalar) -> std::result::Result<(), ScanError> {
        trace!(found = src.type_name(), kind = %T::KIND, "scan");
        if src.is_null() {
            *self = Nullable::Null;
            return Ok(());
        }
        *self = Nullable::Valid(T::convert(src)?);
        Ok(())
    }

    pub fn from_scalar(src: Scalar) -> std::result::Result<Nullable<T>, ScanError> {
        let mut value = Nullable::Unset;
        value.scan(src)?;
        Ok(value)
    }
}

// ------------- Text protocol -------------
impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Nullable::Valid(v) => v.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

struct NullableVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for NullableVisitor<T> {
    type Value = Nullable<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "null or a value")
    }
    fn visit_none<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(Nullable::Null)
    }
    fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(Nullable::Null)
    }
    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error> {
        T::deserialize(deserializer).map(Nullable::Valid)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_option(NullableVisitor(PhantomData))
    }
}

impl<T> Nullable<T> {
    /// Decodes a single JSON token; `null` yields a null value.
    pub fn from_json(json: &str) -> Result<Nullable<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        trace!(len = json.len(), "decode json");
        Ok(serde_json::from_str(json)?)
    }
    /// Encodes as JSON; null and unset both yield `null`.
    pub fn to_json(&self) -> Result<String>
    where
        T: Serialize,
    {
        Ok(serde_json::to_string(self)?)
    }
}
