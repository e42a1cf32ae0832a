//! Fixed-width nullable types predating the generic [`Nullable`].
//!
//! The scalar ones are plain aliases and follow the generic coercion rules.
//! [`NullTime`] is its own type: it keeps the historical rule that a zero
//! timestamp is never valid, and it scans text with the fixed-width
//! `YYYY-MM-DD[ HH:MM:SS[.ffffff]]` profile instead of RFC 3339.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, Serializer};

use crate::datatype::{Scalar, parse_rfc3339};
use crate::error::ScanError;
use crate::nullable::Nullable;

pub type NullString = Nullable<String>;
pub type NullBool = Nullable<bool>;
pub type NullInt16 = Nullable<i16>;
pub type NullInt32 = Nullable<i32>;
pub type NullInt64 = Nullable<i64>;
pub type NullFloat64 = Nullable<f64>;

const ZERO_SENTINEL: &str = "0000-00-00 00:00:00.0000000";

lazy_static! {
    static ref DATETIME_PROFILE: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2}(?: \d{2}:\d{2}:\d{2}(?:\.\d{1,6})?)?$").unwrap();
}

/// The zero timestamp, 0001-01-01T00:00:00Z.
pub fn zero_time() -> DateTime<Utc> {
    DateTime::from_timestamp(-62_135_596_800, 0).unwrap_or_default()
}

/// Parses the fixed-width profile as UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ScanError> {
    parse_datetime_in(s, &Utc)
}

/// Parses the fixed-width profile, reading the wall clock in `tz`.
///
/// Accepted lengths are 10, 19 and 21 to 26. An all-zero string of an
/// accepted length yields [`zero_time`].
pub fn parse_datetime_in<Tz: TimeZone>(s: &str, tz: &Tz) -> Result<DateTime<Tz>, ScanError> {
    match s.len() {
        10 | 19 | 21..=26 => {}
        _ => return Err(ScanError::TimestampLayout(s.to_string())),
    }
    if s == &ZERO_SENTINEL[..s.len()] {
        return Ok(zero_time().with_timezone(tz));
    }
    if !DATETIME_PROFILE.is_match(s) {
        return Err(ScanError::TimestampLayout(s.to_string()));
    }
    let naive = match s.len() {
        10 => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)),
        19 => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"),
        _ => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"),
    }
    .map_err(|cause| ScanError::Timestamp {
        value: s.to_string(),
        cause,
    })?;
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ScanError::TimestampLayout(s.to_string()))
}

/// Renders a timestamp in the 26 character form of the fixed-width profile.
pub fn format_datetime(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// A nullable timestamp with the legacy validity rule.
///
/// Unlike `Nullable<DateTime<Utc>>`, a `NullTime` holding the zero
/// timestamp reports `valid() == false` even when constructed as valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NullTime {
    time: DateTime<Utc>,
    valid: bool,
    set: bool,
}

impl Default for NullTime {
    fn default() -> Self {
        NullTime {
            time: zero_time(),
            valid: false,
            set: false,
        }
    }
}

impl NullTime {
    pub fn new(time: DateTime<Utc>) -> NullTime {
        NullTime::with_validity(time, true)
    }
    pub fn with_validity(time: DateTime<Utc>, valid: bool) -> NullTime {
        NullTime { time, valid, set: true }
    }
    pub fn null() -> NullTime {
        NullTime {
            set: true,
            ..NullTime::default()
        }
    }
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }
    pub fn valid(&self) -> bool {
        self.valid && self.time != zero_time()
    }
    pub fn set(&self) -> bool {
        self.set
    }
    pub fn is_null(&self) -> bool {
        self.set && !self.valid()
    }

    pub fn to_scalar(&self) -> Scalar {
        if self.valid() {
            Scalar::Timestamp(self.time.fixed_offset())
        } else {
            Scalar::Null
        }
    }

    /// Scans a timestamp, or text in the fixed-width profile.
    ///
    /// Unknown source types leave the value invalid without an error.
    pub fn scan(&mut self, src: Scalar) -> Result<(), ScanError> {
        self.set = true;
        self.valid = false;
        let text = match src {
            Scalar::Timestamp(t) => {
                let t = t.with_timezone(&Utc);
                if t != zero_time() {
                    self.time = t;
                    self.valid = true;
                }
                return Ok(());
            }
            Scalar::Text(s) => s,
            Scalar::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
            _ => return Ok(()),
        };
        self.time = parse_datetime(&text)?;
        self.valid = true;
        Ok(())
    }
}

impl fmt::Display for NullTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.valid() {
            write!(f, "{}", self.time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        } else {
            write!(f, "null")
        }
    }
}

impl Serialize for NullTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.valid() {
            serializer.serialize_str(&self.time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        } else {
            serializer.serialize_none()
        }
    }
}

impl<'de> Deserialize<'de> for NullTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = NullTime::default();
        let scalar = match Option::<String>::deserialize(deserializer)? {
            None => Scalar::Null,
            Some(s) => Scalar::Timestamp(parse_rfc3339(&s).map_err(D::Error::custom)?),
        };
        value.scan(scalar).map_err(D::Error::custom)?;
        Ok(value)
    }
}
