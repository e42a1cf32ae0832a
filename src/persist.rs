// used for persistence
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
// used when rendering timestamps as column text
use chrono::SecondsFormat;
use tracing::debug;

use crate::datatype::{DataType, Scalar};
use crate::error::NullableError;
use crate::legacy::{NullTime, format_datetime};
use crate::nullable::Nullable;

// ------------- Valuer -------------
impl Scalar {
    /// Storage column value for this scalar.
    ///
    /// SQLite has no boolean, unsigned or timestamp storage class: booleans
    /// bind as 0/1, unsigned values wrap into the signed range and timestamps
    /// bind as RFC 3339 text with nanosecond precision.
    pub fn into_sql(self) -> Result<Value, NullableError> {
        Ok(match self {
            Scalar::Null => Value::Null,
            Scalar::Integer(i) => Value::Integer(i),
            Scalar::Unsigned(u) => Value::Integer(u as i64),
            Scalar::Real(f) => Value::Real(f),
            Scalar::Boolean(b) => Value::Integer(b as i64),
            Scalar::Text(s) => Value::Text(s),
            Scalar::Blob(b) => Value::Blob(b),
            Scalar::Timestamp(t) => Value::Text(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Scalar::Opaque(opaque) => match opaque.text() {
                Some(text) => Value::Text(text.to_string()),
                None => {
                    return Err(NullableError::Bind {
                        type_name: opaque.type_name(),
                    });
                }
            },
        })
    }
}

impl<T: DataType> ToSql for Nullable<T> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = self
            .to_scalar()
            .into_sql()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::Owned(value))
    }
}

// ------------- Scanner -------------
impl<'a> From<ValueRef<'a>> for Scalar {
    fn from(value: ValueRef<'a>) -> Self {
        match value {
            ValueRef::Null => Scalar::Null,
            ValueRef::Integer(i) => Scalar::Integer(i),
            ValueRef::Real(f) => Scalar::Real(f),
            ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Scalar::Text(text.to_string()),
                Err(e) => {
                    debug!(error = %e, "column text is not utf-8, scanning as blob");
                    Scalar::Blob(bytes.to_vec())
                }
            },
            ValueRef::Blob(bytes) => Scalar::Blob(bytes.to_vec()),
        }
    }
}

impl<T: DataType> FromSql for Nullable<T> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Nullable::from_scalar(Scalar::from(value)).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// ------------- Legacy timestamp -------------
// written in the fixed-width profile so that scanning it back round-trips
impl ToSql for NullTime {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        if self.valid() {
            Ok(ToSqlOutput::Owned(Value::Text(format_datetime(&self.time()))))
        } else {
            Ok(ToSqlOutput::Owned(Value::Null))
        }
    }
}

impl FromSql for NullTime {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let mut time = NullTime::default();
        time.scan(Scalar::from(value)).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        Ok(time)
    }
}
