use thiserror::Error;

use crate::datatype::ScalarKind;

/// Failure to coerce a storage scalar into a payload type.
#[derive(Error, Debug)]
pub enum ScanError {
    /// No coercion path exists from the source scalar to the destination kind.
    #[error("cannot scan {found} into {target}")]
    Unsupported { found: String, target: ScalarKind },
    /// A byte sequence destined for text was not UTF-8.
    #[error("cannot scan non-utf8 bytes into {target}")]
    Utf8 {
        target: ScalarKind,
        #[source]
        cause: std::string::FromUtf8Error,
    },
    #[error("cannot parse time {value:?}: {cause}")]
    Timestamp {
        value: String,
        #[source]
        cause: chrono::ParseError,
    },
    /// Legacy fixed-width date/time text with an unknown shape.
    #[error("invalid timestamp string: {0:?}")]
    TimestampLayout(String),
}

impl ScanError {
    pub(crate) fn unsupported(found: impl Into<String>, target: ScalarKind) -> Self {
        Self::Unsupported { found: found.into(), target }
    }
}

/// Failure in the wide-column attribute adapter.
#[derive(Error, Debug)]
pub enum AttributeError {
    #[error("unsupported type {type_name}")]
    Unsupported { type_name: &'static str },
    #[error("cannot unmarshal {found} attribute into {target}")]
    Mismatch { found: &'static str, target: ScalarKind },
    #[error("cannot parse {value:?} as {target}: {cause}")]
    InvalidNumber { value: String, target: ScalarKind, cause: String },
    #[error("cannot parse {value:?} as time: {cause}")]
    InvalidTimestamp {
        value: String,
        #[source]
        cause: chrono::ParseError,
    },
    #[error(transparent)]
    Scan(#[from] ScanError),
}

#[derive(Error, Debug)]
pub enum NullableError {
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),
    #[error("Bind error: opaque {type_name} has no storage representation")]
    Bind { type_name: &'static str },
    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, NullableError>;

// Helper conversions
impl From<rusqlite::Error> for NullableError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
