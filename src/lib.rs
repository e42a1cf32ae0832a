//! Tristate – a nullable value that tells *unset*, *null* and *valid* apart.
//!
//! A plain `Option<T>` collapses "the field was never mentioned" and "the
//! field was explicitly cleared" into the same `None`. That breaks PATCH-style
//! partial updates and database NULL handling. [`Nullable<T>`] keeps three
//! states instead:
//!
//! | State   | `is_set()` | `is_null()` | `is_valid()` | `get()`       |
//! |---------|------------|-------------|--------------|---------------|
//! | Unset   | false      | false       | false        | `T::default()`|
//! | Null    | true       | true        | false        | `T::default()`|
//! | Valid   | true       | false       | true         | the value     |
//!
//! The default value is Unset, so struct fields nobody touched stay unset.
//! Validity depends only on the state: `Nullable::new(0)`, `Nullable::new("")`
//! and `Nullable::new(false)` are all valid.
//!
//! ## Modules
//! * [`nullable`] – [`State`], [`Nullable`] and the text (serde / JSON) protocol.
//! * [`datatype`] – the storage [`Scalar`], the [`DataType`] trait and the
//!   coercion matrix between them.
//! * [`persist`] – `rusqlite` `ToSql` / `FromSql` bindings.
//! * [`attribute`] – the wide-column attribute adapter [`Attr`].
//! * [`legacy`] – fixed-width aliases and the legacy [`legacy::NullTime`].
//!
//! ## JSON
//! `null` decodes to Null. Absent keys must keep the field unset, so record
//! fields carry `#[serde(default)]`. Null and Unset both encode as `null`;
//! add `skip_serializing_if = "Nullable::is_unset"` to omit unset fields.
//! ```
//! use serde::Deserialize;
//! use tristate::Nullable;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     #[serde(default)]
//!     name: Nullable<String>,
//!     #[serde(default)]
//!     email: Nullable<String>,
//!     #[serde(default)]
//!     age: Nullable<i32>,
//! }
//!
//! let user: User = serde_json::from_str(r#"{"name": "Alice", "email": null}"#).unwrap();
//! assert_eq!(user.name.get(), "Alice");
//! assert!(user.email.is_null());
//! assert!(!user.age.is_set());
//! ```
//!
//! ## SQL
//! `Nullable<T>` implements `rusqlite`'s `ToSql` and `FromSql` for every
//! [`DataType`]. Null and Unset bind as SQL NULL; NULL scans back as Null.
//! ```
//! use rusqlite::Connection;
//! use tristate::Nullable;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! conn.execute("create table t (name text)", []).unwrap();
//! conn.execute("insert into t values (?1)", [Nullable::<String>::null()]).unwrap();
//! let name: Nullable<String> = conn.query_row("select name from t", [], |r| r.get(0)).unwrap();
//! assert!(name.is_null());
//! ```
//!
//! ## Errors
//! Nothing here is retried or swallowed. Text decoding fails with the serde
//! error, scanning with [`ScanError`], the attribute adapter with
//! [`AttributeError`]. A failed decode leaves its target unusable.

pub mod attribute;
pub mod datatype;
mod error;
pub mod legacy;
pub mod nullable;
pub mod persist;

pub use attribute::{Attr, AttributeValue};
pub use datatype::{DataType, Opaque, Scalar, ScalarKind, scan_structural};
pub use error::{AttributeError, NullableError, Result, ScanError};
pub use nullable::{Nullable, State};
