//! Strata Core - Core types for the Strata table store.
//!
//! This crate provides the foundational types shared by the index and
//! storage layers:
//!
//! - `DataType`: Column types (Integer, Boolean, Float, Double, String, Timestamp, Binary, Link, LinkList, Mixed)
//! - `Value`: Tagged cell values checked against a column's type on assignment
//! - `schema`: Column definitions and naming rules
//! - `Error`: Error types and their taxonomy (`ErrorKind`)
//!
//! # Example
//!
//! ```rust
//! use strata_core::schema::{ColumnDef, Schema, MAX_NAME_LENGTH};
//! use strata_core::{DataType, Value};
//!
//! let mut schema = Schema::new();
//! let age = schema
//!     .push(ColumnDef::new("age", DataType::Integer), MAX_NAME_LENGTH)
//!     .unwrap();
//!
//! let column = schema.column(age).unwrap();
//! assert!(column.accepts(&Value::Integer(40)));
//! assert!(!column.accepts(&Value::Null));
//! ```

mod error;
pub mod pattern_match;
pub mod schema;
mod types;
mod value;

pub use error::{Error, ErrorKind, Result};
pub use types::DataType;
pub use value::{RowIndex, Value};
