//! Error types for the Strata table store.

use crate::types::DataType;
use crate::value::Value;
use thiserror::Error;

/// Result type alias for Strata operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: bad index, name, or value type. Nothing was changed.
    InvalidArgument,
    /// A primary key or structural constraint would be broken.
    ConstraintViolation,
    /// A mutation was attempted outside a write transaction.
    ImmutableContext,
    /// The owning scope of the handle has ended.
    InvalidState,
    /// The operation does not support the data shape it was given.
    UnsupportedOperation,
    /// Storage could not be allocated.
    ResourceExhaustion,
}

/// Errors raised by table, row, query and view operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("column index {index} out of range (column count {count})")]
    ColumnOutOfRange { index: usize, count: usize },

    #[error("row index {index} out of range (size {size})")]
    RowOutOfRange { index: usize, size: usize },

    #[error("column {column:?} expects {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        got: String,
    },

    #[error("column {column:?} is not nullable")]
    NullNotAllowed { column: String },

    #[error("table not found: {name}")]
    TableNotFound { name: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("primary key value already exists in column {column:?}: {value}")]
    DuplicateKey { column: String, value: Value },

    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("changing data can only be done from inside a write transaction")]
    Immutable,

    #[error("{what} is no longer valid")]
    Invalidated { what: &'static str },

    #[error("another write transaction is already open")]
    WriterActive,

    #[error("primary keys are only supported for tables that belong to a group")]
    NoPrimaryKeySupport,

    #[error("table {table:?} has no primary key defined")]
    MissingPrimaryKey { table: String },

    #[error("unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("storage allocation failed: {message}")]
    ResourceExhausted { message: String },
}

impl Error {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidName { .. }
            | Error::ColumnOutOfRange { .. }
            | Error::RowOutOfRange { .. }
            | Error::TypeMismatch { .. }
            | Error::NullNotAllowed { .. }
            | Error::TableNotFound { .. }
            | Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::DuplicateKey { .. } | Error::ConstraintViolation { .. } => {
                ErrorKind::ConstraintViolation
            }
            Error::Immutable => ErrorKind::ImmutableContext,
            Error::Invalidated { .. } | Error::WriterActive => ErrorKind::InvalidState,
            Error::NoPrimaryKeySupport
            | Error::MissingPrimaryKey { .. }
            | Error::Unsupported { .. } => ErrorKind::UnsupportedOperation,
            Error::ResourceExhausted { .. } => ErrorKind::ResourceExhaustion,
        }
    }

    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a type mismatch error for a value written to a column.
    pub fn type_mismatch(column: impl Into<String>, expected: DataType, got: &Value) -> Self {
        let got = match got.data_type() {
            Some(dt) => dt.to_string(),
            None => "null".into(),
        };
        Error::TypeMismatch {
            column: column.into(),
            expected,
            got,
        }
    }

    /// Creates a type mismatch error for an operation on a column of the wrong type.
    pub fn column_type_mismatch(
        column: impl Into<String>,
        expected: DataType,
        actual: DataType,
    ) -> Self {
        Error::TypeMismatch {
            column: column.into(),
            expected,
            got: actual.to_string(),
        }
    }

    /// Creates a duplicate primary key error.
    pub fn duplicate_key(column: impl Into<String>, value: Value) -> Self {
        Error::DuplicateKey {
            column: column.into(),
            value,
        }
    }

    /// Creates a generic invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a constraint violation error.
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Error::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported {
            message: message.into(),
        }
    }

    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    /// Creates an allocation failure error.
    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Error::ResourceExhausted {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::type_mismatch("age", DataType::Integer, &Value::String("x".into()));
        assert_eq!(err.to_string(), "column \"age\" expects integer, got string");

        let err = Error::duplicate_key("name", Value::String("John".into()));
        assert!(err.to_string().contains("John"));

        let err = Error::table_not_found("people");
        assert!(err.to_string().contains("people"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::duplicate_key("id", Value::Integer(1)).kind(),
            ErrorKind::ConstraintViolation
        );
        assert_eq!(Error::Immutable.kind(), ErrorKind::ImmutableContext);
        assert_eq!(Error::Invalidated { what: "table" }.kind(), ErrorKind::InvalidState);
        assert_eq!(
            Error::RowOutOfRange { index: 3, size: 1 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(Error::NoPrimaryKeySupport.kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(
            Error::resource_exhausted("rows").kind(),
            ErrorKind::ResourceExhaustion
        );
    }
}
