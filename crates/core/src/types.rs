//! Column data types for the Strata table store.

use core::fmt;
use serde::{Deserialize, Serialize};

/// The type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer
    Integer,
    /// Boolean (true/false)
    Boolean,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// UTF-8 string
    String,
    /// Milliseconds since the Unix epoch
    Timestamp,
    /// Binary blob
    Binary,
    /// Reference to one row of the target table
    Link,
    /// Ordered list of references into the target table
    LinkList,
    /// Any scalar value; unsupported by typed operations
    Mixed,
}

impl DataType {
    /// Returns whether the type is one of the link kinds.
    #[inline]
    pub fn is_link(&self) -> bool {
        matches!(self, DataType::Link | DataType::LinkList)
    }

    /// Returns whether a search index can be built over this type.
    pub fn is_indexable(&self) -> bool {
        matches!(
            self,
            DataType::Integer
                | DataType::Boolean
                | DataType::Float
                | DataType::Double
                | DataType::String
                | DataType::Timestamp
        )
    }

    /// Returns whether the type may serve as a primary key.
    pub fn supports_primary_key(&self) -> bool {
        matches!(self, DataType::Integer | DataType::String)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::Boolean => "boolean",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Timestamp => "timestamp",
            DataType::Binary => "binary",
            DataType::Link => "link",
            DataType::LinkList => "link-list",
            DataType::Mixed => "mixed",
        };
        f.write_str(name)
    }
}
