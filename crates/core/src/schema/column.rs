//! Column definition for table schemas.

use crate::types::DataType;
use crate::value::Value;

/// A column definition in a table schema.
#[derive(Clone, Debug)]
pub struct ColumnDef {
    /// Column name.
    name: String,
    /// Data type of the column.
    data_type: DataType,
    /// Whether this column allows null values.
    nullable: bool,
    /// Name of the table link columns point into.
    link_target: Option<String>,
}

impl ColumnDef {
    /// Creates a new non-nullable column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            link_target: None,
        }
    }

    /// Creates a link or link-list column pointing into `target`.
    pub fn link(name: impl Into<String>, data_type: DataType, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            link_target: Some(target.into()),
        }
    }

    /// Sets whether this column is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }

    /// Returns the value a fresh cell of this column holds.
    pub fn default_value(&self) -> Value {
        if self.nullable {
            Value::Null
        } else {
            Value::default_for_type(self.data_type)
        }
    }

    /// Returns whether the value can be written into this column.
    #[inline]
    pub fn accepts(&self, value: &Value) -> bool {
        value.is_compatible_with(self.data_type, self.nullable)
    }
}

/// Two columns match when their names, types and link targets match.
impl PartialEq for ColumnDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_type == other.data_type
            && self.link_target == other.link_target
    }
}
