//! Row accessors.
//!
//! Both accessors are a table handle plus a row position. They copy
//! nothing: every getter and setter goes straight to the table, so a write
//! through one accessor is visible through every other.
//!
//! [`CheckedRow`] validates column range, row range and column type on
//! every call. [`UncheckedRow`] skips those checks and panics on misuse; it
//! still refuses to touch a table whose context has ended.

use crate::table::Table;
use strata_core::{DataType, Result, RowIndex, Value};

/// Row accessor that validates every access.
#[derive(Clone, Debug)]
pub struct CheckedRow {
    table: Table,
    row: RowIndex,
}

impl CheckedRow {
    pub(crate) fn new(table: Table, row: RowIndex) -> Self {
        Self { table, row }
    }

    #[inline]
    pub fn index(&self) -> RowIndex {
        self.row
    }

    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Whether the table is valid and still has a row at this position.
    pub fn is_attached(&self) -> bool {
        self.table.size().map_or(false, |size| self.row < size)
    }

    pub fn column_count(&self) -> Result<usize> {
        self.table.column_count()
    }

    pub fn column_name(&self, col: usize) -> Result<String> {
        self.table.column_name(col)
    }

    pub fn column_type(&self, col: usize) -> Result<DataType> {
        self.table.column_type(col)
    }

    pub fn get_value(&self, col: usize) -> Result<Value> {
        self.table.get_value(col, self.row)
    }

    pub fn get_long(&self, col: usize) -> Result<Option<i64>> {
        self.table.get_long(col, self.row)
    }

    pub fn get_boolean(&self, col: usize) -> Result<Option<bool>> {
        self.table.get_boolean(col, self.row)
    }

    pub fn get_float(&self, col: usize) -> Result<Option<f32>> {
        self.table.get_float(col, self.row)
    }

    pub fn get_double(&self, col: usize) -> Result<Option<f64>> {
        self.table.get_double(col, self.row)
    }

    pub fn get_string(&self, col: usize) -> Result<Option<String>> {
        self.table.get_string(col, self.row)
    }

    pub fn get_timestamp(&self, col: usize) -> Result<Option<i64>> {
        self.table.get_timestamp(col, self.row)
    }

    pub fn get_binary(&self, col: usize) -> Result<Option<Vec<u8>>> {
        self.table.get_binary(col, self.row)
    }

    pub fn get_link(&self, col: usize) -> Result<Option<RowIndex>> {
        self.table.get_link(col, self.row)
    }

    pub fn get_link_list(&self, col: usize) -> Result<Vec<RowIndex>> {
        self.table.get_link_list(col, self.row)
    }

    pub fn is_null(&self, col: usize) -> Result<bool> {
        self.table.is_null(col, self.row)
    }

    pub fn is_null_link(&self, col: usize) -> Result<bool> {
        self.table.is_null_link(col, self.row)
    }

    pub fn set_value(&self, col: usize, value: impl Into<Value>) -> Result<()> {
        self.table.set_value(col, self.row, value)
    }

    pub fn set_long(&self, col: usize, value: i64) -> Result<()> {
        self.table.set_long(col, self.row, value)
    }

    pub fn set_boolean(&self, col: usize, value: bool) -> Result<()> {
        self.table.set_boolean(col, self.row, value)
    }

    pub fn set_float(&self, col: usize, value: f32) -> Result<()> {
        self.table.set_float(col, self.row, value)
    }

    pub fn set_double(&self, col: usize, value: f64) -> Result<()> {
        self.table.set_double(col, self.row, value)
    }

    pub fn set_string(&self, col: usize, value: &str) -> Result<()> {
        self.table.set_string(col, self.row, value)
    }

    pub fn set_timestamp(&self, col: usize, millis: i64) -> Result<()> {
        self.table.set_timestamp(col, self.row, millis)
    }

    pub fn set_binary(&self, col: usize, value: &[u8]) -> Result<()> {
        self.table.set_binary(col, self.row, value)
    }

    pub fn set_null(&self, col: usize) -> Result<()> {
        self.table.set_null(col, self.row)
    }

    pub fn set_link(&self, col: usize, target: RowIndex) -> Result<()> {
        self.table.set_link(col, self.row, target)
    }

    pub fn nullify_link(&self, col: usize) -> Result<()> {
        self.table.nullify_link(col, self.row)
    }
}

/// Generates an unchecked typed getter that panics when the cell holds a
/// value of another type.
macro_rules! unchecked_getter {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $variant:ident) => {
        $(#[$doc])*
        pub fn $name(&self, col: usize) -> Result<Option<$ty>> {
            match self.table.get_unchecked(col, self.row)? {
                Value::$variant(v) => Ok(Some(v)),
                Value::Null => Ok(None),
                other => panic!(
                    "column {} holds {:?}, not a {} value",
                    col,
                    other.data_type(),
                    stringify!($variant)
                ),
            }
        }
    };
}

/// Row accessor that trusts the caller.
///
/// # Panics
///
/// Getters and setters panic when the column or row index is out of range
/// or the cell type does not match.
#[derive(Clone, Debug)]
pub struct UncheckedRow {
    table: Table,
    row: RowIndex,
}

impl UncheckedRow {
    pub(crate) fn new(table: Table, row: RowIndex) -> Self {
        Self { table, row }
    }

    #[inline]
    pub fn index(&self) -> RowIndex {
        self.row
    }

    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn is_attached(&self) -> bool {
        self.table.size().map_or(false, |size| self.row < size)
    }

    pub fn column_count(&self) -> Result<usize> {
        self.table.column_count()
    }

    pub fn column_name(&self, col: usize) -> Result<String> {
        self.table.column_name(col)
    }

    pub fn column_type(&self, col: usize) -> Result<DataType> {
        self.table.column_type(col)
    }

    pub fn get_value(&self, col: usize) -> Result<Value> {
        self.table.get_unchecked(col, self.row)
    }

    unchecked_getter!(get_long, i64, Integer);
    unchecked_getter!(get_boolean, bool, Boolean);
    unchecked_getter!(get_float, f32, Float);
    unchecked_getter!(get_double, f64, Double);
    unchecked_getter!(get_string, String, String);
    unchecked_getter!(
        /// Milliseconds since the Unix epoch.
        get_timestamp,
        i64,
        Timestamp
    );
    unchecked_getter!(get_binary, Vec<u8>, Binary);
    unchecked_getter!(get_link, RowIndex, Link);

    pub fn get_link_list(&self, col: usize) -> Result<Vec<RowIndex>> {
        match self.table.get_unchecked(col, self.row)? {
            Value::LinkList(list) => Ok(list),
            other => panic!("column {} holds {:?}, not a link list", col, other.data_type()),
        }
    }

    pub fn is_null(&self, col: usize) -> Result<bool> {
        Ok(self.table.get_unchecked(col, self.row)?.is_null())
    }

    pub fn set_value(&self, col: usize, value: impl Into<Value>) -> Result<()> {
        self.table.set_unchecked(col, self.row, value.into())
    }

    pub fn set_long(&self, col: usize, value: i64) -> Result<()> {
        self.set_value(col, Value::Integer(value))
    }

    pub fn set_boolean(&self, col: usize, value: bool) -> Result<()> {
        self.set_value(col, Value::Boolean(value))
    }

    pub fn set_float(&self, col: usize, value: f32) -> Result<()> {
        self.set_value(col, Value::Float(value))
    }

    pub fn set_double(&self, col: usize, value: f64) -> Result<()> {
        self.set_value(col, Value::Double(value))
    }

    pub fn set_string(&self, col: usize, value: &str) -> Result<()> {
        self.set_value(col, Value::String(value.to_string()))
    }

    pub fn set_timestamp(&self, col: usize, millis: i64) -> Result<()> {
        self.set_value(col, Value::Timestamp(millis))
    }

    pub fn set_binary(&self, col: usize, value: &[u8]) -> Result<()> {
        self.set_value(col, Value::Binary(value.to_vec()))
    }

    pub fn set_null(&self, col: usize) -> Result<()> {
        self.set_value(col, Value::Null)
    }

    pub fn set_link(&self, col: usize, target: RowIndex) -> Result<()> {
        self.set_value(col, Value::Link(target))
    }

    pub fn nullify_link(&self, col: usize) -> Result<()> {
        self.set_value(col, Value::Null)
    }
}
