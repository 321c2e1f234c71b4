//! Operations shared by tables and views.
//!
//! Positions passed to these methods are positions within the container:
//! a table's own row index, or an index into a view. `source_row_index`
//! maps either to a row of the underlying table.

use crate::dump;
use crate::query::aggregate;
use crate::table::Table;
use crate::table_data::TableData;
use strata_core::{DataType, Result, RowIndex, Value};

pub(crate) mod sealed {
    use super::*;

    pub trait Sealed {
        /// Runs `f` with the table data and the source rows this container
        /// covers, in container order, under one context lock.
        fn with_rows<R>(&self, f: impl FnOnce(&TableData, &[RowIndex]) -> Result<R>) -> Result<R>;
    }
}

/// A table or a view of one.
pub trait TableOrView: sealed::Sealed {
    /// The table holding the data.
    fn table(&self) -> &Table;

    fn size(&self) -> Result<usize> {
        self.with_rows(|_, rows| Ok(rows.len()))
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    /// Source table row behind container position `row`.
    fn source_row_index(&self, row: usize) -> Result<RowIndex> {
        self.with_rows(|_, rows| {
            rows.get(row).copied().ok_or(strata_core::Error::RowOutOfRange {
                index: row,
                size: rows.len(),
            })
        })
    }

    /// Source table rows in container order.
    fn row_indices(&self) -> Result<Vec<RowIndex>> {
        self.with_rows(|_, rows| Ok(rows.to_vec()))
    }

    fn get_value(&self, col: usize, row: usize) -> Result<Value> {
        self.table().get_value(col, self.source_row_index(row)?)
    }

    fn get_long(&self, col: usize, row: usize) -> Result<Option<i64>> {
        self.table().get_long(col, self.source_row_index(row)?)
    }

    fn get_boolean(&self, col: usize, row: usize) -> Result<Option<bool>> {
        self.table().get_boolean(col, self.source_row_index(row)?)
    }

    fn get_float(&self, col: usize, row: usize) -> Result<Option<f32>> {
        self.table().get_float(col, self.source_row_index(row)?)
    }

    fn get_double(&self, col: usize, row: usize) -> Result<Option<f64>> {
        self.table().get_double(col, self.source_row_index(row)?)
    }

    fn get_string(&self, col: usize, row: usize) -> Result<Option<String>> {
        self.table().get_string(col, self.source_row_index(row)?)
    }

    fn get_timestamp(&self, col: usize, row: usize) -> Result<Option<i64>> {
        self.table().get_timestamp(col, self.source_row_index(row)?)
    }

    // ---------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------

    /// First container position whose cell in `col` equals `value`.
    fn find_first_value(&self, col: usize, value: &Value) -> Result<Option<usize>> {
        self.with_rows(|t, rows| {
            t.check_value(col, value)?;
            let column = t.column(col);
            Ok(rows.iter().position(|&r| column.get(r) == *value))
        })
    }

    fn find_first_long(&self, col: usize, value: i64) -> Result<Option<usize>> {
        self.find_first_value(col, &Value::Integer(value))
    }

    fn find_first_boolean(&self, col: usize, value: bool) -> Result<Option<usize>> {
        self.find_first_value(col, &Value::Boolean(value))
    }

    fn find_first_float(&self, col: usize, value: f32) -> Result<Option<usize>> {
        self.find_first_value(col, &Value::Float(value))
    }

    fn find_first_double(&self, col: usize, value: f64) -> Result<Option<usize>> {
        self.find_first_value(col, &Value::Double(value))
    }

    fn find_first_timestamp(&self, col: usize, millis: i64) -> Result<Option<usize>> {
        self.find_first_value(col, &Value::Timestamp(millis))
    }

    fn find_first_string(&self, col: usize, value: &str) -> Result<Option<usize>> {
        self.find_first_value(col, &Value::String(value.to_string()))
    }

    /// First null cell in `col`. A non-nullable column has none.
    fn find_first_null(&self, col: usize) -> Result<Option<usize>> {
        self.with_rows(|t, rows| {
            t.column_def(col)?;
            let column = t.column(col);
            Ok(rows.iter().position(|&r| column.is_null(r)))
        })
    }

    /// Number of cells in `col` equal to `value`.
    fn count_value(&self, col: usize, value: &Value) -> Result<usize> {
        self.with_rows(|t, rows| {
            t.check_value(col, value)?;
            let column = t.column(col);
            Ok(rows.iter().filter(|&&r| column.get(r) == *value).count())
        })
    }

    fn count_long(&self, col: usize, value: i64) -> Result<usize> {
        self.count_value(col, &Value::Integer(value))
    }

    fn count_float(&self, col: usize, value: f32) -> Result<usize> {
        self.count_value(col, &Value::Float(value))
    }

    fn count_double(&self, col: usize, value: f64) -> Result<usize> {
        self.count_value(col, &Value::Double(value))
    }

    fn count_string(&self, col: usize, value: &str) -> Result<usize> {
        self.count_value(col, &Value::String(value.to_string()))
    }

    // ---------------------------------------------------------------------
    // Aggregates (nulls are skipped)
    // ---------------------------------------------------------------------

    fn sum_long(&self, col: usize) -> Result<i64> {
        self.with_rows(|t, rows| aggregate::sum_long(t, col, rows))
    }

    fn sum_float(&self, col: usize) -> Result<f64> {
        self.with_rows(|t, rows| aggregate::sum_real(t, col, rows, DataType::Float))
    }

    fn sum_double(&self, col: usize) -> Result<f64> {
        self.with_rows(|t, rows| aggregate::sum_real(t, col, rows, DataType::Double))
    }

    fn maximum_long(&self, col: usize) -> Result<Option<i64>> {
        self.with_rows(|t, rows| aggregate::max_integer(t, col, rows, DataType::Integer))
    }

    fn minimum_long(&self, col: usize) -> Result<Option<i64>> {
        self.with_rows(|t, rows| aggregate::min_integer(t, col, rows, DataType::Integer))
    }

    fn maximum_timestamp(&self, col: usize) -> Result<Option<i64>> {
        self.with_rows(|t, rows| aggregate::max_integer(t, col, rows, DataType::Timestamp))
    }

    fn minimum_timestamp(&self, col: usize) -> Result<Option<i64>> {
        self.with_rows(|t, rows| aggregate::min_integer(t, col, rows, DataType::Timestamp))
    }

    fn maximum_float(&self, col: usize) -> Result<Option<f32>> {
        self.with_rows(|t, rows| aggregate::max_float(t, col, rows))
    }

    fn minimum_float(&self, col: usize) -> Result<Option<f32>> {
        self.with_rows(|t, rows| aggregate::min_float(t, col, rows))
    }

    fn maximum_double(&self, col: usize) -> Result<Option<f64>> {
        self.with_rows(|t, rows| aggregate::max_double(t, col, rows))
    }

    fn minimum_double(&self, col: usize) -> Result<Option<f64>> {
        self.with_rows(|t, rows| aggregate::min_double(t, col, rows))
    }

    /// Mean of the non-null values; 0.0 when there are none.
    fn average_long(&self, col: usize) -> Result<f64> {
        self.with_rows(|t, rows| aggregate::average(t, col, rows, DataType::Integer))
    }

    fn average_float(&self, col: usize) -> Result<f64> {
        self.with_rows(|t, rows| aggregate::average(t, col, rows, DataType::Float))
    }

    fn average_double(&self, col: usize) -> Result<f64> {
        self.with_rows(|t, rows| aggregate::average(t, col, rows, DataType::Double))
    }

    /// Ordered array of row objects keyed by column name.
    fn to_json(&self) -> Result<String> {
        self.with_rows(|t, rows| Ok(dump::rows_to_json(t, rows).to_string()))
    }
}

impl sealed::Sealed for Table {
    fn with_rows<R>(&self, f: impl FnOnce(&TableData, &[RowIndex]) -> Result<R>) -> Result<R> {
        self.read_data(|t| {
            let rows: Vec<RowIndex> = (0..t.size()).collect();
            f(t, &rows)
        })
    }
}

impl TableOrView for Table {
    fn table(&self) -> &Table {
        self
    }

    fn size(&self) -> Result<usize> {
        Table::size(self)
    }

    fn source_row_index(&self, row: usize) -> Result<RowIndex> {
        self.read_data(|t| t.check_row(row))?;
        Ok(row)
    }

    /// Uses the column's search index when there is one.
    fn find_first_value(&self, col: usize, value: &Value) -> Result<Option<usize>> {
        self.read_data(|t| {
            t.check_value(col, value)?;
            Ok(t.find_first(col, value))
        })
    }

    fn count_value(&self, col: usize, value: &Value) -> Result<usize> {
        self.read_data(|t| {
            t.check_value(col, value)?;
            Ok(t.find_all(col, value).len())
        })
    }
}
