//! Table handles.
//!
//! A [`Table`] is a cheap, clonable reference to one table of a context. It
//! holds no data itself: every call takes the context lock, resolves the
//! table slot and fails with [`Error::Invalidated`] once the context has
//! ended or the table was removed.

use crate::context::{Context, ContextKind};
use crate::group::{GroupState, RemovePolicy};
use crate::query::pivot::{self, PivotType};
use crate::query::sort::{self, Sort};
use crate::query::view::{TableView, ViewStep};
use crate::query::Query;
use crate::row::{CheckedRow, UncheckedRow};
use crate::table_data::TableData;
use core::fmt;
use std::sync::Arc;
use strata_core::schema::ColumnDef;
use strata_core::{DataType, Error, Result, RowIndex, Value};
use tracing::debug;

/// Handle to a table inside a transaction, or to a standalone table.
///
/// ```
/// use strata_core::DataType;
/// use strata_storage::{Table, TableOrView};
///
/// let table = Table::new();
/// table.add_column(DataType::String, "name", false).unwrap();
/// table.add_column(DataType::Integer, "age", false).unwrap();
/// table.add_row(vec!["John".into(), 40.into()]).unwrap();
/// table.add_row(vec!["Susan".into(), 50.into()]).unwrap();
///
/// assert_eq!(table.find_first_string(0, "Susan").unwrap(), Some(1));
/// assert_eq!(table.sum_long(1).unwrap(), 90);
/// ```
#[derive(Clone)]
pub struct Table {
    ctx: Arc<Context>,
    slot: usize,
}

impl Table {
    /// Creates an anonymous standalone table.
    ///
    /// Standalone tables are always writable but cannot hold a primary key
    /// or link columns.
    pub fn new() -> Self {
        Self::attach(Context::standalone(), 0)
    }

    pub(crate) fn attach(ctx: Arc<Context>, slot: usize) -> Self {
        Self { ctx, slot }
    }

    /// Runs `f` on this table's data under the context read lock.
    pub(crate) fn read_data<R>(&self, f: impl FnOnce(&TableData) -> Result<R>) -> Result<R> {
        self.ctx.read(|g| f(g.table(self.slot)?))
    }

    fn write<R>(&self, f: impl FnOnce(&mut GroupState, usize, u64) -> Result<R>) -> Result<R> {
        self.ctx.write(|g, version| {
            g.table(self.slot)?;
            f(g, self.slot, version)
        })
    }

    fn max_name_length(&self) -> usize {
        self.ctx.config().get_max_name_length()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Whether this handle can still be used. Never fails.
    pub fn is_valid(&self) -> bool {
        self.ctx.read(|g| g.table(self.slot).map(|_| ())).is_ok()
    }

    /// Whether mutations are currently allowed through this handle.
    pub fn is_writable(&self) -> bool {
        self.ctx.is_writable()
    }

    /// Drops the handle. A standalone table is invalidated along with it.
    pub fn close(self) {
        if self.ctx.kind() == ContextKind::Standalone {
            self.ctx.invalidate();
        }
    }

    pub(crate) fn same_context(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.ctx, &other.ctx)
    }

    // ---------------------------------------------------------------------
    // Schema
    // ---------------------------------------------------------------------

    /// Appends a column; existing rows get the column's default value.
    pub fn add_column(&self, data_type: DataType, name: &str, nullable: bool) -> Result<usize> {
        if data_type.is_link() {
            return Err(Error::invalid_argument(
                "link columns are added with add_link_column",
            ));
        }
        let max = self.max_name_length();
        let def = ColumnDef::new(name, data_type).nullable(nullable);
        self.write(|g, slot, version| g.add_column(slot, def, max, version))
    }

    /// Appends a link or link-list column pointing into `target`.
    pub fn add_link_column(&self, data_type: DataType, name: &str, target: &Table) -> Result<usize> {
        if !data_type.is_link() {
            return Err(Error::invalid_argument(format!(
                "{} is not a link type",
                data_type
            )));
        }
        if !self.same_context(target) || self.ctx.kind() == ContextKind::Standalone {
            return Err(Error::invalid_argument(
                "link target must be a table of the same group",
            ));
        }
        let max = self.max_name_length();
        let target_slot = target.slot;
        self.write(|g, slot, version| {
            let target_name = g
                .table(target_slot)?
                .name()
                .map(str::to_string)
                .ok_or_else(|| Error::invalid_argument("link target must be a named table"))?;
            let def = ColumnDef::link(name, data_type, target_name);
            g.add_column(slot, def, max, version)
        })
    }

    /// Removes a column; later columns shift down by one.
    pub fn remove_column(&self, col: usize) -> Result<()> {
        self.write(|g, slot, version| g.remove_column(slot, col, version))
    }

    pub fn rename_column(&self, col: usize, name: &str) -> Result<()> {
        let max = self.max_name_length();
        self.write(|g, slot, version| g.rename_column(slot, col, name, max, version))
    }

    pub fn is_column_nullable(&self, col: usize) -> Result<bool> {
        self.read_data(|t| Ok(t.column_def(col)?.is_nullable()))
    }

    pub fn convert_column_to_nullable(&self, col: usize) -> Result<()> {
        self.write(|g, slot, version| g.set_nullable(slot, col, true, version))
    }

    /// Makes a column non-nullable; null cells take the type default.
    pub fn convert_column_to_not_nullable(&self, col: usize) -> Result<()> {
        self.write(|g, slot, version| g.set_nullable(slot, col, false, version))
    }

    /// Declares the named column as primary key, or clears the key.
    pub fn set_primary_key(&self, column: Option<&str>) -> Result<()> {
        let add_index = self.ctx.config().get_index_primary_key();
        self.write(|g, slot, version| g.set_primary_key(slot, column, add_index, version))
    }

    pub fn set_primary_key_by_index(&self, col: usize) -> Result<()> {
        let name = self.column_name(col)?;
        self.set_primary_key(Some(&name))
    }

    /// Index of the primary-key column, if any.
    pub fn primary_key(&self) -> Result<Option<usize>> {
        self.ctx.read(|g| g.primary_key(self.slot))
    }

    pub fn has_primary_key(&self) -> Result<bool> {
        Ok(self.primary_key()?.is_some())
    }

    pub fn add_search_index(&self, col: usize) -> Result<()> {
        self.write(|g, slot, version| g.set_search_index(slot, col, true, version))
    }

    pub fn remove_search_index(&self, col: usize) -> Result<()> {
        self.write(|g, slot, version| g.set_search_index(slot, col, false, version))
    }

    pub fn has_search_index(&self, col: usize) -> Result<bool> {
        self.read_data(|t| t.has_search_index(col))
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn column_count(&self) -> Result<usize> {
        self.read_data(|t| Ok(t.column_count()))
    }

    pub fn column_name(&self, col: usize) -> Result<String> {
        self.read_data(|t| Ok(t.column_name(col)?.to_string()))
    }

    pub fn column_index(&self, name: &str) -> Result<Option<usize>> {
        self.read_data(|t| Ok(t.schema().index_of(name)))
    }

    pub fn column_type(&self, col: usize) -> Result<DataType> {
        self.read_data(|t| Ok(t.column_def(col)?.data_type()))
    }

    /// The table a link column points into.
    pub fn link_target(&self, col: usize) -> Result<Table> {
        let slot = self.ctx.read(|g| g.link_target_slot(self.slot, col))?;
        Ok(Table::attach(Arc::clone(&self.ctx), slot))
    }

    pub fn size(&self) -> Result<usize> {
        self.read_data(|t| Ok(t.size()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    /// Table name; `None` for standalone tables.
    pub fn name(&self) -> Result<Option<String>> {
        self.read_data(|t| Ok(t.name().map(str::to_string)))
    }

    /// Whether both tables have the same column names, types and link
    /// targets in the same order.
    pub fn has_same_schema(&self, other: &Table) -> Result<bool> {
        let schema = self.read_data(|t| Ok(t.schema().clone()))?;
        other.read_data(|t| Ok(t.schema().same_as(&schema)))
    }

    /// Version stamp of the last mutation of this table.
    pub fn version(&self) -> Result<u64> {
        self.read_data(|t| Ok(t.version()))
    }

    // ---------------------------------------------------------------------
    // Rows
    // ---------------------------------------------------------------------

    pub fn add_empty_row(&self) -> Result<RowIndex> {
        self.add_empty_rows(1)
    }

    /// Appends `count` default rows, returning the index of the first.
    pub fn add_empty_rows(&self, count: usize) -> Result<RowIndex> {
        self.write(|g, slot, version| g.add_empty_rows(slot, count, version))
    }

    /// Appends a row whose primary-key cell is `value`, failing before the
    /// row exists if the value is taken.
    pub fn add_empty_row_with_primary_key(&self, value: impl Into<Value>) -> Result<RowIndex> {
        let value = value.into();
        self.write(|g, slot, version| g.add_row_with_primary_key(slot, value, true, version))
    }

    /// Like [`Table::add_empty_row_with_primary_key`] without the uniqueness
    /// lookup, for imports that validated their keys up front.
    pub fn add_empty_row_with_primary_key_unvalidated(
        &self,
        value: impl Into<Value>,
    ) -> Result<RowIndex> {
        let value = value.into();
        self.write(|g, slot, version| g.add_row_with_primary_key(slot, value, false, version))
    }

    /// Appends a row with one value per column.
    pub fn add_row(&self, values: Vec<Value>) -> Result<RowIndex> {
        self.write(|g, slot, version| g.add_row(slot, values, version))
    }

    /// Removes a row; later rows shift down by one.
    pub fn remove(&self, row: RowIndex) -> Result<()> {
        self.write(|g, slot, version| g.remove_row(slot, row, RemovePolicy::Shift, version))
    }

    pub fn remove_first(&self) -> Result<()> {
        self.remove(0)
    }

    pub fn remove_last(&self) -> Result<()> {
        self.write(|g, slot, version| {
            let size = g.table(slot)?.size();
            if size == 0 {
                return Err(Error::RowOutOfRange { index: 0, size });
            }
            g.remove_row(slot, size - 1, RemovePolicy::Shift, version)
        })
    }

    /// Removes a row by moving the last row into its place.
    pub fn move_last_over(&self, row: RowIndex) -> Result<()> {
        self.write(|g, slot, version| g.remove_row(slot, row, RemovePolicy::MoveLastOver, version))
    }

    /// Removes several rows in one mutation, highest index first.
    pub(crate) fn remove_rows(&self, rows: &[RowIndex]) -> Result<usize> {
        self.remove_where(|_| Ok(rows.to_vec()))
    }

    /// Removes the rows `select` picks from the current data, in the same
    /// mutation that picks them.
    pub(crate) fn remove_where(
        &self,
        select: impl FnOnce(&TableData) -> Result<Vec<RowIndex>>,
    ) -> Result<usize> {
        self.write(|g, slot, version| {
            let mut rows = select(g.table(slot)?)?;
            rows.sort_unstable_by(|a, b| b.cmp(a));
            rows.dedup();
            for &row in &rows {
                g.remove_row(slot, row, RemovePolicy::Shift, version)?;
            }
            Ok(rows.len())
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.write(|g, slot, version| g.clear_table(slot, version))
    }

    // ---------------------------------------------------------------------
    // Cells
    // ---------------------------------------------------------------------

    pub fn get_value(&self, col: usize, row: RowIndex) -> Result<Value> {
        self.read_data(|t| t.get(col, row))
    }

    fn get_typed<T>(
        &self,
        col: usize,
        row: RowIndex,
        expected: DataType,
        extract: impl FnOnce(Value) -> Option<T>,
    ) -> Result<Option<T>> {
        self.read_data(|t| {
            t.check_column_type(col, expected)?;
            t.check_row(row)?;
            Ok(extract(t.column(col).get(row)))
        })
    }

    pub fn get_long(&self, col: usize, row: RowIndex) -> Result<Option<i64>> {
        self.get_typed(col, row, DataType::Integer, |v| v.as_i64())
    }

    pub fn get_boolean(&self, col: usize, row: RowIndex) -> Result<Option<bool>> {
        self.get_typed(col, row, DataType::Boolean, |v| v.as_bool())
    }

    pub fn get_float(&self, col: usize, row: RowIndex) -> Result<Option<f32>> {
        self.get_typed(col, row, DataType::Float, |v| v.as_f32())
    }

    pub fn get_double(&self, col: usize, row: RowIndex) -> Result<Option<f64>> {
        self.get_typed(col, row, DataType::Double, |v| v.as_f64())
    }

    pub fn get_string(&self, col: usize, row: RowIndex) -> Result<Option<String>> {
        self.get_typed(col, row, DataType::String, |v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Milliseconds since the Unix epoch.
    pub fn get_timestamp(&self, col: usize, row: RowIndex) -> Result<Option<i64>> {
        self.get_typed(col, row, DataType::Timestamp, |v| v.as_timestamp())
    }

    pub fn get_binary(&self, col: usize, row: RowIndex) -> Result<Option<Vec<u8>>> {
        self.get_typed(col, row, DataType::Binary, |v| match v {
            Value::Binary(b) => Some(b),
            _ => None,
        })
    }

    pub fn get_link(&self, col: usize, row: RowIndex) -> Result<Option<RowIndex>> {
        self.get_typed(col, row, DataType::Link, |v| v.as_link())
    }

    pub fn get_link_list(&self, col: usize, row: RowIndex) -> Result<Vec<RowIndex>> {
        let list = self.get_typed(col, row, DataType::LinkList, |v| match v {
            Value::LinkList(list) => Some(list),
            _ => None,
        })?;
        Ok(list.unwrap_or_default())
    }

    pub fn is_null(&self, col: usize, row: RowIndex) -> Result<bool> {
        self.read_data(|t| t.is_null(col, row))
    }

    pub fn is_null_link(&self, col: usize, row: RowIndex) -> Result<bool> {
        self.read_data(|t| {
            t.check_column_type(col, DataType::Link)?;
            t.is_null(col, row)
        })
    }

    /// Writes a cell. Writes to the primary-key column are refused when
    /// another row holds the same value.
    pub fn set_value(&self, col: usize, row: RowIndex, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.write(|g, slot, version| g.set_value(slot, col, row, value, true, version))
    }

    pub fn set_long(&self, col: usize, row: RowIndex, value: i64) -> Result<()> {
        self.set_value(col, row, Value::Integer(value))
    }

    pub fn set_boolean(&self, col: usize, row: RowIndex, value: bool) -> Result<()> {
        self.set_value(col, row, Value::Boolean(value))
    }

    pub fn set_float(&self, col: usize, row: RowIndex, value: f32) -> Result<()> {
        self.set_value(col, row, Value::Float(value))
    }

    pub fn set_double(&self, col: usize, row: RowIndex, value: f64) -> Result<()> {
        self.set_value(col, row, Value::Double(value))
    }

    pub fn set_string(&self, col: usize, row: RowIndex, value: &str) -> Result<()> {
        self.set_value(col, row, Value::String(value.to_string()))
    }

    pub fn set_timestamp(&self, col: usize, row: RowIndex, millis: i64) -> Result<()> {
        self.set_value(col, row, Value::Timestamp(millis))
    }

    pub fn set_binary(&self, col: usize, row: RowIndex, value: &[u8]) -> Result<()> {
        self.set_value(col, row, Value::Binary(value.to_vec()))
    }

    pub fn set_null(&self, col: usize, row: RowIndex) -> Result<()> {
        self.set_value(col, row, Value::Null)
    }

    pub fn set_link(&self, col: usize, row: RowIndex, target: RowIndex) -> Result<()> {
        self.set_value(col, row, Value::Link(target))
    }

    pub fn nullify_link(&self, col: usize, row: RowIndex) -> Result<()> {
        self.read_data(|t| t.check_column_type(col, DataType::Link).map(|_| ()))?;
        self.set_value(col, row, Value::Null)
    }

    pub fn add_link_to_list(&self, col: usize, row: RowIndex, target: RowIndex) -> Result<()> {
        self.write(|g, slot, version| g.add_link_to_list(slot, col, row, target, version))
    }

    /// Removes the link at `position` of a link list, returning its target.
    pub fn remove_link_from_list(&self, col: usize, row: RowIndex, position: usize) -> Result<RowIndex> {
        self.write(|g, slot, version| g.remove_link_from_list(slot, col, row, position, version))
    }

    pub fn clear_link_list(&self, col: usize, row: RowIndex) -> Result<()> {
        self.set_value(col, row, Value::LinkList(Vec::new()))
    }

    /// Reads a cell without range or type checks.
    ///
    /// # Panics
    ///
    /// Panics if `col` or `row` is out of range.
    pub(crate) fn get_unchecked(&self, col: usize, row: RowIndex) -> Result<Value> {
        self.read_data(|t| Ok(t.column(col).get(row)))
    }

    /// Writes a cell without range or type checks; key uniqueness and link
    /// bounds are still enforced.
    pub(crate) fn set_unchecked(&self, col: usize, row: RowIndex, value: Value) -> Result<()> {
        self.write(|g, slot, version| g.set_value(slot, col, row, value, false, version))
    }

    // ---------------------------------------------------------------------
    // Row accessors
    // ---------------------------------------------------------------------

    /// A row accessor that validates every access.
    pub fn checked_row(&self, row: RowIndex) -> Result<CheckedRow> {
        self.read_data(|t| t.check_row(row))?;
        Ok(CheckedRow::new(self.clone(), row))
    }

    /// A row accessor that skips validation.
    pub fn unchecked_row(&self, row: RowIndex) -> UncheckedRow {
        UncheckedRow::new(self.clone(), row)
    }

    // ---------------------------------------------------------------------
    // Queries and views
    // ---------------------------------------------------------------------

    pub fn query(&self) -> Result<Query> {
        let layout = self.read_data(|t| Ok(t.layout_version()))?;
        Ok(Query::new(self.clone(), layout))
    }

    pub fn find_all_long(&self, col: usize, value: i64) -> Result<TableView> {
        self.query()?.equal_to(col, value)?.find_all()
    }

    pub fn find_all_boolean(&self, col: usize, value: bool) -> Result<TableView> {
        self.query()?.equal_to(col, value)?.find_all()
    }

    pub fn find_all_float(&self, col: usize, value: f32) -> Result<TableView> {
        self.query()?.equal_to(col, value)?.find_all()
    }

    pub fn find_all_double(&self, col: usize, value: f64) -> Result<TableView> {
        self.query()?.equal_to(col, value)?.find_all()
    }

    pub fn find_all_string(&self, col: usize, value: &str) -> Result<TableView> {
        self.query()?.equal_to(col, value)?.find_all()
    }

    pub fn find_all_timestamp(&self, col: usize, millis: i64) -> Result<TableView> {
        self.query()?.equal_to(col, Value::Timestamp(millis))?.find_all()
    }

    /// A view keeping the first row of each distinct value of `col`.
    pub fn distinct_view(&self, col: usize) -> Result<TableView> {
        self.read_data(|t| sort::check_sortable(t, col))?;
        TableView::build(self.clone(), vec![ViewStep::Distinct(col)], None)
    }

    pub fn sorted_view(&self, col: usize, order: Sort) -> Result<TableView> {
        self.sorted_view_multi(&[(col, order)])
    }

    /// A view of all rows sorted by several columns, first key first.
    pub fn sorted_view_multi(&self, keys: &[(usize, Sort)]) -> Result<TableView> {
        self.read_data(|t| keys.iter().try_for_each(|&(col, _)| sort::check_sortable(t, col)))?;
        TableView::build(self.clone(), vec![ViewStep::Sort(keys.to_vec())], None)
    }

    /// First position whose value is not less than `value`. The column must
    /// already be sorted ascending.
    pub fn lower_bound_long(&self, col: usize, value: i64) -> Result<usize> {
        self.read_data(|t| {
            let cells = integer_cells(t, col)?;
            Ok(cells.partition_point(|c| c.map_or(true, |x| x < value)))
        })
    }

    /// First position whose value is greater than `value`. The column must
    /// already be sorted ascending.
    pub fn upper_bound_long(&self, col: usize, value: i64) -> Result<usize> {
        self.read_data(|t| {
            let cells = integer_cells(t, col)?;
            Ok(cells.partition_point(|c| c.map_or(true, |x| x <= value)))
        })
    }

    /// Groups rows by a string column and aggregates an integer column per
    /// group into a new standalone table.
    pub fn pivot(&self, group_col: usize, value_col: usize, op: PivotType) -> Result<Table> {
        let groups = self.read_data(|t| pivot::compute(t, group_col, value_col, op))?;
        let result = groups.into_table()?;
        debug!(groups = result.size()?, ?op, "pivot computed");
        Ok(result)
    }

    fn describe(&self) -> Result<String> {
        let key = self.primary_key()?;
        self.read_data(|t| {
            let mut out = String::from("The Table");
            if let Some(name) = t.name() {
                out.push(' ');
                out.push_str(name);
            }
            if let Some(key) = key {
                out.push_str(&format!(
                    " has '{}' field as a PrimaryKey, and",
                    t.column_name(key)?
                ));
            }
            let names: Vec<&str> = t.schema().columns().iter().map(ColumnDef::name).collect();
            out.push_str(&format!(
                " contains {} columns: {}. And {} rows.",
                t.column_count(),
                names.join(", "),
                t.size()
            ));
            Ok(out)
        })
    }
}

fn integer_cells(t: &TableData, col: usize) -> Result<&[Option<i64>]> {
    let def = t.check_column_type(col, DataType::Integer)?;
    t.column(col).as_integers().ok_or_else(|| {
        Error::column_type_mismatch(def.name(), DataType::Integer, t.column(col).data_type())
    })
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("slot", &self.slot)
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// One-line summary: name, primary key, columns and row count.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.describe() {
            Ok(summary) => f.write_str(&summary),
            Err(_) => f.write_str("The Table is no longer valid."),
        }
    }
}
