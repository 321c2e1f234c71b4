//! Queries, views and aggregates over tables.

pub(crate) mod aggregate;
pub(crate) mod condition;
pub mod pivot;
pub mod sort;
pub mod view;

use crate::row::CheckedRow;
use crate::table::Table;
use crate::table_data::TableData;
use condition::{CompareOp, Condition, TextOp};
use strata_core::pattern_match::Case;
use strata_core::{Error, Result, RowIndex, Value};
use view::{TableView, ViewStep};

pub use pivot::PivotType;
pub use sort::Sort;
pub use view::ViewMode;

/// Conjunction of column predicates over one table.
///
/// Each condition is checked against the column when it is added, so a
/// query that was built successfully only fails later if the table itself
/// goes away or one of its columns is removed. Removing a column moves the
/// later ones down, so the query then fails with [`Error::Invalidated`]
/// instead of reading whatever column took the old position.
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
/// let older = table.query().unwrap().greater_than(1, 45).unwrap();
/// assert_eq!(older.count().unwrap(), 1);
/// assert_eq!(older.find_all().unwrap().get_string(0, 0).unwrap().as_deref(), Some("Susan"));
/// ```
#[derive(Clone, Debug)]
pub struct Query {
    table: Table,
    conditions: Vec<Condition>,
    /// Column layout the conditions were resolved against.
    layout: u64,
}

impl Query {
    pub(crate) fn new(table: Table, layout: u64) -> Self {
        Self {
            table,
            conditions: Vec::new(),
            layout,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    fn with(mut self, build: impl FnOnce(&TableData) -> Result<Condition>) -> Result<Self> {
        let condition = self.table.read_data(|t| {
            self.check_columns(t)?;
            build(t)
        })?;
        self.conditions.push(condition);
        Ok(self)
    }

    fn compare(self, col: usize, op: CompareOp, value: Value) -> Result<Self> {
        self.with(|t| Condition::compare(t, col, op, value))
    }

    pub fn equal_to(self, col: usize, value: impl Into<Value>) -> Result<Self> {
        self.compare(col, CompareOp::Eq, value.into())
    }

    pub fn not_equal_to(self, col: usize, value: impl Into<Value>) -> Result<Self> {
        self.compare(col, CompareOp::Ne, value.into())
    }

    pub fn greater_than(self, col: usize, value: impl Into<Value>) -> Result<Self> {
        self.compare(col, CompareOp::Gt, value.into())
    }

    pub fn greater_than_or_equal(self, col: usize, value: impl Into<Value>) -> Result<Self> {
        self.compare(col, CompareOp::Gte, value.into())
    }

    pub fn less_than(self, col: usize, value: impl Into<Value>) -> Result<Self> {
        self.compare(col, CompareOp::Lt, value.into())
    }

    pub fn less_than_or_equal(self, col: usize, value: impl Into<Value>) -> Result<Self> {
        self.compare(col, CompareOp::Lte, value.into())
    }

    /// Inclusive range.
    pub fn between(self, col: usize, low: impl Into<Value>, high: impl Into<Value>) -> Result<Self> {
        let (low, high) = (low.into(), high.into());
        self.with(|t| Condition::between(t, col, low, high))
    }

    pub fn is_null(self, col: usize) -> Result<Self> {
        self.with(|t| Condition::null(t, col, false))
    }

    pub fn is_not_null(self, col: usize) -> Result<Self> {
        self.with(|t| Condition::null(t, col, true))
    }

    pub fn contains(self, col: usize, needle: &str, case: Case) -> Result<Self> {
        self.with(|t| Condition::text(t, col, TextOp::Contains, needle, case))
    }

    pub fn begins_with(self, col: usize, needle: &str, case: Case) -> Result<Self> {
        self.with(|t| Condition::text(t, col, TextOp::BeginsWith, needle, case))
    }

    pub fn ends_with(self, col: usize, needle: &str, case: Case) -> Result<Self> {
        self.with(|t| Condition::text(t, col, TextOp::EndsWith, needle, case))
    }

    /// Wildcard match: `*` for any run of characters, `?` for exactly one.
    pub fn like(self, col: usize, pattern: &str, case: Case) -> Result<Self> {
        self.with(|t| Condition::text(t, col, TextOp::Like, pattern, case))
    }

    fn step(&self) -> ViewStep {
        ViewStep::Filter(self.conditions.clone())
    }

    fn check_columns(&self, t: &TableData) -> Result<()> {
        if t.layout_version() != self.layout {
            return Err(Error::Invalidated { what: "query" });
        }
        for condition in &self.conditions {
            t.column_def(condition.column())?;
        }
        Ok(())
    }

    fn is_match(&self, t: &TableData, row: RowIndex) -> bool {
        self.conditions.iter().all(|c| c.matches(t, row))
    }

    fn matching(&self, t: &TableData) -> Result<Vec<RowIndex>> {
        self.check_columns(t)?;
        Ok((0..t.size()).filter(|&r| self.is_match(t, r)).collect())
    }

    /// Index of the first matching row.
    pub fn find_first_index(&self) -> Result<Option<RowIndex>> {
        self.table.read_data(|t| {
            self.check_columns(t)?;
            Ok((0..t.size()).find(|&r| self.is_match(t, r)))
        })
    }

    pub fn find_first(&self) -> Result<Option<CheckedRow>> {
        self.find_first_index()?
            .map(|row| self.table.checked_row(row))
            .transpose()
    }

    /// A synced view of every matching row, in table order.
    pub fn find_all(&self) -> Result<TableView> {
        TableView::build(self.table.clone(), vec![self.step()], Some(self.layout))
    }

    pub fn count(&self) -> Result<usize> {
        self.table.read_data(|t| Ok(self.matching(t)?.len()))
    }

    /// Deletes every matching row, returning how many were removed.
    pub fn remove(&self) -> Result<usize> {
        self.table.remove_where(|t| self.matching(t))
    }
}
