//! Views: ordered lists of source-row indices over one table.
//!
//! A view remembers the steps that produced it (filter, distinct, sort) and,
//! while synced, replays them whenever the table's version has moved since
//! the rows were last computed. A detached view keeps its rows as they are;
//! once one of them no longer exists in the table every access fails with
//! [`Error::RowOutOfRange`]. Removing a column of the table invalidates the
//! steps of a synced view, since their column positions no longer hold.

use crate::container::{sealed, TableOrView};
use crate::query::condition::Condition;
use crate::query::sort::{self, Sort};
use crate::row::CheckedRow;
use crate::table::Table;
use crate::table_data::TableData;
use hashbrown::HashSet;
use parking_lot::Mutex;
use strata_core::{Error, Result, RowIndex};
use tracing::trace;

/// How a view follows changes to its table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Recomputed before the next access once the table changed.
    #[default]
    Synced,
    /// Frozen at the rows it last held.
    Detached,
}

#[derive(Clone, Debug)]
pub(crate) enum ViewStep {
    Filter(Vec<Condition>),
    Distinct(usize),
    Sort(Vec<(usize, Sort)>),
}

impl ViewStep {
    fn check_columns(&self, t: &TableData) -> Result<()> {
        match self {
            ViewStep::Filter(conditions) => conditions
                .iter()
                .try_for_each(|c| t.column_def(c.column()).map(|_| ())),
            ViewStep::Distinct(col) => t.column_def(*col).map(|_| ()),
            ViewStep::Sort(keys) => keys
                .iter()
                .try_for_each(|&(col, _)| t.column_def(col).map(|_| ())),
        }
    }

    fn apply(&self, t: &TableData, rows: &mut Vec<RowIndex>) {
        match self {
            ViewStep::Filter(conditions) => {
                rows.retain(|&r| conditions.iter().all(|c| c.matches(t, r)));
            }
            ViewStep::Distinct(col) => {
                let column = t.column(*col);
                let mut seen = HashSet::new();
                rows.retain(|&r| seen.insert(column.get(r)));
            }
            ViewStep::Sort(keys) => sort::sort_rows(t, rows, keys),
        }
    }
}

/// Runs `steps` over every row of `t`.
fn evaluate(t: &TableData, steps: &[ViewStep]) -> Result<Vec<RowIndex>> {
    steps.iter().try_for_each(|s| s.check_columns(t))?;
    let mut rows: Vec<RowIndex> = (0..t.size()).collect();
    for step in steps {
        step.apply(t, &mut rows);
    }
    Ok(rows)
}

struct ViewState {
    steps: Vec<ViewStep>,
    mode: ViewMode,
    rows: Vec<RowIndex>,
    version: u64,
    /// Column layout the steps were resolved against.
    layout: u64,
}

impl ViewState {
    /// Brings the rows up to date with `t`, or checks that a detached view's
    /// rows still exist.
    fn refresh(&mut self, t: &TableData) -> Result<()> {
        match self.mode {
            ViewMode::Synced if self.version != t.version() => {
                if self.layout != t.layout_version() {
                    return Err(Error::Invalidated { what: "view" });
                }
                self.rows = evaluate(t, &self.steps)?;
                self.version = t.version();
                trace!(rows = self.rows.len(), version = self.version, "view synced");
                Ok(())
            }
            ViewMode::Synced => Ok(()),
            ViewMode::Detached => match self.rows.iter().find(|&&r| r >= t.size()) {
                Some(&index) => Err(Error::RowOutOfRange {
                    index,
                    size: t.size(),
                }),
                None => Ok(()),
            },
        }
    }

    /// Adds a step and applies it to the current rows.
    fn push(&mut self, t: &TableData, step: ViewStep) -> Result<()> {
        self.refresh(t)?;
        step.check_columns(t)?;
        step.apply(t, &mut self.rows);
        self.steps.push(step);
        Ok(())
    }
}

/// An ordered selection of rows of one table.
///
/// ```
/// use strata_core::DataType;
/// use strata_storage::{Sort, Table, TableOrView};
///
/// let table = Table::new();
/// table.add_column(DataType::Integer, "age", false).unwrap();
/// for age in [40, 26, 50] {
///     table.add_row(vec![age.into()]).unwrap();
/// }
///
/// let view = table.sorted_view(0, Sort::Descending).unwrap();
/// assert_eq!(view.get_long(0, 0).unwrap(), Some(50));
///
/// table.add_row(vec![60.into()]).unwrap();
/// assert_eq!(view.get_long(0, 0).unwrap(), Some(60));
/// ```
pub struct TableView {
    table: Table,
    state: Mutex<ViewState>,
}

impl TableView {
    /// Evaluates `steps` over the table. With `layout` set, the steps were
    /// resolved earlier and are refused if columns have moved since.
    pub(crate) fn build(table: Table, steps: Vec<ViewStep>, layout: Option<u64>) -> Result<Self> {
        let (rows, version, layout) = table.read_data(|t| {
            if matches!(layout, Some(stamp) if stamp != t.layout_version()) {
                return Err(Error::Invalidated { what: "query" });
            }
            Ok((evaluate(t, &steps)?, t.version(), t.layout_version()))
        })?;
        Ok(Self {
            table,
            state: Mutex::new(ViewState {
                steps,
                mode: ViewMode::Synced,
                rows,
                version,
                layout,
            }),
        })
    }

    pub fn mode(&self) -> ViewMode {
        self.state.lock().mode
    }

    /// Switches between following the table and staying frozen.
    pub fn set_mode(&self, mode: ViewMode) {
        self.state.lock().mode = mode;
    }

    /// Recomputes a synced view whose table changed. Returns the table
    /// version the rows correspond to.
    pub fn sync_if_needed(&self) -> Result<u64> {
        self.table.read_data(|t| {
            let mut state = self.state.lock();
            if state.mode == ViewMode::Synced {
                state.refresh(t)?;
            }
            Ok(state.version)
        })
    }

    /// Whether the rows were computed against the current table version.
    pub fn is_in_sync(&self) -> Result<bool> {
        self.table
            .read_data(|t| Ok(self.state.lock().version == t.version()))
    }

    /// Stable sort of the view by one column.
    pub fn sort(&self, col: usize, order: Sort) -> Result<()> {
        self.sort_multi(&[(col, order)])
    }

    /// Stable sort by several columns, first key first.
    pub fn sort_multi(&self, keys: &[(usize, Sort)]) -> Result<()> {
        self.table.read_data(|t| {
            for &(col, _) in keys {
                sort::check_sortable(t, col)?;
            }
            self.state.lock().push(t, ViewStep::Sort(keys.to_vec()))
        })
    }

    /// Keeps the first row of each distinct value of `col`, in view order.
    pub fn distinct(&self, col: usize) -> Result<()> {
        self.table.read_data(|t| {
            sort::check_sortable(t, col)?;
            self.state.lock().push(t, ViewStep::Distinct(col))
        })
    }

    /// Checked accessor for the row at view position `row`.
    pub fn row(&self, row: usize) -> Result<CheckedRow> {
        let source = self.source_row_index(row)?;
        self.table.checked_row(source)
    }

    /// Deletes the table row behind view position `row`.
    pub fn remove(&self, row: usize) -> Result<()> {
        let source = self.source_row_index(row)?;
        self.table.remove(source)?;
        let mut state = self.state.lock();
        if state.mode == ViewMode::Detached {
            state.rows.retain(|&r| r != source);
            for r in state.rows.iter_mut().filter(|r| **r > source) {
                *r -= 1;
            }
        }
        Ok(())
    }

    /// Deletes every table row the view covers.
    pub fn clear(&self) -> Result<()> {
        let rows = self.row_indices()?;
        let removed = self.table.remove_rows(&rows)?;
        let mut state = self.state.lock();
        if state.mode == ViewMode::Detached {
            state.rows.clear();
        }
        trace!(removed, "view cleared");
        Ok(())
    }
}

impl sealed::Sealed for TableView {
    fn with_rows<R>(&self, f: impl FnOnce(&TableData, &[RowIndex]) -> Result<R>) -> Result<R> {
        self.table.read_data(|t| {
            let mut state = self.state.lock();
            state.refresh(t)?;
            f(t, &state.rows)
        })
    }
}

impl TableOrView for TableView {
    fn table(&self) -> &Table {
        &self.table
    }
}

impl core::fmt::Debug for TableView {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (mode, rows) = {
            let state = self.state.lock();
            (state.mode, state.rows.len())
        };
        f.debug_struct("TableView")
            .field("table", &self.table)
            .field("mode", &mode)
            .field("rows", &rows)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{DataType, ErrorKind, Value};

    fn people() -> Table {
        let table = Table::new();
        table.add_column(DataType::String, "name", false).unwrap();
        table.add_column(DataType::Integer, "age", false).unwrap();
        for (name, age) in [("John", 40), ("Susan", 50), ("Greg", 26), ("Ann", 40)] {
            table
                .add_row(vec![name.into(), Value::Integer(age)])
                .unwrap();
        }
        table
    }

    #[test]
    fn test_find_all_follows_table() {
        let table = people();
        let view = table.find_all_long(1, 40).unwrap();
        assert_eq!(view.row_indices().unwrap(), vec![0, 3]);
        table.set_long(1, 2, 40).unwrap();
        assert!(!view.is_in_sync().unwrap());
        assert_eq!(view.size().unwrap(), 3);
        assert!(view.is_in_sync().unwrap());
    }

    #[test]
    fn test_detached_view_stays_frozen() {
        let table = people();
        let view = table.find_all_long(1, 40).unwrap();
        view.set_mode(ViewMode::Detached);
        table.set_long(1, 2, 40).unwrap();
        assert_eq!(view.row_indices().unwrap(), vec![0, 3]);
        table.remove_last().unwrap();
        assert!(matches!(
            view.size(),
            Err(Error::RowOutOfRange { index: 3, size: 3 })
        ));
    }

    #[test]
    fn test_sort_then_distinct() {
        let table = people();
        let view = table.sorted_view(1, Sort::Ascending).unwrap();
        assert_eq!(view.row_indices().unwrap(), vec![2, 0, 3, 1]);
        view.distinct(1).unwrap();
        assert_eq!(view.row_indices().unwrap(), vec![2, 0, 1]);
        view.sort(0, Sort::Descending).unwrap();
        assert_eq!(view.get_string(0, 0).unwrap().as_deref(), Some("Susan"));
        assert_eq!(view.get_string(0, 2).unwrap().as_deref(), Some("Greg"));
    }

    #[test]
    fn test_remove_and_clear_delete_table_rows() {
        let table = people();
        let view = table.find_all_long(1, 40).unwrap();
        view.remove(0).unwrap();
        assert_eq!(table.size().unwrap(), 3);
        assert_eq!(view.size().unwrap(), 1);
        assert_eq!(view.get_string(0, 0).unwrap().as_deref(), Some("Ann"));

        view.clear().unwrap();
        assert_eq!(table.size().unwrap(), 2);
        assert!(view.is_empty().unwrap());
        assert_eq!(table.get_string(0, 0).unwrap().as_deref(), Some("Susan"));
    }

    #[test]
    fn test_detached_remove_patches_rows() {
        let table = people();
        let view = table.sorted_view(1, Sort::Descending).unwrap();
        view.set_mode(ViewMode::Detached);
        view.remove(0).unwrap();
        assert_eq!(view.row_indices().unwrap(), vec![0, 2, 1]);
        assert_eq!(view.get_string(0, 0).unwrap().as_deref(), Some("John"));
    }

    #[test]
    fn test_view_aggregates() {
        let table = people();
        let view = table.find_all_long(1, 40).unwrap();
        assert_eq!(view.sum_long(1).unwrap(), 80);
        assert_eq!(view.average_long(1).unwrap(), 40.0);
        assert_eq!(view.find_first_string(0, "Ann").unwrap(), Some(1));
        assert_eq!(view.row(1).unwrap().index(), 3);
    }

    #[test]
    fn test_unsortable_column() {
        let table = Table::new();
        table.add_column(DataType::Binary, "raw", false).unwrap();
        assert_eq!(
            table.sorted_view(0, Sort::Ascending).unwrap_err().kind(),
            ErrorKind::UnsupportedOperation
        );
    }

    #[test]
    fn test_view_invalidated_with_table() {
        let table = people();
        let view = table.find_all_long(1, 40).unwrap();
        table.clone().close();
        assert_eq!(view.size().unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_column_removal_invalidates_synced_view() {
        let table = people();
        let synced = table.sorted_view(1, Sort::Ascending).unwrap();
        let detached = table.sorted_view(1, Sort::Ascending).unwrap();
        detached.set_mode(ViewMode::Detached);

        table.remove_column(0).unwrap();
        assert!(matches!(
            synced.size(),
            Err(Error::Invalidated { what: "view" })
        ));
        assert_eq!(detached.row_indices().unwrap(), vec![2, 0, 3, 1]);
        assert_eq!(detached.get_long(0, 0).unwrap(), Some(26));
    }

    #[test]
    fn test_debug_alongside_readers_and_writers() {
        let table = people();
        let view = std::sync::Arc::new(table.sorted_view(1, Sort::Ascending).unwrap());
        let printer = {
            let view = view.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    assert!(format!("{:?}", view).contains("Synced"));
                }
            })
        };
        let writer = {
            let (view, table) = (view.clone(), table.clone());
            std::thread::spawn(move || {
                for age in 0..500 {
                    table.set_long(1, 0, age).unwrap();
                    assert_eq!(view.size().unwrap(), 4);
                }
            })
        };
        printer.join().unwrap();
        writer.join().unwrap();
        assert_eq!(view.get_long(1, 3).unwrap(), Some(499));
    }
}
