//! Engine-level table: schema, typed columns and search indexes.
//!
//! `TableData` knows nothing about transactions or other tables. Link
//! maintenance across tables and primary-key bookkeeping live one level up,
//! in the group state.

use crate::column_store::ColumnData;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use strata_core::schema::{ColumnDef, Schema};
use strata_core::{DataType, Error, Result, RowIndex, Value};
use strata_index::{HashIndex, SearchIndex};
use tracing::trace;

const NO_COLUMN: usize = usize::MAX;

const NO_STAMP: u64 = u64::MAX;

/// Primary-key column resolved for one schema version.
#[derive(Debug)]
pub(crate) struct PrimaryKeyCache {
    stamp: AtomicU64,
    column: AtomicUsize,
}

impl Default for PrimaryKeyCache {
    fn default() -> Self {
        Self {
            stamp: AtomicU64::new(NO_STAMP),
            column: AtomicUsize::new(NO_COLUMN),
        }
    }
}

impl PrimaryKeyCache {
    pub fn get(&self, structural_version: u64) -> Option<Option<usize>> {
        if self.stamp.load(Ordering::Acquire) != structural_version {
            return None;
        }
        let column = self.column.load(Ordering::Acquire);
        Some((column != NO_COLUMN).then_some(column))
    }

    pub fn store(&self, structural_version: u64, column: Option<usize>) {
        self.column.store(column.unwrap_or(NO_COLUMN), Ordering::Release);
        self.stamp.store(structural_version, Ordering::Release);
    }
}

impl Clone for PrimaryKeyCache {
    fn clone(&self) -> Self {
        Self {
            stamp: AtomicU64::new(self.stamp.load(Ordering::Acquire)),
            column: AtomicUsize::new(self.column.load(Ordering::Acquire)),
        }
    }
}

/// Rows, columns and indexes of one table.
#[derive(Clone, Debug)]
pub struct TableData {
    name: Option<String>,
    schema: Schema,
    columns: Vec<ColumnData>,
    indexes: Vec<Option<HashIndex<Value>>>,
    rows: usize,
    /// Bumped on every mutation.
    version: u64,
    /// Bumped on schema and primary-key changes only.
    structural_version: u64,
    /// Bumped when a column removal moves later columns down.
    layout_version: u64,
    pub(crate) pk_cache: PrimaryKeyCache,
}

impl TableData {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            schema: Schema::new(),
            columns: Vec::new(),
            indexes: Vec::new(),
            rows: 0,
            version: 0,
            structural_version: 0,
            layout_version: 0,
            pk_cache: PrimaryKeyCache::default(),
        }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn structural_version(&self) -> u64 {
        self.structural_version
    }

    /// Stamp of the current column positions. Queries and views built
    /// against an older stamp refer to columns that have moved.
    #[inline]
    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    /// Records a content mutation.
    pub fn touch(&mut self, version: u64) {
        self.version = version;
    }

    /// Records a schema or primary-key mutation.
    pub fn touch_structure(&mut self, version: u64) {
        self.version = version;
        self.structural_version = version;
    }

    /// Records a schema change that moved column positions.
    pub fn touch_layout(&mut self, version: u64) {
        self.touch_structure(version);
        self.layout_version = version;
    }

    pub fn column_def(&self, col: usize) -> Result<&ColumnDef> {
        self.schema.column(col)
    }

    pub fn column_name(&self, col: usize) -> Result<&str> {
        Ok(self.schema.column(col)?.name())
    }

    /// Cell storage of a column, unchecked.
    ///
    /// # Panics
    ///
    /// Panics if `col` is out of range.
    #[inline]
    pub fn column(&self, col: usize) -> &ColumnData {
        &self.columns[col]
    }

    pub fn check_row(&self, row: RowIndex) -> Result<()> {
        if row >= self.rows {
            return Err(Error::RowOutOfRange {
                index: row,
                size: self.rows,
            });
        }
        Ok(())
    }

    /// Fails unless `col` is in range and of type `expected`.
    pub fn check_column_type(&self, col: usize, expected: DataType) -> Result<&ColumnDef> {
        let def = self.schema.column(col)?;
        if def.data_type() != expected {
            return Err(Error::column_type_mismatch(
                def.name(),
                expected,
                def.data_type(),
            ));
        }
        Ok(def)
    }

    /// Fails unless `value` may be written into `col`.
    pub fn check_value(&self, col: usize, value: &Value) -> Result<()> {
        let def = self.schema.column(col)?;
        if value.is_null() && !def.data_type().is_link() && def.data_type() != DataType::Mixed {
            if !def.is_nullable() {
                return Err(Error::NullNotAllowed {
                    column: def.name().to_string(),
                });
            }
            return Ok(());
        }
        if !def.accepts(value) {
            return Err(Error::type_mismatch(def.name(), def.data_type(), value));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Schema
    // ---------------------------------------------------------------------

    pub fn add_column(&mut self, def: ColumnDef, max_name_len: usize) -> Result<usize> {
        let column = ColumnData::new(def.data_type(), def.is_nullable(), self.rows);
        let index = self.schema.push(def, max_name_len)?;
        self.columns.push(column);
        self.indexes.push(None);
        Ok(index)
    }

    pub fn remove_column(&mut self, col: usize) -> Result<ColumnDef> {
        let def = self.schema.remove(col)?;
        self.columns.remove(col);
        self.indexes.remove(col);
        if self.columns.is_empty() {
            self.rows = 0;
        }
        Ok(def)
    }

    /// Renames a column, returning the previous name.
    pub fn rename_column(&mut self, col: usize, name: &str, max_name_len: usize) -> Result<String> {
        self.schema.rename(col, name, max_name_len)
    }

    pub fn set_nullable(&mut self, col: usize, nullable: bool) -> Result<()> {
        let def = self.schema.column(col)?;
        if def.data_type().is_link() {
            return Err(Error::unsupported(format!(
                "link column {:?} has no nullability setting",
                def.name()
            )));
        }
        if !nullable {
            self.columns[col].fill_nulls();
            self.rebuild_index(col);
        }
        self.schema.set_nullable(col, nullable)
    }

    // ---------------------------------------------------------------------
    // Search indexes
    // ---------------------------------------------------------------------

    pub fn has_search_index(&self, col: usize) -> Result<bool> {
        self.schema.column(col)?;
        Ok(self.indexes[col].is_some())
    }

    pub fn add_search_index(&mut self, col: usize) -> Result<()> {
        let def = self.schema.column(col)?;
        if !def.data_type().is_indexable() {
            return Err(Error::unsupported(format!(
                "{} column {:?} cannot carry a search index",
                def.data_type(),
                def.name()
            )));
        }
        if self.indexes[col].is_none() {
            self.indexes[col] = Some(HashIndex::new());
            self.rebuild_index(col);
        }
        Ok(())
    }

    pub fn remove_search_index(&mut self, col: usize) -> Result<()> {
        self.schema.column(col)?;
        self.indexes[col] = None;
        Ok(())
    }

    fn rebuild_index(&mut self, col: usize) {
        let column = &self.columns[col];
        if let Some(index) = self.indexes[col].as_mut() {
            index.clear();
            for row in 0..self.rows {
                index.insert(column.get(row), row);
            }
            trace!(
                table = self.name.as_deref().unwrap_or(""),
                col,
                entries = index.stats().total_rows(),
                keys = index.stats().distinct_keys(),
                "search index rebuilt"
            );
        }
    }

    // ---------------------------------------------------------------------
    // Rows
    // ---------------------------------------------------------------------

    /// Appends `count` rows of default cells, returning the first new index.
    pub fn add_rows(&mut self, count: usize) -> Result<RowIndex> {
        if self.columns.is_empty() {
            return Err(Error::invalid_argument(
                "cannot add rows to a table without columns",
            ));
        }
        for column in self.columns.iter_mut() {
            column.try_reserve(count)?;
        }
        let first = self.rows;
        for (col, column) in self.columns.iter_mut().enumerate() {
            let nullable = self.schema.columns()[col].is_nullable();
            column.push_defaults(count, nullable);
            if let Some(index) = self.indexes[col].as_mut() {
                for row in first..first + count {
                    index.insert(column.get(row), row);
                }
            }
        }
        self.rows += count;
        Ok(first)
    }

    /// Removes a row, shifting later rows down by one.
    pub fn remove_row(&mut self, row: RowIndex) -> Result<()> {
        self.check_row(row)?;
        for (column, index) in self.columns.iter_mut().zip(self.indexes.iter_mut()) {
            if let Some(index) = index.as_mut() {
                index.remove(&column.get(row), row);
                index.shift_down(row);
            }
            column.remove(row);
        }
        self.rows -= 1;
        Ok(())
    }

    /// Removes a row by moving the last row into its slot.
    ///
    /// Returns the former position of the moved row, if a row moved.
    pub fn move_last_over(&mut self, row: RowIndex) -> Result<Option<RowIndex>> {
        self.check_row(row)?;
        let last = self.rows - 1;
        for (column, index) in self.columns.iter_mut().zip(self.indexes.iter_mut()) {
            if let Some(index) = index.as_mut() {
                index.remove(&column.get(row), row);
                if row != last {
                    index.relocate(&column.get(last), last, row);
                }
            }
            column.swap_remove(row);
        }
        self.rows -= 1;
        Ok((row != last).then_some(last))
    }

    pub fn clear(&mut self) {
        for (column, index) in self.columns.iter_mut().zip(self.indexes.iter_mut()) {
            column.clear();
            if let Some(index) = index.as_mut() {
                index.clear();
            }
        }
        self.rows = 0;
    }

    // ---------------------------------------------------------------------
    // Cells
    // ---------------------------------------------------------------------

    pub fn get(&self, col: usize, row: RowIndex) -> Result<Value> {
        self.schema.column(col)?;
        self.check_row(row)?;
        Ok(self.columns[col].get(row))
    }

    pub fn is_null(&self, col: usize, row: RowIndex) -> Result<bool> {
        self.schema.column(col)?;
        self.check_row(row)?;
        Ok(self.columns[col].is_null(row))
    }

    /// Writes a cell after bounds and type checks; returns the old value.
    pub fn set(&mut self, col: usize, row: RowIndex, value: Value) -> Result<Value> {
        self.check_value(col, &value)?;
        self.check_row(row)?;
        self.set_unchecked(col, row, value)
    }

    /// Writes a cell without bounds or type checks, keeping any index current.
    pub fn set_unchecked(&mut self, col: usize, row: RowIndex, value: Value) -> Result<Value> {
        let column = &mut self.columns[col];
        let old = column.get(row);
        column.set(row, value)?;
        if let Some(index) = self.indexes[col].as_mut() {
            index.remove(&old, row);
            index.insert(column.get(row), row);
        }
        Ok(old)
    }

    /// First row holding `value` in `col`, using the search index if present.
    pub fn find_first(&self, col: usize, value: &Value) -> Option<RowIndex> {
        match &self.indexes[col] {
            Some(index) => index.find_first(value),
            None => {
                let column = &self.columns[col];
                (0..self.rows).find(|&row| column.get(row) == *value)
            }
        }
    }

    /// Every row holding `value` in `col`, ascending.
    pub fn find_all(&self, col: usize, value: &Value) -> Vec<RowIndex> {
        match &self.indexes[col] {
            Some(index) => index.find_all(value),
            None => {
                let column = &self.columns[col];
                (0..self.rows)
                    .filter(|&row| column.get(row) == *value)
                    .collect()
            }
        }
    }

    /// Fails with a duplicate-key error if any row other than `except`
    /// already holds `value` in `col`.
    pub fn check_unique(&self, col: usize, value: &Value, except: Option<RowIndex>) -> Result<()> {
        let clash = self
            .find_all(col, value)
            .into_iter()
            .any(|row| Some(row) != except);
        if clash {
            return Err(Error::duplicate_key(
                self.schema.columns()[col].name(),
                value.clone(),
            ));
        }
        Ok(())
    }

    /// Fails if `col` holds any value, null included, more than once.
    pub fn check_all_unique(&self, col: usize) -> Result<()> {
        let column = &self.columns[col];
        let mut seen = hashbrown::HashSet::with_capacity(self.rows);
        for row in 0..self.rows {
            let value = column.get(row);
            if !seen.insert(value.clone()) {
                return Err(Error::duplicate_key(
                    self.schema.columns()[col].name(),
                    value,
                ));
            }
        }
        Ok(())
    }

    /// Columns of this table that link into the table named `target`.
    pub fn link_columns_into<'a>(&'a self, target: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.schema
            .columns()
            .iter()
            .enumerate()
            .filter(move |(_, def)| def.link_target() == Some(target))
            .map(|(col, _)| col)
    }

    /// Rewrites link cells of `col`; see [`ColumnData::remap_links`].
    pub fn remap_links(&mut self, col: usize, map: impl Fn(RowIndex) -> Option<RowIndex>) -> bool {
        self.columns[col].remap_links(map)
    }

    /// Replaces the link list of one cell.
    pub fn link_list_mut(&mut self, col: usize, row: RowIndex) -> Result<&mut Vec<RowIndex>> {
        self.check_column_type(col, DataType::LinkList)?;
        self.check_row(row)?;
        match &mut self.columns[col] {
            ColumnData::LinkList(cells) => Ok(&mut cells[row]),
            _ => Err(Error::invalid_argument("not a link-list column")),
        }
    }
}
