//! Ordered column list of a table.

use super::column::ColumnDef;
use crate::error::{Error, Result};

/// Longest column or table name accepted.
pub const MAX_NAME_LENGTH: usize = 63;

/// Validates a column or table name.
pub fn check_naming_rules(name: &str, max_len: usize) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name(name, "name cannot be empty"));
    }
    if name.chars().count() > max_len {
        return Err(Error::invalid_name(
            name,
            format!("names are limited to {} characters", max_len),
        ));
    }
    Ok(())
}

/// The ordered columns of one table.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a column by position, failing when out of range.
    pub fn column(&self, index: usize) -> Result<&ColumnDef> {
        self.columns.get(index).ok_or(Error::ColumnOutOfRange {
            index,
            count: self.columns.len(),
        })
    }

    /// Gets a column index by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Appends a column after validating its name; returns its index.
    pub fn push(&mut self, column: ColumnDef, max_name_len: usize) -> Result<usize> {
        check_naming_rules(column.name(), max_name_len)?;
        if self.index_of(column.name()).is_some() {
            return Err(Error::invalid_name(column.name(), "column already exists"));
        }
        self.columns.push(column);
        Ok(self.columns.len() - 1)
    }

    /// Removes the column at `index`, shifting later columns down.
    pub fn remove(&mut self, index: usize) -> Result<ColumnDef> {
        self.column(index)?;
        Ok(self.columns.remove(index))
    }

    /// Renames a column and returns its previous name.
    pub fn rename(&mut self, index: usize, name: &str, max_name_len: usize) -> Result<String> {
        check_naming_rules(name, max_name_len)?;
        let current = self.column(index)?.name().to_string();
        if current == name {
            return Ok(current);
        }
        if self.index_of(name).is_some() {
            return Err(Error::invalid_name(name, "column already exists"));
        }
        self.columns[index].set_name(name.to_string());
        Ok(current)
    }

    /// Changes the nullability flag of a column.
    pub fn set_nullable(&mut self, index: usize, nullable: bool) -> Result<()> {
        self.column(index)?;
        self.columns[index].set_nullable(nullable);
        Ok(())
    }

    /// Compares column names, types and link targets in order.
    pub fn same_as(&self, other: &Schema) -> bool {
        self.columns == other.columns
    }
}
