//! Primary-key registry.
//!
//! Every group carries a reserved table named `pk` with one row per keyed
//! table: `pk_table` holds the table name, `pk_property` the key column
//! name. A table without a row has no primary key.

use crate::table_data::TableData;
use strata_core::schema::{ColumnDef, MAX_NAME_LENGTH};
use strata_core::{DataType, Error, Result, Value};

/// Name of the reserved registry table.
pub const PRIMARY_KEY_TABLE: &str = "pk";

/// Name of the reserved metadata table.
pub const METADATA_TABLE: &str = "metadata";

const TABLE_COLUMN: usize = 0;
const PROPERTY_COLUMN: usize = 1;

/// Whether `name` is reserved for group bookkeeping.
pub fn is_meta_table(name: &str) -> bool {
    name == PRIMARY_KEY_TABLE || name == METADATA_TABLE
}

#[derive(Clone, Debug)]
pub(crate) struct PrimaryKeyRegistry {
    table: TableData,
}

impl PrimaryKeyRegistry {
    pub fn new() -> Result<Self> {
        let mut table = TableData::new(Some(PRIMARY_KEY_TABLE.to_string()));
        table.add_column(ColumnDef::new("pk_table", DataType::String), MAX_NAME_LENGTH)?;
        table.add_column(
            ColumnDef::new("pk_property", DataType::String),
            MAX_NAME_LENGTH,
        )?;
        table.add_search_index(TABLE_COLUMN)?;
        Ok(Self { table })
    }

    fn row_of(&self, table_name: &str) -> Option<usize> {
        self.table
            .find_first(TABLE_COLUMN, &Value::String(table_name.to_string()))
    }

    /// Key column name registered for `table_name`.
    pub fn lookup(&self, table_name: &str) -> Option<String> {
        let row = self.row_of(table_name)?;
        match self.table.column(PROPERTY_COLUMN).get(row) {
            Value::String(property) => Some(property),
            _ => None,
        }
    }

    /// Registers `property` as the key of `table_name`, or clears the entry.
    pub fn set(&mut self, table_name: &str, property: Option<&str>) -> Result<()> {
        match (self.row_of(table_name), property) {
            (Some(row), Some(property)) => {
                self.table
                    .set(PROPERTY_COLUMN, row, Value::from(property))?;
            }
            (Some(row), None) => self.table.remove_row(row)?,
            (None, Some(property)) => {
                let row = self.table.add_rows(1)?;
                self.table.set(TABLE_COLUMN, row, Value::from(table_name))?;
                self.table
                    .set(PROPERTY_COLUMN, row, Value::from(property))?;
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// Points an existing entry at a renamed key column.
    pub fn rename_property(&mut self, table_name: &str, property: &str) -> Result<()> {
        let row = self.row_of(table_name).ok_or_else(|| {
            Error::constraint_violation(format!(
                "no primary key registered for table {:?}",
                table_name
            ))
        })?;
        self.table
            .set(PROPERTY_COLUMN, row, Value::from(property))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.table.size()
    }
}
