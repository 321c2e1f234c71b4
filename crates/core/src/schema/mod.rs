//! Schema definitions: columns and the ordered column list of a table.

mod column;
mod table;

pub use column::ColumnDef;
pub use table::{check_naming_rules, Schema, MAX_NAME_LENGTH};
