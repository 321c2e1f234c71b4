//! Strata Storage - Transactional columnar table storage.
//!
//! This crate provides the table layer of Strata:
//!
//! - `SharedGroup`: A set of named tables with one writer and any number of
//!   snapshot readers (`ReadTransaction`, `WriteTransaction`)
//! - `Table`: Typed cell access, schema changes, primary keys, links and
//!   search indexes, valid only while its transaction is open
//! - `CheckedRow` / `UncheckedRow`: Row accessors over a table handle
//! - `Query` and `TableView`: Filtered, sorted and distinct row selections
//! - `TableOrView`: Lookups, aggregates and JSON output shared by both
//! - `runtime`: Process-wide reclaimer for retired snapshots
//!
//! # Example
//!
//! ```rust
//! use strata_core::DataType;
//! use strata_storage::{SharedGroup, TableOrView};
//!
//! let group = SharedGroup::new().unwrap();
//!
//! let tx = group.begin_write().unwrap();
//! let people = tx.add_table("people").unwrap();
//! people.add_column(DataType::String, "name", false).unwrap();
//! people.add_column(DataType::Integer, "age", false).unwrap();
//! people.set_primary_key(Some("name")).unwrap();
//! people.add_row(vec!["John".into(), 40.into()]).unwrap();
//! people.add_row(vec!["Susan".into(), 50.into()]).unwrap();
//! assert!(people.add_row(vec!["John".into(), 41.into()]).is_err());
//! tx.commit().unwrap();
//!
//! // Handles from a finished transaction are no longer usable.
//! assert!(people.size().is_err());
//!
//! let rx = group.begin_read();
//! let people = rx.get_table("people").unwrap();
//! assert_eq!(people.size().unwrap(), 2);
//! assert_eq!(people.sum_long(1).unwrap(), 90);
//! ```

mod column_store;
mod config;
mod container;
mod context;
mod dump;
mod group;
pub mod query;
mod registry;
mod row;
pub mod runtime;
mod table;
mod table_data;
mod transaction;

pub use config::Config;
pub use container::TableOrView;
pub use query::{PivotType, Query, Sort, ViewMode};
pub use query::view::TableView;
pub use registry::{is_meta_table, METADATA_TABLE, PRIMARY_KEY_TABLE};
pub use row::{CheckedRow, UncheckedRow};
pub use strata_core::pattern_match::Case;
pub use strata_core::{DataType, Error, ErrorKind, Result, RowIndex, Value};
pub use table::Table;
pub use transaction::{
    ReadTransaction, SharedGroup, TransactionId, TransactionState, WriteTransaction,
};
