//! Strata Index - Search index implementations for the Strata table store.
//!
//! A search index accelerates equality lookups on one column. It maps each
//! key to the positions of the rows holding it and is kept in step with row
//! removal and relocation by the table that owns it.
//!
//! # Example
//!
//! ```rust
//! use strata_index::{HashIndex, SearchIndex};
//!
//! let mut index: HashIndex<i64> = HashIndex::new();
//! index.insert(40, 0);
//! index.insert(50, 1);
//! index.insert(40, 2);
//!
//! assert_eq!(index.find_first(&40), Some(0));
//! assert_eq!(index.find_all(&40), vec![0, 2]);
//! ```

#![no_std]

extern crate alloc;

pub mod hash;
pub mod stats;
pub mod traits;

pub use hash::HashIndex;
pub use stats::IndexStats;
pub use traits::SearchIndex;
