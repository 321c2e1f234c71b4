//! Search index trait.
//!
//! Entries map a key to the positions of the rows holding it. Positions are
//! not stable identities, so the index is told whenever rows shift or move.

use alloc::vec::Vec;
use strata_core::RowIndex;

/// Core trait for search index implementations.
pub trait SearchIndex<K> {
    /// Records that `row` holds `key`.
    fn insert(&mut self, key: K, row: RowIndex);

    /// Forgets that `row` holds `key`.
    fn remove(&mut self, key: &K, row: RowIndex);

    /// Lowest row position holding `key`.
    fn find_first(&self, key: &K) -> Option<RowIndex>;

    /// All row positions holding `key`, ascending.
    fn find_all(&self, key: &K) -> Vec<RowIndex>;

    /// Number of rows holding `key`.
    fn count(&self, key: &K) -> usize {
        self.find_all(key).len()
    }

    /// Checks if the index contains a key.
    fn contains_key(&self, key: &K) -> bool {
        self.find_first(key).is_some()
    }

    /// Every position above `removed` moves down by one.
    fn shift_down(&mut self, removed: RowIndex);

    /// The row holding `key` moved from `from` to `to`.
    fn relocate(&mut self, key: &K, from: RowIndex, to: RowIndex);

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries.
    fn clear(&mut self);
}
