//! Hash index implementation.
//!
//! Point lookups in O(1); range queries are not supported.

use crate::stats::IndexStats;
use crate::traits::SearchIndex;
use alloc::vec::Vec;
use hashbrown::HashMap;
use strata_core::RowIndex;

/// A hash-based search index.
///
/// Each key maps to the sorted positions of the rows holding it, so the
/// first match of a lookup is the lowest row index.
#[derive(Clone, Debug)]
pub struct HashIndex<K> {
    /// The underlying map from keys to row positions.
    map: HashMap<K, Vec<RowIndex>>,
    /// Statistics for this index.
    stats: IndexStats,
}

impl<K: Eq + core::hash::Hash + Clone> HashIndex<K> {
    /// Creates a new hash index.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            stats: IndexStats::new(),
        }
    }

    /// Builds an index from `(key, row)` pairs.
    pub fn from_entries(entries: impl IntoIterator<Item = (K, RowIndex)>) -> Self {
        let mut index = Self::new();
        for (key, row) in entries {
            index.insert(key, row);
        }
        index
    }

    /// Returns the statistics for this index.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    fn refresh_distinct(&mut self) {
        let keys = self.map.len();
        self.stats.set_distinct_keys(keys);
    }
}

impl<K: Eq + core::hash::Hash + Clone> Default for HashIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + core::hash::Hash + Clone> SearchIndex<K> for HashIndex<K> {
    fn insert(&mut self, key: K, row: RowIndex) {
        let rows = self.map.entry(key).or_default();
        if let Err(pos) = rows.binary_search(&row) {
            rows.insert(pos, row);
            self.stats.add_rows(1);
        }
        self.refresh_distinct();
    }

    fn remove(&mut self, key: &K, row: RowIndex) {
        if let Some(rows) = self.map.get_mut(key) {
            if let Ok(pos) = rows.binary_search(&row) {
                rows.remove(pos);
                self.stats.remove_rows(1);
            }
            if rows.is_empty() {
                self.map.remove(key);
            }
        }
        self.refresh_distinct();
    }

    fn find_first(&self, key: &K) -> Option<RowIndex> {
        self.map.get(key).and_then(|rows| rows.first().copied())
    }

    fn find_all(&self, key: &K) -> Vec<RowIndex> {
        self.map.get(key).cloned().unwrap_or_default()
    }

    fn count(&self, key: &K) -> usize {
        self.map.get(key).map(|rows| rows.len()).unwrap_or(0)
    }

    fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn shift_down(&mut self, removed: RowIndex) {
        for rows in self.map.values_mut() {
            for row in rows.iter_mut() {
                if *row > removed {
                    *row -= 1;
                }
            }
        }
    }

    fn relocate(&mut self, key: &K, from: RowIndex, to: RowIndex) {
        if let Some(rows) = self.map.get_mut(key) {
            if let Ok(pos) = rows.binary_search(&from) {
                rows.remove(pos);
                if let Err(pos) = rows.binary_search(&to) {
                    rows.insert(pos, to);
                } else {
                    self.stats.remove_rows(1);
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.stats.total_rows()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_hash_index_lookup() {
        let mut index: HashIndex<i64> = HashIndex::new();
        index.insert(1, 5);
        index.insert(1, 2);
        index.insert(2, 3);

        assert_eq!(index.find_first(&1), Some(2));
        assert_eq!(index.find_all(&1), vec![2, 5]);
        assert_eq!(index.count(&2), 1);
        assert_eq!(index.find_first(&3), None);
        assert_eq!(index.len(), 3);
        assert_eq!(index.stats().distinct_keys(), 2);
    }

    #[test]
    fn test_hash_index_remove() {
        let mut index: HashIndex<i64> = HashIndex::new();
        index.insert(1, 0);
        index.insert(1, 1);

        index.remove(&1, 0);
        assert_eq!(index.find_all(&1), vec![1]);

        index.remove(&1, 1);
        assert!(!index.contains_key(&1));
        assert!(index.is_empty());
    }

    #[test]
    fn test_hash_index_shift_down() {
        let mut index: HashIndex<&str> = HashIndex::new();
        index.insert("a", 0);
        index.insert("b", 1);
        index.insert("c", 2);

        index.remove(&"b", 1);
        index.shift_down(1);

        assert_eq!(index.find_first(&"a"), Some(0));
        assert_eq!(index.find_first(&"c"), Some(1));
    }

    #[test]
    fn test_hash_index_relocate() {
        let mut index: HashIndex<&str> = HashIndex::new();
        index.insert("a", 0);
        index.insert("b", 1);
        index.insert("c", 2);

        // move_last_over(0): "c" takes the slot of "a"
        index.remove(&"a", 0);
        index.relocate(&"c", 2, 0);

        assert_eq!(index.find_first(&"c"), Some(0));
        assert_eq!(index.find_first(&"b"), Some(1));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_hash_index_clear() {
        let mut index: HashIndex<i64> = HashIndex::from_entries([(1, 0), (2, 1)]);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }
}
