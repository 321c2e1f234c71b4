//! Index statistics.

/// Entry counts kept alongside an index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Total number of (key, row) entries.
    total_rows: usize,
    /// Number of distinct keys.
    distinct_keys: usize,
}

impl IndexStats {
    /// Creates a new empty stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    #[inline]
    pub fn distinct_keys(&self) -> usize {
        self.distinct_keys
    }

    pub(crate) fn add_rows(&mut self, count: usize) {
        self.total_rows += count;
    }

    pub(crate) fn remove_rows(&mut self, count: usize) {
        self.total_rows = self.total_rows.saturating_sub(count);
    }

    pub(crate) fn set_distinct_keys(&mut self, count: usize) {
        self.distinct_keys = count;
    }

    /// Resets both counters.
    pub(crate) fn clear(&mut self) {
        self.total_rows = 0;
        self.distinct_keys = 0;
    }
}
