//! Group configuration.

use serde::{Deserialize, Serialize};
use strata_core::schema::MAX_NAME_LENGTH;

/// Settings shared by every transaction of a [`SharedGroup`](crate::SharedGroup).
///
/// ```
/// use strata_storage::Config;
///
/// let config = Config::new().index_primary_key(false).max_name_length(32);
/// assert_eq!(config.get_max_name_length(), 32);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    defer_reclamation: bool,
    index_primary_key: bool,
    max_name_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defer_reclamation: true,
            index_primary_key: true,
            max_name_length: MAX_NAME_LENGTH,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand replaced snapshots to the background reclaimer instead of
    /// dropping them on the committing thread.
    pub fn defer_reclamation(mut self, enabled: bool) -> Self {
        self.defer_reclamation = enabled;
        self
    }

    /// Add a search index on a column when it becomes the primary key.
    pub fn index_primary_key(mut self, enabled: bool) -> Self {
        self.index_primary_key = enabled;
        self
    }

    /// Lowers the name length limit. Values above the built-in limit are
    /// clamped to it.
    pub fn max_name_length(mut self, len: usize) -> Self {
        self.max_name_length = len.min(MAX_NAME_LENGTH);
        self
    }

    pub fn get_defer_reclamation(&self) -> bool {
        self.defer_reclamation
    }

    pub fn get_index_primary_key(&self) -> bool {
        self.index_primary_key
    }

    pub fn get_max_name_length(&self) -> usize {
        self.max_name_length.min(MAX_NAME_LENGTH)
    }
}
