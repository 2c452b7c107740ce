//! Per-table configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BOOKMARK_LIMIT, FIRST_BOOKMARK_ID};
use crate::error::{KeyTableError, KeyTableResult};

/// Configuration for a single `KeyTable` instance.
///
/// # Example
///
/// ```rust
/// use keytable_common::config::KeyTableConfig;
///
/// let config = KeyTableConfig::default().with_bookmark_limit(16);
/// assert_eq!(config.bookmark_limit, 16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyTableConfig {
    /// Maximum number of live bookmarks.
    /// Default: 100
    pub bookmark_limit: usize,

    /// Id assigned to the first bookmark. Must be above the reserved
    /// built-in origins.
    /// Default: 3
    pub first_bookmark_id: u32,

    /// Number of rows to pre-allocate room for.
    /// Default: 0
    pub initial_capacity: usize,

    /// Whether to collect operation statistics.
    /// Default: true
    pub collect_stats: bool,
}

impl Default for KeyTableConfig {
    fn default() -> Self {
        Self {
            bookmark_limit: DEFAULT_BOOKMARK_LIMIT,
            first_bookmark_id: FIRST_BOOKMARK_ID,
            initial_capacity: 0,
            collect_stats: true,
        }
    }
}

impl KeyTableConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a small configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            bookmark_limit: 8,
            initial_capacity: 64,
            ..Default::default()
        }
    }

    /// Sets the bookmark limit.
    #[must_use]
    pub fn with_bookmark_limit(mut self, limit: usize) -> Self {
        self.bookmark_limit = limit;
        self
    }

    /// Sets the first bookmark id.
    #[must_use]
    pub fn with_first_bookmark_id(mut self, id: u32) -> Self {
        self.first_bookmark_id = id;
        self
    }

    /// Sets the initial row capacity.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Enables or disables statistics collection.
    #[must_use]
    pub fn with_stats(mut self, enable: bool) -> Self {
        self.collect_stats = enable;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the bookmark limit is zero or the first
    /// bookmark id collides with a reserved origin.
    pub fn validate(&self) -> KeyTableResult<()> {
        if self.bookmark_limit == 0 {
            return Err(KeyTableError::invalid_config(
                "bookmark_limit must be at least 1",
            ));
        }

        if self.first_bookmark_id < FIRST_BOOKMARK_ID {
            return Err(KeyTableError::invalid_config(format!(
                "first_bookmark_id must be at least {FIRST_BOOKMARK_ID}"
            )));
        }

        Ok(())
    }
}
