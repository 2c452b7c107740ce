//! The thread-safe table handle.

use std::sync::Arc;

use parking_lot::Mutex;

use keytable_common::config::KeyTableConfig;
use keytable_common::error::KeyTableResult;
use keytable_common::types::{BookmarkId, RowKey, SortColumn};

use crate::bookmark::BookmarkPosition;
use crate::collate::SortKeyCollator;
use crate::cursor::{CursorPosition, SeekOrigin, SeekOutcome};
use crate::row::{RowComparator, RowSnapshot};
use crate::stats::TableStats;
use crate::tree::{PartialUpdate, TableInner, Upsert};

/// A sorted live table.
///
/// Every method takes the table lock once and runs to completion; readers
/// and writers fully serialize. Independent tables share nothing.
///
/// # Example
///
/// ```rust
/// use keytable_core::{CursorPosition, KeyTable, SeekOrigin};
/// use keytable_common::types::{RowKey, SortColumn};
///
/// let table = KeyTable::new();
/// table.upsert(RowKey::new(1, 0), vec![SortColumn::unsigned(30)], false).unwrap();
/// table.upsert(RowKey::new(2, 0), vec![SortColumn::unsigned(10)], false).unwrap();
///
/// table.seek(SeekOrigin::Start, 0).unwrap();
/// assert_eq!(table.cursor_position(), CursorPosition::Row(RowKey::new(2, 0)));
/// assert_eq!(table.row_count(), (2, 0));
/// ```
pub struct KeyTable {
    inner: Mutex<TableInner>,
}

impl KeyTable {
    /// Creates an empty table with the default configuration.
    pub fn new() -> Self {
        Self::build(KeyTableConfig::default(), RowComparator::default())
    }

    /// Creates an empty table with the given configuration.
    pub fn with_config(config: KeyTableConfig) -> KeyTableResult<Self> {
        config.validate()?;
        Ok(Self::build(config, RowComparator::default()))
    }

    /// Creates an empty table that orders string columns with `collator`.
    pub fn with_collator(
        config: KeyTableConfig,
        collator: Arc<dyn SortKeyCollator>,
    ) -> KeyTableResult<Self> {
        config.validate()?;
        Ok(Self::build(config, RowComparator::new(collator)))
    }

    fn build(config: KeyTableConfig, comparator: RowComparator) -> Self {
        tracing::debug!(
            "Creating key table (bookmark limit {}, capacity {})",
            config.bookmark_limit,
            config.initial_capacity
        );
        Self {
            inner: Mutex::new(TableInner::new(config, comparator)),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Inserts a row, or re-sorts it if the key exists.
    ///
    /// An existing row whose sort key compares equal is left in place
    /// (hidden flag included) and reported as modified.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for the reserved empty key, `OutOfMemory` if the
    /// row cannot be allocated. The table is unchanged on error.
    pub fn upsert(
        &self,
        key: RowKey,
        columns: Vec<SortColumn>,
        hidden: bool,
    ) -> KeyTableResult<Upsert> {
        self.inner.lock().upsert(key, columns, hidden)
    }

    /// Removes a row. Bookmarks on it are dropped; a cursor on it moves to
    /// the next row.
    pub fn delete(&self, key: RowKey) -> KeyTableResult<()> {
        self.inner.lock().delete(key)
    }

    /// Replaces one sort column of a row and re-sorts it.
    pub fn update_partial_sort_key(
        &self,
        key: RowKey,
        column_index: usize,
        column: SortColumn,
    ) -> KeyTableResult<PartialUpdate> {
        self.inner
            .lock()
            .update_partial_sort_key(key, column_index, column)
    }

    /// Removes every row and bookmark.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    /// Moves the cursor to the next row, hidden rows included.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) {
        self.inner.lock().next();
    }

    /// Moves the cursor to the previous row, hidden rows included.
    pub fn prev(&self) {
        self.inner.lock().prev();
    }

    /// Moves the cursor `offset` visible rows away from `origin`, clamped
    /// to the table.
    ///
    /// # Errors
    ///
    /// `InvalidBookmark` if the origin is an unknown bookmark.
    pub fn seek(&self, origin: SeekOrigin, offset: i64) -> KeyTableResult<SeekOutcome> {
        self.inner.lock().seek(origin, offset)
    }

    /// Moves the cursor onto a row by key.
    pub fn seek_id(&self, key: RowKey) -> KeyTableResult<()> {
        self.inner.lock().seek_id(key)
    }

    /// Moves the cursor to the first row whose sort key is not less than
    /// `columns`, or past the end.
    pub fn lower_bound(&self, columns: &[SortColumn]) {
        self.inner.lock().lower_bound(columns);
    }

    /// Finds a row with exactly this sort key. The cursor does not move.
    pub fn find(&self, columns: &[SortColumn]) -> Option<RowKey> {
        self.inner.lock().find(columns)
    }

    /// Returns where the cursor is.
    pub fn cursor_position(&self) -> CursorPosition {
        self.inner.lock().cursor_position()
    }

    /// Returns the number of visible rows before the cursor.
    pub fn current_rank(&self) -> u32 {
        self.inner.lock().current_rank()
    }

    /// Returns the visible row count and the cursor rank in one call.
    pub fn row_count(&self) -> (u32, u32) {
        let inner = self.inner.lock();
        (inner.visible_count(), inner.current_rank())
    }

    /// Reads up to `max` keys from the cursor onward.
    ///
    /// With `advance` unset the cursor is restored afterwards.
    pub fn query_rows(
        &self,
        max: usize,
        backward: bool,
        include_hidden: bool,
        advance: bool,
    ) -> Vec<RowKey> {
        self.inner
            .lock()
            .query_rows(max, backward, include_hidden, advance)
    }

    /// Returns the nearest visible row before `key`.
    pub fn get_previous_row(&self, key: RowKey) -> KeyTableResult<Option<RowKey>> {
        self.inner.lock().get_previous_row(key)
    }

    // =========================================================================
    // Bookmarks
    // =========================================================================

    /// Saves the cursor position.
    ///
    /// # Errors
    ///
    /// `ResourceExhausted` once the configured number of bookmarks is live.
    pub fn create_bookmark(&self) -> KeyTableResult<BookmarkId> {
        self.inner.lock().create_bookmark()
    }

    /// Returns the bookmark's current rank and whether it drifted.
    pub fn resolve_bookmark(&self, id: BookmarkId) -> KeyTableResult<BookmarkPosition> {
        self.inner.lock().resolve_bookmark(id)
    }

    /// Forgets a bookmark.
    pub fn free_bookmark(&self, id: BookmarkId) -> KeyTableResult<()> {
        self.inner.lock().free_bookmark(id)
    }

    /// Returns the number of live bookmarks.
    pub fn bookmark_count(&self) -> usize {
        self.inner.lock().bookmarks.len()
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Collapses the category headed by `key`. Returns the hidden keys.
    pub fn hide_from(&self, key: RowKey) -> KeyTableResult<Vec<RowKey>> {
        self.inner.lock().hide_from(key)
    }

    /// Expands one level of the category headed by `key`. Returns the
    /// unhidden keys.
    ///
    /// # Errors
    ///
    /// `NotFound` if `key` is unknown or itself hidden.
    pub fn unhide_from(&self, key: RowKey) -> KeyTableResult<Vec<RowKey>> {
        self.inner.lock().unhide_from(key)
    }

    /// Lists `key` and every row after it sharing its sort key as a prefix.
    pub fn rows_by_prefix(&self, key: RowKey) -> KeyTableResult<Vec<RowKey>> {
        self.inner.lock().rows_by_prefix(key)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Returns a copy of a row.
    pub fn get_row(&self, key: RowKey) -> KeyTableResult<RowSnapshot> {
        self.inner.lock().get_row(key)
    }

    /// Returns true if a row with this key exists.
    pub fn contains(&self, key: RowKey) -> bool {
        self.inner.lock().contains(key)
    }

    /// Returns the number of visible rows.
    pub fn visible_count(&self) -> u32 {
        self.inner.lock().visible_count()
    }

    /// Returns the number of rows, hidden ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().arena.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Estimates the bytes held by the table.
    pub fn memory_usage(&self) -> usize {
        self.inner.lock().memory_usage()
    }

    /// Checks every structural invariant.
    ///
    /// # Errors
    ///
    /// `Corrupted` describing the first violation found.
    pub fn verify(&self) -> KeyTableResult<()> {
        self.inner.lock().verify()
    }

    /// Returns a snapshot of the table statistics.
    pub fn stats(&self) -> TableStats {
        self.inner.lock().stats.clone()
    }

    /// Returns the table configuration.
    pub fn config(&self) -> KeyTableConfig {
        self.inner.lock().config.clone()
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("KeyTable")
            .field("rows", &inner.arena.len())
            .field("visible", &inner.visible_count())
            .field("bookmarks", &inner.bookmarks.len())
            .finish()
    }
}
