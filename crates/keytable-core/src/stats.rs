//! Table statistics for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for table operations.
///
/// A disabled instance ignores every `record_*` call.
#[derive(Debug)]
pub struct TableStats {
    enabled: bool,
    /// Rows inserted under a new key.
    rows_added: AtomicU64,
    /// Rows re-sorted under an existing key.
    rows_modified: AtomicU64,
    /// Upserts whose sort key was unchanged.
    noop_updates: AtomicU64,
    /// Rows removed by `delete`. A re-sort counts as a modification only.
    rows_deleted: AtomicU64,
    /// Single AVL rotations.
    rotations: AtomicU64,
    /// Rank seeks.
    seeks: AtomicU64,
    /// Rows hidden by category collapse.
    rows_hidden: AtomicU64,
    /// Rows unhidden by category expand.
    rows_unhidden: AtomicU64,
    /// Bookmarks created.
    bookmarks_created: AtomicU64,
}

impl Default for TableStats {
    fn default() -> Self {
        Self::with_enabled(true)
    }
}

impl TableStats {
    /// Creates new, enabled statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates statistics that may ignore every record call.
    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            rows_added: AtomicU64::new(0),
            rows_modified: AtomicU64::new(0),
            noop_updates: AtomicU64::new(0),
            rows_deleted: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            seeks: AtomicU64::new(0),
            rows_hidden: AtomicU64::new(0),
            rows_unhidden: AtomicU64::new(0),
            bookmarks_created: AtomicU64::new(0),
        }
    }

    /// Returns true if recording is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    fn bump(&self, counter: &AtomicU64, n: u64) {
        if self.enabled {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    /// Records a row insertion.
    #[inline]
    pub fn record_add(&self) {
        self.bump(&self.rows_added, 1);
    }

    /// Records a re-sort of an existing row.
    #[inline]
    pub fn record_modify(&self) {
        self.bump(&self.rows_modified, 1);
    }

    /// Records an upsert that left the row in place.
    #[inline]
    pub fn record_noop(&self) {
        self.bump(&self.noop_updates, 1);
    }

    /// Records a row deletion.
    #[inline]
    pub fn record_delete(&self) {
        self.bump(&self.rows_deleted, 1);
    }

    /// Records a rotation.
    #[inline]
    pub fn record_rotation(&self) {
        self.bump(&self.rotations, 1);
    }

    /// Records a seek.
    #[inline]
    pub fn record_seek(&self) {
        self.bump(&self.seeks, 1);
    }

    /// Records rows hidden by a collapse.
    #[inline]
    pub fn record_hidden(&self, n: usize) {
        self.bump(&self.rows_hidden, n as u64);
    }

    /// Records rows unhidden by an expand.
    #[inline]
    pub fn record_unhidden(&self, n: usize) {
        self.bump(&self.rows_unhidden, n as u64);
    }

    /// Records a bookmark creation.
    #[inline]
    pub fn record_bookmark(&self) {
        self.bump(&self.bookmarks_created, 1);
    }

    /// Returns rows added.
    pub fn rows_added(&self) -> u64 {
        self.rows_added.load(Ordering::Relaxed)
    }

    /// Returns rows modified.
    pub fn rows_modified(&self) -> u64 {
        self.rows_modified.load(Ordering::Relaxed)
    }

    /// Returns no-op updates.
    pub fn noop_updates(&self) -> u64 {
        self.noop_updates.load(Ordering::Relaxed)
    }

    /// Returns rows deleted.
    pub fn rows_deleted(&self) -> u64 {
        self.rows_deleted.load(Ordering::Relaxed)
    }

    /// Returns rotations.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Returns seeks.
    pub fn seeks(&self) -> u64 {
        self.seeks.load(Ordering::Relaxed)
    }

    /// Returns rows hidden.
    pub fn rows_hidden(&self) -> u64 {
        self.rows_hidden.load(Ordering::Relaxed)
    }

    /// Returns rows unhidden.
    pub fn rows_unhidden(&self) -> u64 {
        self.rows_unhidden.load(Ordering::Relaxed)
    }

    /// Returns bookmarks created.
    pub fn bookmarks_created(&self) -> u64 {
        self.bookmarks_created.load(Ordering::Relaxed)
    }

    /// Resets all statistics.
    pub fn reset(&self) {
        self.rows_added.store(0, Ordering::Relaxed);
        self.rows_modified.store(0, Ordering::Relaxed);
        self.noop_updates.store(0, Ordering::Relaxed);
        self.rows_deleted.store(0, Ordering::Relaxed);
        self.rotations.store(0, Ordering::Relaxed);
        self.seeks.store(0, Ordering::Relaxed);
        self.rows_hidden.store(0, Ordering::Relaxed);
        self.rows_unhidden.store(0, Ordering::Relaxed);
        self.bookmarks_created.store(0, Ordering::Relaxed);
    }
}

impl Clone for TableStats {
    fn clone(&self) -> Self {
        Self {
            enabled: self.enabled,
            rows_added: AtomicU64::new(self.rows_added()),
            rows_modified: AtomicU64::new(self.rows_modified()),
            noop_updates: AtomicU64::new(self.noop_updates()),
            rows_deleted: AtomicU64::new(self.rows_deleted()),
            rotations: AtomicU64::new(self.rotations()),
            seeks: AtomicU64::new(self.seeks()),
            rows_hidden: AtomicU64::new(self.rows_hidden()),
            rows_unhidden: AtomicU64::new(self.rows_unhidden()),
            bookmarks_created: AtomicU64::new(self.bookmarks_created()),
        }
    }
}

impl std::fmt::Display for TableStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TableStats {{ added: {}, modified: {}, noop: {}, deleted: {}, rotations: {}, seeks: {}, hidden: {}, unhidden: {}, bookmarks: {} }}",
            self.rows_added(),
            self.rows_modified(),
            self.noop_updates(),
            self.rows_deleted(),
            self.rotations(),
            self.seeks(),
            self.rows_hidden(),
            self.rows_unhidden(),
            self.bookmarks_created()
        )
    }
}
