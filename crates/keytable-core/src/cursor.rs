//! Cursor movement, rank arithmetic and paging.
//!
//! The cursor is a three-state machine:
//!
//! | state         | representation    | rank          |
//! |---------------|-------------------|---------------|
//! | before first  | `Some(SENTINEL)`  | 0             |
//! | on a row      | `Some(id)`        | visible rows before it |
//! | past the end  | `None`            | visible count |
//!
//! Ranks count visible rows only. A hidden row still has a rank (the number
//! of visible rows before it) but rank selection never lands on one.

use std::cmp::Ordering;

use keytable_common::constants::{BOOKMARK_BEGINNING, BOOKMARK_CURRENT, BOOKMARK_END};
use keytable_common::error::{KeyTableResult, Warning};
use keytable_common::types::{BookmarkId, RowKey, SortColumn};

use crate::row::NodeId;
use crate::tree::TableInner;

const SENTINEL: NodeId = NodeId::SENTINEL;

/// Where a seek offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekOrigin {
    /// Rank 0.
    Start,
    /// The cursor's current rank.
    Current,
    /// The visible row count.
    End,
    /// The current rank of a bookmarked position.
    Bookmark(BookmarkId),
}

impl SeekOrigin {
    /// Maps protocol-level bookmark numbers to an origin.
    ///
    /// 0, 1 and 2 are the built-in origins; anything else names a bookmark.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            BOOKMARK_BEGINNING => Self::Start,
            BOOKMARK_CURRENT => Self::Current,
            BOOKMARK_END => Self::End,
            id => Self::Bookmark(BookmarkId::new(id)),
        }
    }
}

/// Result of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekOutcome {
    /// Signed distance from the origin rank to the rank reached.
    pub rows_moved: i64,
    /// Set when the origin was a bookmark whose rank drifted since creation.
    pub position_changed: bool,
}

impl SeekOutcome {
    /// Returns the drift warning, if any.
    pub fn warning(&self) -> Option<Warning> {
        self.position_changed.then_some(Warning::PositionChanged)
    }
}

/// Where the cursor currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorPosition {
    /// Before the first row.
    BeforeFirst,
    /// On a row, which may be hidden.
    Row(RowKey),
    /// Past the last row.
    PastEnd,
}

impl TableInner {
    // =========================================================================
    // Stepping
    // =========================================================================

    /// In-order successor, hidden rows included. `None` stays `None`.
    pub(crate) fn step_next(&self, cur: Option<NodeId>) -> Option<NodeId> {
        let id = cur?;
        if let Some(right) = self.arena[id].right {
            return Some(self.leftmost(right));
        }

        let mut id = id;
        while id != SENTINEL && !self.arena[id].is_left {
            id = self.parent_of(id);
        }
        if id == SENTINEL {
            None
        } else {
            Some(self.parent_of(id))
        }
    }

    /// In-order predecessor, hidden rows included.
    ///
    /// From past the end this lands on the last visible row; before the
    /// first row it stays put.
    pub(crate) fn step_prev(&self, cur: Option<NodeId>) -> Option<NodeId> {
        match cur {
            None => match self.visible_count() {
                0 => Some(SENTINEL),
                n => self.select(n - 1),
            },
            Some(SENTINEL) => Some(SENTINEL),
            Some(id) => Some(self.predecessor(id)),
        }
    }

    pub(crate) fn next(&mut self) {
        self.cursor = self.step_next(self.cursor);
    }

    pub(crate) fn prev(&mut self) {
        self.cursor = self.step_prev(self.cursor);
    }

    // =========================================================================
    // Rank
    // =========================================================================

    /// Number of visible rows before a cursor position.
    pub(crate) fn rank_of(&self, cur: Option<NodeId>) -> u32 {
        let Some(id) = cur else {
            return self.visible_count();
        };
        if id == SENTINEL {
            return 0;
        }

        let mut rank = self.visible_of(self.arena[id].left);
        let mut id = id;
        loop {
            let parent = self.parent_of(id);
            if parent == SENTINEL {
                break;
            }
            if !self.arena[id].is_left {
                rank += self.arena[parent].visible - self.arena[id].visible;
            }
            id = parent;
        }
        rank
    }

    pub(crate) fn current_rank(&self) -> u32 {
        self.rank_of(self.cursor)
    }

    /// Finds the visible row with the given rank.
    pub(crate) fn select(&self, mut rank: u32) -> Option<NodeId> {
        let mut cur = self.root();
        while let Some(id) = cur {
            let row = &self.arena[id];
            let left = self.visible_of(row.left);
            if rank < left {
                cur = row.left;
                continue;
            }
            rank -= left;
            if !row.hidden {
                if rank == 0 {
                    return Some(id);
                }
                rank -= 1;
            }
            cur = row.right;
        }
        None
    }

    // =========================================================================
    // Positioning
    // =========================================================================

    /// Moves the cursor to a rank relative to an origin.
    pub(crate) fn seek(&mut self, origin: SeekOrigin, offset: i64) -> KeyTableResult<SeekOutcome> {
        let (origin_rank, position_changed) = match origin {
            SeekOrigin::Start => (0, false),
            SeekOrigin::Current => (self.current_rank(), false),
            SeekOrigin::End => (self.visible_count(), false),
            SeekOrigin::Bookmark(id) => {
                let position = self.resolve_bookmark(id)?;
                (position.rank, position.drifted)
            }
        };

        let total = self.visible_count();
        let origin_rank = i64::from(origin_rank);
        let target = origin_rank.saturating_add(offset).clamp(0, i64::from(total));

        self.cursor = if total == 0 {
            Some(SENTINEL)
        } else {
            // Past the end when target == total
            u32::try_from(target).ok().and_then(|rank| self.select(rank))
        };

        self.stats.record_seek();
        tracing::trace!(
            "Seek {:?}{:+} reached rank {} of {}",
            origin,
            offset,
            target,
            total
        );

        Ok(SeekOutcome {
            rows_moved: target - origin_rank,
            position_changed,
        })
    }

    /// Puts the cursor on a row by key, hidden or not.
    pub(crate) fn seek_id(&mut self, key: RowKey) -> KeyTableResult<()> {
        self.cursor = Some(self.lookup(key)?);
        Ok(())
    }

    pub(crate) fn cursor_position(&self) -> CursorPosition {
        match self.cursor {
            None => CursorPosition::PastEnd,
            Some(SENTINEL) => CursorPosition::BeforeFirst,
            Some(id) => CursorPosition::Row(self.arena[id].key),
        }
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Collects up to `max` keys from the cursor onward.
    pub(crate) fn query_rows(
        &mut self,
        max: usize,
        backward: bool,
        include_hidden: bool,
        advance: bool,
    ) -> Vec<RowKey> {
        let origin = self.cursor;

        if backward && self.cursor.is_none() {
            self.cursor = self.step_prev(None);
        } else if !backward && self.cursor == Some(SENTINEL) && self.root().is_some() {
            self.cursor = self.step_next(self.cursor);
        }

        let cap = if include_hidden {
            self.arena.len()
        } else {
            self.visible_count() as usize
        };
        let mut remaining = max.min(cap);
        let mut keys = Vec::with_capacity(remaining);

        while remaining > 0 {
            let Some(id) = self.cursor.filter(|&id| id != SENTINEL) else {
                break;
            };
            let row = &self.arena[id];
            if include_hidden || !row.hidden {
                keys.push(row.key);
                remaining -= 1;
            }
            self.cursor = if backward {
                self.step_prev(self.cursor)
            } else {
                self.step_next(self.cursor)
            };
        }

        if !advance {
            self.cursor = origin;
        }
        keys
    }

    /// The nearest visible row before `key`, without moving the cursor.
    pub(crate) fn get_previous_row(&self, key: RowKey) -> KeyTableResult<Option<RowKey>> {
        let mut id = self.predecessor(self.lookup(key)?);
        while id != SENTINEL && self.arena[id].hidden {
            id = self.predecessor(id);
        }
        Ok((id != SENTINEL).then(|| self.arena[id].key))
    }

    /// First row whose sort key is not less than `columns`, hidden rows
    /// included. `None` if every row is less.
    fn lower_bound_node(&self, columns: &[SortColumn]) -> Option<NodeId> {
        let mut found = None;
        let mut cur = self.root();
        while let Some(id) = cur {
            let row = &self.arena[id];
            if self.comparator.compare(&row.columns, columns, false) == Ordering::Less {
                cur = row.right;
            } else {
                found = Some(id);
                cur = row.left;
            }
        }
        found
    }

    /// Moves the cursor to the first row not less than `columns`, or past
    /// the end.
    pub(crate) fn lower_bound(&mut self, columns: &[SortColumn]) {
        self.cursor = self.lower_bound_node(columns);
    }

    /// Finds a row whose sort key equals `columns`, without moving the cursor.
    pub(crate) fn find(&self, columns: &[SortColumn]) -> Option<RowKey> {
        let id = self.lower_bound_node(columns)?;
        let row = &self.arena[id];
        (self.comparator.compare(columns, &row.columns, false) != Ordering::Less).then_some(row.key)
    }
}
