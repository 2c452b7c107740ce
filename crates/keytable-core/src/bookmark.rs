//! Bookmarks: saved cursor positions with drift detection.

use keytable_common::error::{KeyTableError, KeyTableResult, Warning};
use keytable_common::types::BookmarkId;

use crate::row::NodeId;
use crate::tree::TableInner;

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bookmark {
    /// Cursor state at creation; see the cursor module for the encoding.
    pub(crate) position: Option<NodeId>,
    pub(crate) rank_at_creation: u32,
}

/// Where a bookmark points now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkPosition {
    /// Current rank of the bookmarked position.
    pub rank: u32,
    /// True if the rank differs from the rank at creation.
    pub drifted: bool,
}

impl BookmarkPosition {
    /// Returns the drift warning, if any.
    pub fn warning(&self) -> Option<Warning> {
        self.drifted.then_some(Warning::PositionChanged)
    }
}

impl TableInner {
    /// Saves the cursor position.
    pub(crate) fn create_bookmark(&mut self) -> KeyTableResult<BookmarkId> {
        let limit = self.config.bookmark_limit;
        if self.bookmarks.len() >= limit {
            tracing::warn!("Bookmark limit of {} reached", limit);
            return Err(KeyTableError::ResourceExhausted { limit });
        }

        let id = BookmarkId::new(self.next_bookmark_id);
        self.next_bookmark_id = self
            .next_bookmark_id
            .checked_add(1)
            .ok_or(KeyTableError::ResourceExhausted { limit })?;

        let bookmark = Bookmark {
            position: self.cursor,
            rank_at_creation: self.current_rank(),
        };
        self.bookmarks.insert(id, bookmark);

        self.stats.record_bookmark();
        tracing::debug!(
            "Created bookmark {} at rank {}",
            id,
            bookmark.rank_at_creation
        );
        Ok(id)
    }

    /// Computes a bookmark's current rank.
    pub(crate) fn resolve_bookmark(&self, id: BookmarkId) -> KeyTableResult<BookmarkPosition> {
        let bookmark = self
            .bookmarks
            .get(&id)
            .ok_or(KeyTableError::InvalidBookmark { id })?;

        let rank = self.rank_of(bookmark.position);
        Ok(BookmarkPosition {
            rank,
            drifted: rank != bookmark.rank_at_creation,
        })
    }

    /// Forgets a bookmark.
    pub(crate) fn free_bookmark(&mut self, id: BookmarkId) -> KeyTableResult<()> {
        self.bookmarks
            .remove(&id)
            .ok_or(KeyTableError::InvalidBookmark { id })?;
        tracing::debug!("Freed bookmark {}", id);
        Ok(())
    }
}
