//! Identity types: row keys and bookmark ids.
//!
//! These types provide type-safe wrappers around the numeric identifiers
//! exchanged with the layers that drive a table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{BOOKMARK_BEGINNING, BOOKMARK_CURRENT, BOOKMARK_END, FIRST_BOOKMARK_ID};

/// Row identifier - uniquely identifies a live row in a table.
///
/// A row key is a pair of an object id and an order id. The order id
/// distinguishes multiple rows produced by the same object (for example one
/// row per value of a multi-valued column). Keys are used for identity lookup
/// only; they play no part in row ordering.
///
/// # Example
///
/// ```rust
/// use keytable_common::types::RowKey;
///
/// let key = RowKey::new(7, 1);
/// assert_eq!(key.object_id(), 7);
/// assert_eq!(key.order_id(), 1);
/// assert!(!key.is_empty());
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey {
    object_id: u32,
    order_id: u32,
}

impl RowKey {
    /// The reserved "no row" key, reported by the protocol layer when a row
    /// has no predecessor.
    pub const EMPTY: Self = Self {
        object_id: 0,
        order_id: 0,
    };

    /// Creates a new row key.
    #[inline]
    #[must_use]
    pub const fn new(object_id: u32, order_id: u32) -> Self {
        Self {
            object_id,
            order_id,
        }
    }

    /// Returns the object id.
    #[inline]
    #[must_use]
    pub const fn object_id(self) -> u32 {
        self.object_id
    }

    /// Returns the order id.
    #[inline]
    #[must_use]
    pub const fn order_id(self) -> u32 {
        self.order_id
    }

    /// Returns true if this is the reserved empty key.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.object_id == 0 && self.order_id == 0
    }
}

impl fmt::Debug for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey({}:{})", self.object_id, self.order_id)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_id, self.order_id)
    }
}

impl From<(u32, u32)> for RowKey {
    #[inline]
    fn from((object_id, order_id): (u32, u32)) -> Self {
        Self::new(object_id, order_id)
    }
}

/// Bookmark identifier.
///
/// Ids 0, 1 and 2 are reserved for the built-in seek origins (beginning,
/// current, end); user bookmarks start at [`FIRST_BOOKMARK_ID`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct BookmarkId(u32);

impl BookmarkId {
    /// The built-in "beginning of table" origin.
    pub const BEGINNING: Self = Self(BOOKMARK_BEGINNING);

    /// The built-in "current position" origin.
    pub const CURRENT: Self = Self(BOOKMARK_CURRENT);

    /// The built-in "end of table" origin.
    pub const END: Self = Self(BOOKMARK_END);

    /// Creates a bookmark id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true if this id names one of the built-in origins.
    #[inline]
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 < FIRST_BOOKMARK_ID
    }
}

impl fmt::Debug for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookmarkId({})", self.0)
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BookmarkId {
    #[inline]
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<BookmarkId> for u32 {
    #[inline]
    fn from(id: BookmarkId) -> Self {
        id.0
    }
}
