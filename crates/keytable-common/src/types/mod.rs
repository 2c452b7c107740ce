//! Type definitions for the KeyTable engine.
//!
//! This module contains the identity types and the sortable column encoding
//! consumed by the table engine.

mod keys;
mod sort;

pub use keys::{BookmarkId, RowKey};
pub use sort::{SortColumn, SortKind};
