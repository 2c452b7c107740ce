//! # keytable-core
//!
//! The sorted live table engine behind every table view: message lists,
//! address-book listings, folder hierarchies.
//!
//! A [`KeyTable`] is an in-memory, concurrently mutated, multi-column sorted
//! index. It supports:
//!
//! - **Live mutation**: rows are added, re-sorted and removed while a cursor
//!   is positioned in the table
//! - **Rank-based paging**: "go to row N" and "which row am I on" in O(log n)
//! - **Bookmarks**: saved positions that survive mutation, with drift
//!   detection
//! - **Categories**: collapse and expand runs of rows sharing a sort prefix
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ KeyTable (one mutex)                                     │
//! │  ┌───────────────┐   ┌────────────────────────────────┐  │
//! │  │ identity index│──▶│ row arena                      │  │
//! │  │ RowKey → Node │   │   sentinel                     │  │
//! │  └───────────────┘   │        \                       │  │
//! │  ┌───────────────┐   │        root   (AVL, counts)    │  │
//! │  │ bookmarks     │──▶│       /    \                   │  │
//! │  └───────────────┘   │     ...    ...                 │  │
//! │  cursor ────────────▶└────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every node stores the number of visible rows and the height of its
//! subtree. Hidden rows still occupy tree positions (and count toward height)
//! but contribute nothing to ranks.
//!
//! ## Example
//!
//! ```rust
//! use keytable_core::{KeyTable, SeekOrigin};
//! use keytable_common::types::{RowKey, SortColumn};
//!
//! let table = KeyTable::new();
//! for (id, name) in [(1, "b"), (2, "a"), (3, "c")] {
//!     table.upsert(RowKey::new(id, 0), vec![SortColumn::string(name)], false).unwrap();
//! }
//!
//! table.seek(SeekOrigin::Start, 0).unwrap();
//! let rows = table.query_rows(3, false, false, true);
//! assert_eq!(rows, vec![RowKey::new(2, 0), RowKey::new(1, 0), RowKey::new(3, 0)]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arena;
mod bookmark;
mod category;
mod collate;
mod cursor;
mod row;
mod stats;
mod table;
mod tree;
mod verify;

pub use bookmark::BookmarkPosition;
pub use collate::{BinaryCollator, SortKeyCollator};
pub use cursor::{CursorPosition, SeekOrigin, SeekOutcome};
pub use row::{RowComparator, RowSnapshot};
pub use stats::TableStats;
pub use table::KeyTable;
pub use tree::{PartialUpdate, RowAction, Upsert};

pub use keytable_common::error::{KeyTableError, KeyTableResult, Warning};
