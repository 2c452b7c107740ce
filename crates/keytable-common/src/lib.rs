//! # keytable-common
//!
//! Common types, errors, and configuration for the KeyTable engine.
//!
//! This crate provides the foundational types shared by the table engine and
//! the layers that drive it. It includes:
//!
//! - **Types**: Row identity (`RowKey`), bookmark ids, and the sortable column
//!   encoding (`SortColumn`, `SortKind`)
//! - **Errors**: Unified error handling with `KeyTableError`
//! - **Config**: Per-table configuration
//! - **Constants**: Reserved ids and limits
//!
//! ## Example
//!
//! ```rust
//! use keytable_common::types::{RowKey, SortColumn};
//! use keytable_common::error::KeyTableResult;
//!
//! fn example() -> KeyTableResult<()> {
//!     let key = RowKey::new(42, 0);
//!     let columns = vec![SortColumn::string("inbox"), SortColumn::float(3.5).descending()];
//!     assert_eq!(key.object_id(), 42);
//!     assert_eq!(columns.len(), 2);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::KeyTableConfig;
pub use constants::*;
pub use error::{ErrorCode, KeyTableError, KeyTableResult, Warning};
pub use types::{BookmarkId, RowKey, SortColumn, SortKind};
