//! System-wide constants for the KeyTable engine.

// =============================================================================
// Bookmark Constants
// =============================================================================

/// Reserved bookmark id for the start of the table.
pub const BOOKMARK_BEGINNING: u32 = 0;

/// Reserved bookmark id for the current cursor position.
pub const BOOKMARK_CURRENT: u32 = 1;

/// Reserved bookmark id for the end of the table.
pub const BOOKMARK_END: u32 = 2;

/// First id handed out to user bookmarks.
///
/// Ids below this value are the built-in seek origins.
pub const FIRST_BOOKMARK_ID: u32 = 3;

/// Maximum number of live bookmarks per table.
pub const DEFAULT_BOOKMARK_LIMIT: usize = 100;

// =============================================================================
// Sort Key Constants
// =============================================================================

/// Encoded size of a `Float64` sort column.
pub const FLOAT_SORT_KEY_SIZE: usize = std::mem::size_of::<f64>();

/// Sort flag bit: the column is compared in descending order.
pub const SORT_FLAG_DESCENDING: u8 = 0x01;

/// Sort flag bit: the column holds a collation key.
pub const SORT_FLAG_STRING: u8 = 0x02;

/// Sort flag bit: the column holds a native-endian IEEE-754 double.
pub const SORT_FLAG_FLOAT: u8 = 0x04;
