//! Collation seam for string sort columns.
//!
//! String columns carry collation keys produced by a locale-aware encoder.
//! The table never interprets those bytes itself; it asks the collator
//! injected at construction time to order them.

use std::cmp::Ordering;

/// Orders two collation keys.
///
/// Implementations must be a total order and must be consistent for the
/// lifetime of a table.
pub trait SortKeyCollator: Send + Sync {
    /// Compares two collation keys.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Collator for keys whose byte order is the collation order.
///
/// This is the case for ICU-style sort keys and for plain ASCII/UTF-8 text
/// compared by code point. A key that is a prefix of another sorts first.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCollator;

impl SortKeyCollator for BinaryCollator {
    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

impl<F> SortKeyCollator for F
where
    F: Fn(&[u8], &[u8]) -> Ordering + Send + Sync,
{
    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        self(a, b)
    }
}
