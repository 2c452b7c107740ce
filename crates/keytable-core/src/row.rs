//! Table rows and the row ordering.
//!
//! A row holds its identity, its sort columns, a visibility flag, and the
//! structural fields of the tree node it lives in. Rows are immutable except
//! for `hidden` and the structural fields; a change to the sort columns is a
//! delete followed by an insert.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use keytable_common::constants::FLOAT_SORT_KEY_SIZE;
use keytable_common::types::{RowKey, SortColumn, SortKind};

use crate::collate::{BinaryCollator, SortKeyCollator};

/// Index of a node in the row arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    /// The permanent header node. The real tree is its right subtree.
    pub(crate) const SENTINEL: Self = Self(0);

    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::SENTINEL {
            write!(f, "NodeId(SENTINEL)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// A node of the table tree.
#[derive(Debug, Clone)]
pub(crate) struct TableRow {
    /// Row identity.
    pub(crate) key: RowKey,
    /// Sort columns, most significant first.
    pub(crate) columns: Vec<SortColumn>,
    /// Hidden rows keep their tree position but have no rank.
    pub(crate) hidden: bool,
    /// Set only on the sentinel.
    pub(crate) sentinel: bool,
    /// Non-owning link to the parent; `None` only for the sentinel.
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    /// True if this node is the left child of its parent.
    pub(crate) is_left: bool,
    /// Number of non-hidden rows in this subtree.
    pub(crate) visible: u32,
    /// Height of this subtree, hidden rows included.
    pub(crate) height: u32,
}

impl TableRow {
    pub(crate) fn new(key: RowKey, columns: Vec<SortColumn>, hidden: bool) -> Self {
        Self {
            key,
            columns,
            hidden,
            sentinel: false,
            parent: None,
            left: None,
            right: None,
            is_left: false,
            visible: 0,
            height: 0,
        }
    }

    pub(crate) fn sentinel() -> Self {
        Self {
            sentinel: true,
            ..Self::new(RowKey::EMPTY, Vec::new(), false)
        }
    }

    /// Approximate heap and inline footprint of this row.
    pub(crate) fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.columns.capacity() * std::mem::size_of::<SortColumn>()
            + self.columns.iter().map(SortColumn::len).sum::<usize>()
    }
}

/// A copy of a row's identity, sort columns and visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSnapshot {
    /// Row identity.
    pub key: RowKey,
    /// Sort columns, most significant first.
    pub columns: Vec<SortColumn>,
    /// Whether the row is currently hidden.
    pub hidden: bool,
}

/// Total order over sort-column vectors.
///
/// Columns are compared pairwise up to the shorter vector:
///
/// - `Float64` columns compare as doubles; if either side is not 8 bytes the
///   values count as equal.
/// - `AsciiString` columns compare through the collator.
/// - `Binary` columns compare byte-wise over the shorter length.
///
/// When the values are equal but the lengths differ, the shorter column sorts
/// first. The first non-equal column decides, inverted if the left-hand column
/// is descending. If every compared column is equal, the vector with fewer
/// columns sorts first; equal counts compare `Equal`.
#[derive(Clone)]
pub struct RowComparator {
    collator: Arc<dyn SortKeyCollator>,
}

impl RowComparator {
    /// Creates a comparator using the given collator for string columns.
    pub fn new(collator: Arc<dyn SortKeyCollator>) -> Self {
        Self { collator }
    }

    /// Compares two sort-column vectors.
    ///
    /// With `ignore_order` set, descending flags are not applied.
    pub fn compare(&self, a: &[SortColumn], b: &[SortColumn], ignore_order: bool) -> Ordering {
        for (ca, cb) in a.iter().zip(b) {
            let ord = self
                .compare_column(ca, cb)
                .then_with(|| ca.len().cmp(&cb.len()));
            if ord != Ordering::Equal {
                return if !ignore_order && ca.is_descending() {
                    ord.reverse()
                } else {
                    ord
                };
            }
        }

        // Fewer columns first, independent of direction
        a.len().cmp(&b.len())
    }

    /// Compares only the first `prefix` columns of each side.
    pub fn compare_prefix(&self, prefix: usize, a: &[SortColumn], b: &[SortColumn]) -> Ordering {
        let a = &a[..prefix.min(a.len())];
        let b = &b[..prefix.min(b.len())];
        self.compare(a, b, false)
    }

    fn compare_column(&self, a: &SortColumn, b: &SortColumn) -> Ordering {
        match a.kind() {
            SortKind::Float64 => {
                if a.len() != FLOAT_SORT_KEY_SIZE || b.len() != FLOAT_SORT_KEY_SIZE {
                    return Ordering::Equal;
                }
                let (x, y) = (decode_f64(a.as_bytes()), decode_f64(b.as_bytes()));
                // NaN sorts after every number and equal to any other NaN
                match (x.is_nan(), y.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                }
            }
            SortKind::AsciiString => self.collator.compare(a.as_bytes(), b.as_bytes()),
            SortKind::Binary => {
                let n = a.len().min(b.len());
                a.as_bytes()[..n].cmp(&b.as_bytes()[..n])
            }
        }
    }
}

impl Default for RowComparator {
    fn default() -> Self {
        Self::new(Arc::new(BinaryCollator))
    }
}

impl fmt::Debug for RowComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowComparator").finish_non_exhaustive()
    }
}

fn decode_f64(bytes: &[u8]) -> f64 {
    let mut raw = [0u8; FLOAT_SORT_KEY_SIZE];
    raw.copy_from_slice(bytes);
    f64::from_ne_bytes(raw)
}
