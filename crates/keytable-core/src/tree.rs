//! AVL tree engine: table state and row mutation.
//!
//! The tree is an AVL tree augmented with per-subtree visible-row counts,
//! which turns it into an order-statistics tree over the non-hidden rows.
//! A permanent sentinel node sits above the root; the real tree is the
//! sentinel's right subtree, so the sentinel's visible count is the number of
//! visible rows in the table.
//!
//! All methods here assume the caller holds the table lock.

use std::cmp::Ordering;
use std::collections::HashMap;

use keytable_common::config::KeyTableConfig;
use keytable_common::error::{KeyTableError, KeyTableResult};
use keytable_common::types::{BookmarkId, RowKey, SortColumn};

use crate::arena::RowArena;
use crate::bookmark::Bookmark;
use crate::row::{NodeId, RowComparator, RowSnapshot, TableRow};
use crate::stats::TableStats;

const SENTINEL: NodeId = NodeId::SENTINEL;

/// What an upsert did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    /// A row was inserted under a new key.
    Added,
    /// An existing row was re-sorted, or left in place if its sort key was
    /// unchanged.
    Modified,
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upsert {
    /// Whether the row is new.
    pub action: RowAction,
    /// The row now directly before this one in sort order, hidden rows
    /// included. `None` if the row is first.
    pub predecessor: Option<RowKey>,
}

/// Result of a single-column sort key update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialUpdate {
    /// Always [`RowAction::Modified`] for an existing row.
    pub action: RowAction,
    /// The row's new predecessor.
    pub predecessor: Option<RowKey>,
    /// The row's hidden flag, carried over unchanged.
    pub hidden: bool,
}

/// Table state guarded by the table lock.
pub(crate) struct TableInner {
    pub(crate) arena: RowArena,
    pub(crate) index: HashMap<RowKey, NodeId>,
    pub(crate) comparator: RowComparator,
    /// `Some(SENTINEL)` is before the first row, `None` is past the end.
    pub(crate) cursor: Option<NodeId>,
    pub(crate) bookmarks: HashMap<BookmarkId, Bookmark>,
    pub(crate) next_bookmark_id: u32,
    pub(crate) config: KeyTableConfig,
    pub(crate) stats: TableStats,
}

impl TableInner {
    pub(crate) fn new(config: KeyTableConfig, comparator: RowComparator) -> Self {
        Self {
            arena: RowArena::with_capacity(config.initial_capacity),
            index: HashMap::with_capacity(config.initial_capacity),
            comparator,
            cursor: Some(SENTINEL),
            bookmarks: HashMap::new(),
            next_bookmark_id: config.first_bookmark_id,
            stats: TableStats::with_enabled(config.collect_stats),
            config,
        }
    }

    // =========================================================================
    // Node accessors
    // =========================================================================

    #[inline]
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.arena[SENTINEL].right
    }

    #[inline]
    pub(crate) fn visible_of(&self, id: Option<NodeId>) -> u32 {
        id.map_or(0, |id| self.arena[id].visible)
    }

    #[inline]
    pub(crate) fn height_of(&self, id: Option<NodeId>) -> u32 {
        id.map_or(0, |id| self.arena[id].height)
    }

    /// Number of visible rows in the table.
    #[inline]
    pub(crate) fn visible_count(&self) -> u32 {
        self.arena[SENTINEL].visible
    }

    #[inline]
    pub(crate) fn parent_of(&self, id: NodeId) -> NodeId {
        self.arena[id].parent.unwrap_or(SENTINEL)
    }

    pub(crate) fn lookup(&self, key: RowKey) -> KeyTableResult<NodeId> {
        self.index
            .get(&key)
            .copied()
            .ok_or(KeyTableError::NotFound { key })
    }

    pub(crate) fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.arena[id].left {
            id = left;
        }
        id
    }

    pub(crate) fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.arena[id].right {
            id = right;
        }
        id
    }

    /// In-order predecessor of a row, hidden rows included.
    ///
    /// Returns the sentinel for the first row.
    pub(crate) fn predecessor(&self, id: NodeId) -> NodeId {
        if let Some(left) = self.arena[id].left {
            return self.rightmost(left);
        }
        let mut id = id;
        while id != SENTINEL && self.arena[id].is_left {
            id = self.parent_of(id);
        }
        if id == SENTINEL {
            SENTINEL
        } else {
            self.parent_of(id)
        }
    }

    pub(crate) fn predecessor_key(&self, id: NodeId) -> Option<RowKey> {
        match self.predecessor(id) {
            SENTINEL => None,
            pred => Some(self.arena[pred].key),
        }
    }

    // =========================================================================
    // Counts and balancing
    // =========================================================================

    /// Recomputes the visible count and height of one node from its children.
    pub(crate) fn update_node(&mut self, id: NodeId) {
        let (left, right) = (self.arena[id].left, self.arena[id].right);
        let visible = self.visible_of(left) + self.visible_of(right);
        let height = self.height_of(left).max(self.height_of(right));

        let row = &mut self.arena[id];
        let (own_visible, own_height) = if row.sentinel {
            (0, 0)
        } else if row.hidden {
            (0, 1)
        } else {
            (1, 1)
        };
        row.visible = own_visible + visible;
        row.height = own_height + height;
    }

    /// Recomputes counts from a node up to the sentinel, without rebalancing.
    pub(crate) fn update_counts(&mut self, mut id: NodeId) {
        loop {
            self.update_node(id);
            if id == SENTINEL {
                break;
            }
            id = self.parent_of(id);
        }
    }

    /// Makes `child` the left or right child of `parent`.
    fn set_child(&mut self, parent: NodeId, is_left: bool, child: Option<NodeId>) {
        if is_left {
            self.arena[parent].left = child;
        } else {
            self.arena[parent].right = child;
        }
        if let Some(child) = child {
            let row = &mut self.arena[child];
            row.parent = Some(parent);
            row.is_left = is_left;
        }
    }

    fn balance(&self, id: NodeId) -> i64 {
        let row = &self.arena[id];
        i64::from(self.height_of(row.left)) - i64::from(self.height_of(row.right))
    }

    /// Lifts the left child of `pivot` into its place. Returns the new top.
    fn rotate_right(&mut self, pivot: NodeId) -> NodeId {
        let Some(top) = self.arena[pivot].left else {
            return pivot;
        };
        let parent = self.parent_of(pivot);
        let is_left = self.arena[pivot].is_left;
        let inner = self.arena[top].right;

        self.set_child(pivot, true, inner);
        self.set_child(top, false, Some(pivot));
        self.set_child(parent, is_left, Some(top));

        self.update_node(pivot);
        self.update_node(top);
        self.stats.record_rotation();
        tracing::trace!("Rotated right at {:?}", pivot);
        top
    }

    /// Lifts the right child of `pivot` into its place. Returns the new top.
    fn rotate_left(&mut self, pivot: NodeId) -> NodeId {
        let Some(top) = self.arena[pivot].right else {
            return pivot;
        };
        let parent = self.parent_of(pivot);
        let is_left = self.arena[pivot].is_left;
        let inner = self.arena[top].left;

        self.set_child(pivot, false, inner);
        self.set_child(top, true, Some(pivot));
        self.set_child(parent, is_left, Some(top));

        self.update_node(pivot);
        self.update_node(top);
        self.stats.record_rotation();
        tracing::trace!("Rotated left at {:?}", pivot);
        top
    }

    /// Restores the AVL balance at one node. Returns the subtree's new top.
    fn restructure(&mut self, id: NodeId) -> NodeId {
        let balance = self.balance(id);
        if balance > 1 {
            if let Some(left) = self.arena[id].left {
                if self.balance(left) < 0 {
                    self.rotate_left(left);
                }
            }
            self.rotate_right(id)
        } else if balance < -1 {
            if let Some(right) = self.arena[id].right {
                if self.balance(right) > 0 {
                    self.rotate_right(right);
                }
            }
            self.rotate_left(id)
        } else {
            id
        }
    }

    /// Recomputes counts and rebalances every node from `id` up to the root,
    /// then refreshes the sentinel.
    fn rebalance_upwards(&mut self, mut id: NodeId) {
        while id != SENTINEL {
            self.update_node(id);
            let top = self.restructure(id);
            id = self.parent_of(top);
        }
        self.update_node(SENTINEL);
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    fn reserve_one(&mut self) -> KeyTableResult<()> {
        self.arena.reserve_one()?;
        self.index
            .try_reserve(1)
            .map_err(|_| KeyTableError::OutOfMemory)
    }

    /// Inserts or re-sorts a row.
    pub(crate) fn upsert(
        &mut self,
        key: RowKey,
        columns: Vec<SortColumn>,
        hidden: bool,
    ) -> KeyTableResult<Upsert> {
        if key.is_empty() {
            return Err(KeyTableError::invalid_parameter(format!(
                "row key {key} is reserved"
            )));
        }

        let existing = self.index.get(&key).copied();
        if let Some(id) = existing {
            let stored = &self.arena[id].columns;
            if self.comparator.compare(stored, &columns, false) == Ordering::Equal
                && self.comparator.compare(&columns, stored, false) == Ordering::Equal
            {
                self.stats.record_noop();
                return Ok(Upsert {
                    action: RowAction::Modified,
                    predecessor: self.predecessor_key(id),
                });
            }
        }

        self.reserve_one()?;

        let (action, relocate) = match existing {
            Some(id) => {
                let relocate = self.cursor == Some(id);
                self.remove_node(key, id);
                (RowAction::Modified, relocate)
            }
            None => (RowAction::Added, false),
        };

        let id = self.insert_row(TableRow::new(key, columns, hidden));
        if relocate {
            self.cursor = Some(id);
        }

        match action {
            RowAction::Added => {
                self.stats.record_add();
                tracing::debug!("Added row {}", key);
            }
            RowAction::Modified => {
                self.stats.record_modify();
                tracing::debug!("Re-sorted row {}", key);
            }
        }

        Ok(Upsert {
            action,
            predecessor: self.predecessor_key(id),
        })
    }

    /// Attaches a row at its sorted position. Ties descend right.
    fn insert_row(&mut self, row: TableRow) -> NodeId {
        let mut parent = SENTINEL;
        let mut go_left = false;
        let mut cur = self.root();
        while let Some(node) = cur {
            parent = node;
            go_left =
                self.comparator.compare(&row.columns, &self.arena[node].columns, false)
                    == Ordering::Less;
            cur = if go_left {
                self.arena[node].left
            } else {
                self.arena[node].right
            };
        }

        let key = row.key;
        let id = self.arena.alloc(row);
        self.set_child(parent, go_left, Some(id));
        self.index.insert(key, id);
        self.rebalance_upwards(id);
        id
    }

    /// Deletes a row by key.
    pub(crate) fn delete(&mut self, key: RowKey) -> KeyTableResult<()> {
        let id = self.lookup(key)?;
        self.remove_node(key, id);
        self.stats.record_delete();
        tracing::debug!("Deleted row {}", key);
        Ok(())
    }

    /// Unlinks and frees a node, moving the cursor off it and dropping
    /// bookmarks that point at it.
    fn remove_node(&mut self, key: RowKey, id: NodeId) {
        if self.cursor == Some(id) {
            self.cursor = self.step_next(self.cursor);
        }

        self.unlink(id);

        let before = self.bookmarks.len();
        self.bookmarks.retain(|_, bookmark| bookmark.position != Some(id));
        let dropped = before - self.bookmarks.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} bookmark(s) on deleted row {}", dropped, key);
        }

        self.arena.free(id);
        self.index.remove(&key);
    }

    /// Structurally removes a node from the tree and rebalances.
    fn unlink(&mut self, id: NodeId) {
        let parent = self.parent_of(id);
        let (is_left, left, right) = {
            let row = &self.arena[id];
            (row.is_left, row.left, row.right)
        };

        let rebalance_from = match (left, right) {
            (None, None) => {
                self.set_child(parent, is_left, None);
                parent
            }
            (Some(child), None) | (None, Some(child)) => {
                self.set_child(parent, is_left, Some(child));
                parent
            }
            (Some(left), Some(right)) => {
                // The predecessor takes over the node's position
                let pred = self.rightmost(left);
                let pred_parent = self.parent_of(pred);
                if pred != left {
                    let pred_left = self.arena[pred].left;
                    self.set_child(pred_parent, false, pred_left);
                    self.set_child(pred, true, Some(left));
                }
                self.set_child(pred, false, Some(right));
                self.set_child(parent, is_left, Some(pred));

                if pred_parent == id {
                    pred
                } else {
                    pred_parent
                }
            }
        };

        self.rebalance_upwards(rebalance_from);
    }

    /// Replaces one sort column of a row and re-sorts it.
    pub(crate) fn update_partial_sort_key(
        &mut self,
        key: RowKey,
        column_index: usize,
        column: SortColumn,
    ) -> KeyTableResult<PartialUpdate> {
        let id = self.lookup(key)?;
        let row = &self.arena[id];
        if column_index >= row.columns.len() {
            return Err(KeyTableError::invalid_parameter(format!(
                "column {} out of range for row {} with {} columns",
                column_index,
                key,
                row.columns.len()
            )));
        }

        let hidden = row.hidden;
        let mut columns = row.columns.clone();
        columns[column_index] = column;

        let Upsert {
            action,
            predecessor,
        } = self.upsert(key, columns, hidden)?;
        Ok(PartialUpdate {
            action,
            predecessor,
            hidden,
        })
    }

    /// Removes every row and bookmark.
    pub(crate) fn clear(&mut self) {
        let rows = self.arena.len();
        self.arena.clear();
        self.index.clear();
        self.bookmarks.clear();
        self.cursor = Some(SENTINEL);
        tracing::debug!("Cleared table ({} rows)", rows);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub(crate) fn get_row(&self, key: RowKey) -> KeyTableResult<RowSnapshot> {
        let row = &self.arena[self.lookup(key)?];
        Ok(RowSnapshot {
            key: row.key,
            columns: row.columns.clone(),
            hidden: row.hidden,
        })
    }

    pub(crate) fn contains(&self, key: RowKey) -> bool {
        self.index.contains_key(&key)
    }

    pub(crate) fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.arena.memory_usage()
            + self.index.capacity()
                * (std::mem::size_of::<RowKey>() + std::mem::size_of::<NodeId>())
            + self.bookmarks.capacity()
                * (std::mem::size_of::<BookmarkId>() + std::mem::size_of::<Bookmark>())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn table() -> TableInner {
        TableInner::new(KeyTableConfig::for_testing(), RowComparator::default())
    }

    pub(crate) fn key(n: u32) -> RowKey {
        RowKey::new(n, 1)
    }

    pub(crate) fn cols(s: &str) -> Vec<SortColumn> {
        vec![SortColumn::string(s)]
    }

    /// Keys in sort order, hidden rows included.
    pub(crate) fn in_order(t: &TableInner) -> Vec<RowKey> {
        let mut out = Vec::new();
        let mut cur = t.root().map(|root| t.leftmost(root));
        while let Some(id) = cur {
            if id == SENTINEL {
                break;
            }
            out.push(t.arena[id].key);
            cur = t.step_next(Some(id));
        }
        out
    }

    #[test]
    fn test_insert_sorted() {
        let mut t = table();
        for (n, s) in [(1, "b"), (2, "a"), (3, "c")] {
            let up = t.upsert(key(n), cols(s), false).unwrap();
            assert_eq!(up.action, RowAction::Added);
        }
        assert_eq!(in_order(&t), vec![key(2), key(1), key(3)]);
        assert_eq!(t.visible_count(), 3);
        t.verify().unwrap();
    }

    #[test]
    fn test_upsert_reports_predecessor() {
        let mut t = table();
        assert_eq!(t.upsert(key(1), cols("m"), false).unwrap().predecessor, None);
        assert_eq!(
            t.upsert(key(2), cols("z"), false).unwrap().predecessor,
            Some(key(1))
        );
        assert_eq!(t.upsert(key(3), cols("a"), false).unwrap().predecessor, None);
        assert_eq!(
            t.upsert(key(4), cols("n"), false).unwrap().predecessor,
            Some(key(1))
        );
    }

    #[test]
    fn test_reserved_key_rejected() {
        let mut t = table();
        let err = t.upsert(RowKey::EMPTY, cols("a"), false).unwrap_err();
        assert!(matches!(err, KeyTableError::InvalidParameter { .. }));
        assert_eq!(t.arena.len(), 0);
    }

    #[test]
    fn test_noop_upsert() {
        let mut t = table();
        t.upsert(key(1), cols("a"), false).unwrap();
        t.upsert(key(2), cols("b"), false).unwrap();

        let up = t.upsert(key(2), cols("b"), true).unwrap();
        assert_eq!(up.action, RowAction::Modified);
        assert_eq!(up.predecessor, Some(key(1)));
        // Hidden flag untouched by a no-op
        assert!(!t.get_row(key(2)).unwrap().hidden);
        assert_eq!(t.stats.noop_updates(), 1);
    }

    #[test]
    fn test_modify_moves_row() {
        let mut t = table();
        t.upsert(key(1), cols("a"), false).unwrap();
        t.upsert(key(2), cols("b"), false).unwrap();
        t.upsert(key(3), cols("c"), false).unwrap();

        let up = t.upsert(key(1), cols("d"), false).unwrap();
        assert_eq!(up.action, RowAction::Modified);
        assert_eq!(up.predecessor, Some(key(3)));
        assert_eq!(in_order(&t), vec![key(2), key(3), key(1)]);
        assert_eq!(t.arena.len(), 3);
        t.verify().unwrap();
    }

    #[test]
    fn test_modify_keeps_cursor_on_row() {
        let mut t = table();
        t.upsert(key(1), cols("a"), false).unwrap();
        t.upsert(key(2), cols("b"), false).unwrap();
        t.cursor = Some(t.lookup(key(1)).unwrap());

        t.upsert(key(1), cols("z"), false).unwrap();
        assert_eq!(t.cursor, Some(t.lookup(key(1)).unwrap()));
    }

    #[test]
    fn test_ties_insert_after_equal_rows() {
        let mut t = table();
        for n in 1..=5 {
            t.upsert(key(n), cols("same"), false).unwrap();
        }
        assert_eq!(in_order(&t), (1..=5).map(key).collect::<Vec<_>>());
        t.verify().unwrap();
    }

    #[test]
    fn test_delete_leaf_and_inner() {
        let mut t = table();
        for n in 1..=20 {
            t.upsert(key(n), vec![SortColumn::unsigned(u64::from(n))], false)
                .unwrap();
        }

        t.delete(key(20)).unwrap();
        t.verify().unwrap();
        t.delete(key(5)).unwrap();
        t.verify().unwrap();
        // The root has two children
        let root_key = t.arena[t.root().unwrap()].key;
        t.delete(root_key).unwrap();
        t.verify().unwrap();

        assert_eq!(t.arena.len(), 17);
        assert_eq!(t.visible_count(), 17);
        assert!(!t.contains(root_key));
        assert!(matches!(
            t.delete(key(20)),
            Err(KeyTableError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_moves_cursor_to_successor() {
        let mut t = table();
        for (n, s) in [(1, "a"), (2, "b"), (3, "c")] {
            t.upsert(key(n), cols(s), false).unwrap();
        }
        t.cursor = Some(t.lookup(key(2)).unwrap());
        t.delete(key(2)).unwrap();
        assert_eq!(t.cursor, Some(t.lookup(key(3)).unwrap()));

        t.delete(key(3)).unwrap();
        assert_eq!(t.cursor, None);
    }

    #[test]
    fn test_delete_everything() {
        let mut t = table();
        for n in 1..=50 {
            t.upsert(key(n), vec![SortColumn::unsigned(u64::from(n * 7 % 13))], false)
                .unwrap();
        }
        for n in (1..=50).rev() {
            t.delete(key(n)).unwrap();
            t.verify().unwrap();
        }
        assert!(t.root().is_none());
        assert_eq!(t.visible_count(), 0);
        assert_eq!(t.arena[SENTINEL].height, 0);
    }

    #[test]
    fn test_ascending_inserts_stay_balanced() {
        let mut t = table();
        for n in 1..=1024 {
            t.upsert(key(n), vec![SortColumn::unsigned(u64::from(n))], false)
                .unwrap();
        }
        t.verify().unwrap();
        // 1.44 * log2(1025) is about 14.4
        assert!(t.arena[SENTINEL].height <= 15);
        assert!(t.stats.rotations() > 0);
    }

    #[test]
    fn test_partial_sort_key() {
        let mut t = table();
        let row = |a: &str, b: u64| vec![SortColumn::string(a), SortColumn::unsigned(b)];
        t.upsert(key(1), row("x", 1), true).unwrap();
        t.upsert(key(2), row("x", 2), false).unwrap();

        let up = t
            .update_partial_sort_key(key(1), 1, SortColumn::unsigned(3))
            .unwrap();
        assert_eq!(up.action, RowAction::Modified);
        assert_eq!(up.predecessor, Some(key(2)));
        assert!(up.hidden);
        assert!(t.get_row(key(1)).unwrap().hidden);
        assert_eq!(in_order(&t), vec![key(2), key(1)]);

        assert!(matches!(
            t.update_partial_sort_key(key(1), 2, SortColumn::unsigned(0)),
            Err(KeyTableError::InvalidParameter { .. })
        ));
        assert!(matches!(
            t.update_partial_sort_key(key(9), 0, SortColumn::unsigned(0)),
            Err(KeyTableError::NotFound { .. })
        ));
    }

    #[test]
    fn test_hidden_rows_count_for_height_only() {
        let mut t = table();
        t.upsert(key(1), cols("a"), true).unwrap();
        t.upsert(key(2), cols("b"), false).unwrap();
        assert_eq!(t.visible_count(), 1);
        assert_eq!(t.arena[SENTINEL].height, 2);
        t.verify().unwrap();
    }

    #[test]
    fn test_clear() {
        let mut t = table();
        for n in 1..=10 {
            t.upsert(key(n), cols("r"), false).unwrap();
        }
        t.clear();
        assert_eq!(t.arena.len(), 0);
        assert_eq!(t.visible_count(), 0);
        assert_eq!(t.cursor, Some(SENTINEL));
        assert!(!t.contains(key(1)));
        t.verify().unwrap();

        t.upsert(key(1), cols("r"), false).unwrap();
        assert_eq!(t.visible_count(), 1);
    }

    #[test]
    fn test_random_churn_keeps_invariants() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(42);
        let mut t = table();
        for step in 0..2000 {
            let n = rng.gen_range(1..=200);
            match rng.gen_range(0..4) {
                0 => {
                    let _ = t.delete(key(n));
                }
                1 => {
                    t.cursor = t.index.get(&key(n)).copied();
                }
                _ => {
                    let value = rng.gen_range(0..50u64);
                    t.upsert(key(n), vec![SortColumn::unsigned(value)], rng.gen_bool(0.2))
                        .unwrap();
                }
            }
            if step % 100 == 0 {
                t.verify().unwrap();
            }
        }
        t.verify().unwrap();
        assert_eq!(t.index.len(), t.arena.len());
    }

    #[test]
    fn test_memory_usage_grows() {
        let mut t = table();
        let empty = t.memory_usage();
        for n in 1..=100 {
            t.upsert(key(n), vec![SortColumn::binary(&[7; 64])], false)
                .unwrap();
        }
        assert!(t.memory_usage() > empty + 100 * 64);
    }
}
