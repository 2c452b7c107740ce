//! A slow reference model of a table.
//!
//! Rows live in a plain vector kept in sort order. An upsert goes after
//! every row that does not sort after it, which is where the tree puts it
//! too, so the model predicts the exact row order including ties.

use std::cmp::Ordering;

use keytable_common::types::{RowKey, SortColumn};
use keytable_core::RowComparator;

/// One row of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRow {
    /// Row identity.
    pub key: RowKey,
    /// Sort key.
    pub columns: Vec<SortColumn>,
    /// Visibility.
    pub hidden: bool,
}

/// Ordered list of rows.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    comparator: RowComparator,
    rows: Vec<ModelRow>,
}

impl ReferenceTable {
    /// Creates an empty model with the default comparator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an upsert.
    pub fn upsert(&mut self, key: RowKey, columns: Vec<SortColumn>, hidden: bool) {
        if let Some(pos) = self.position(key) {
            let stored = &self.rows[pos].columns;
            if self.comparator.compare(stored, &columns, false) == Ordering::Equal
                && self.comparator.compare(&columns, stored, false) == Ordering::Equal
            {
                return;
            }
            self.rows.remove(pos);
        }

        let at = self.rows.partition_point(|row| {
            self.comparator.compare(&row.columns, &columns, false) != Ordering::Greater
        });
        self.rows.insert(
            at,
            ModelRow {
                key,
                columns,
                hidden,
            },
        );
    }

    /// Applies a delete. Returns false if the key was absent.
    pub fn delete(&mut self, key: RowKey) -> bool {
        match self.position(key) {
            Some(pos) => {
                self.rows.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Hides the rows after `key` sharing its sort key as a prefix.
    /// Returns `None` if the key is absent.
    pub fn hide_from(&mut self, key: RowKey) -> Option<Vec<RowKey>> {
        let pos = self.position(key)?;
        let members = self.members(pos);
        for &at in &members {
            self.rows[at].hidden = true;
        }
        Some(members.into_iter().map(|at| self.rows[at].key).collect())
    }

    /// Unhides the members of `key` at the depth of the first one.
    /// Returns `None` if the key is absent or hidden.
    pub fn unhide_from(&mut self, key: RowKey) -> Option<Vec<RowKey>> {
        let pos = self.position(key)?;
        if self.rows[pos].hidden {
            return None;
        }
        let members = self.members(pos);
        let depth = members.first().map(|&at| self.rows[at].columns.len());

        let mut shown = Vec::new();
        for at in members {
            if Some(self.rows[at].columns.len()) == depth {
                self.rows[at].hidden = false;
                shown.push(self.rows[at].key);
            }
        }
        Some(shown)
    }

    /// Indices of the contiguous rows after `pos` that share its prefix.
    fn members(&self, pos: usize) -> Vec<usize> {
        let prefix = &self.rows[pos].columns;
        (pos + 1..self.rows.len())
            .take_while(|&at| {
                self.comparator
                    .compare_prefix(prefix.len(), prefix, &self.rows[at].columns)
                    == Ordering::Equal
            })
            .collect()
    }

    /// Index of a key in sort order.
    pub fn position(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|row| row.key == key)
    }

    /// Keys in sort order.
    pub fn keys(&self, include_hidden: bool) -> Vec<RowKey> {
        self.rows
            .iter()
            .filter(|row| include_hidden || !row.hidden)
            .map(|row| row.key)
            .collect()
    }

    /// Number of visible rows.
    pub fn visible_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.hidden).count()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the model has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row before `key` in sort order, hidden rows included.
    pub fn predecessor(&self, key: RowKey) -> Option<RowKey> {
        let pos = self.position(key)?;
        pos.checked_sub(1).map(|prev| self.rows[prev].key)
    }
}
