//! Category collapse and expand.
//!
//! A category header is a row whose sort key is a strict prefix of its
//! members' keys, so the members sort directly after it. Collapsing hides
//! the members; expanding unhides one nesting level of them.

use std::cmp::Ordering;

use keytable_common::error::{KeyTableError, KeyTableResult};
use keytable_common::types::{RowKey, SortColumn};

use crate::row::NodeId;
use crate::tree::TableInner;

impl TableInner {
    /// Looks up a header row and copies its sort key.
    fn category_start(&self, key: RowKey) -> KeyTableResult<(NodeId, Vec<SortColumn>)> {
        let header = self.lookup(key)?;
        Ok((header, self.arena[header].columns.clone()))
    }

    /// Yields the row at `cur` if it shares the header's prefix.
    fn in_category(&self, prefix: &[SortColumn], cur: Option<NodeId>) -> Option<NodeId> {
        let id = cur.filter(|&id| id != NodeId::SENTINEL)?;
        let matches = self
            .comparator
            .compare_prefix(prefix.len(), prefix, &self.arena[id].columns)
            == Ordering::Equal;
        matches.then_some(id)
    }

    fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if self.arena[id].hidden != hidden {
            self.arena[id].hidden = hidden;
            self.update_counts(id);
        }
    }

    /// Hides every row after `key` that shares its sort key as a prefix.
    pub(crate) fn hide_from(&mut self, key: RowKey) -> KeyTableResult<Vec<RowKey>> {
        let (header, prefix) = self.category_start(key)?;

        let mut hidden = Vec::new();
        let mut cursor_hidden = false;
        let mut cur = self.step_next(Some(header));
        while let Some(id) = self.in_category(&prefix, cur) {
            self.set_hidden(id, true);
            hidden.push(self.arena[id].key);
            cursor_hidden |= self.cursor == Some(id);
            cur = self.step_next(cur);
        }

        if cursor_hidden {
            while let Some(id) = cur.filter(|&id| self.arena[id].hidden) {
                cur = self.step_next(Some(id));
            }
            self.cursor = cur;
        }

        self.stats.record_hidden(hidden.len());
        tracing::debug!("Collapsed category {} ({} rows)", key, hidden.len());
        Ok(hidden)
    }

    /// Unhides the direct members of the category headed by `key`.
    ///
    /// Direct members have as many columns as the first row after the
    /// header; deeper rows stay hidden.
    pub(crate) fn unhide_from(&mut self, key: RowKey) -> KeyTableResult<Vec<RowKey>> {
        let (header, prefix) = self.category_start(key)?;
        if self.arena[header].hidden {
            return Err(KeyTableError::NotFound { key });
        }

        let mut unhidden = Vec::new();
        let mut cur = self.step_next(Some(header));
        let depth = self
            .in_category(&prefix, cur)
            .map(|id| self.arena[id].columns.len());

        while let Some(id) = self.in_category(&prefix, cur) {
            if Some(self.arena[id].columns.len()) == depth {
                self.set_hidden(id, false);
                unhidden.push(self.arena[id].key);
            }
            cur = self.step_next(cur);
        }

        self.stats.record_unhidden(unhidden.len());
        tracing::debug!("Expanded category {} ({} rows)", key, unhidden.len());
        Ok(unhidden)
    }

    /// Lists `key` followed by every row sharing its sort key as a prefix,
    /// regardless of visibility.
    pub(crate) fn rows_by_prefix(&self, key: RowKey) -> KeyTableResult<Vec<RowKey>> {
        let (header, prefix) = self.category_start(key)?;

        let mut rows = Vec::new();
        let mut cur = Some(header);
        while let Some(id) = self.in_category(&prefix, cur) {
            rows.push(self.arena[id].key);
            cur = self.step_next(cur);
        }
        Ok(rows)
    }
}
