//! Integrity checker.
//!
//! Walks the whole tree and reports the first broken structural invariant.
//! O(n); meant for tests and debugging, not for hot paths.

use std::cmp::Ordering;

use keytable_common::error::{KeyTableError, KeyTableResult};

use crate::row::NodeId;
use crate::tree::TableInner;

const SENTINEL: NodeId = NodeId::SENTINEL;

fn violation(reason: String) -> KeyTableError {
    tracing::warn!("Integrity check failed: {}", reason);
    KeyTableError::corrupted(reason)
}

impl TableInner {
    /// Checks links, counts, heights, balance, order, the identity index,
    /// the cursor and the bookmarks.
    pub(crate) fn verify(&self) -> KeyTableResult<()> {
        let sentinel = &self.arena[SENTINEL];
        if !sentinel.sentinel || sentinel.hidden || sentinel.left.is_some() {
            return Err(violation("malformed sentinel".to_string()));
        }

        let mut visited = 0usize;
        let (visible, height) = match self.root() {
            Some(root) => {
                let row = &self.arena[root];
                if row.parent != Some(SENTINEL) || row.is_left {
                    return Err(violation(format!("root {} not linked to sentinel", row.key)));
                }
                self.verify_subtree(root, &mut visited)?
            }
            None => (0, 0),
        };

        if sentinel.visible != visible || sentinel.height != height {
            return Err(violation(format!(
                "sentinel counts {}/{} expected {}/{}",
                sentinel.visible, sentinel.height, visible, height
            )));
        }

        if visited != self.arena.len() || visited != self.index.len() {
            return Err(violation(format!(
                "{} reachable rows, {} allocated, {} indexed",
                visited,
                self.arena.len(),
                self.index.len()
            )));
        }

        for (key, &id) in &self.index {
            match self.arena.get(id) {
                Some(row) if row.key == *key => {}
                _ => return Err(violation(format!("index entry {key} is stale"))),
            }
        }

        self.verify_order()?;

        if let Some(id) = self.cursor {
            if self.arena.get(id).is_none() {
                return Err(violation(format!("cursor on freed node {id:?}")));
            }
        }
        for (id, bookmark) in &self.bookmarks {
            if let Some(node) = bookmark.position {
                if self.arena.get(node).is_none() {
                    return Err(violation(format!("bookmark {id} on freed node {node:?}")));
                }
            }
        }

        Ok(())
    }

    /// Returns the subtree's visible count and height.
    fn verify_subtree(&self, id: NodeId, visited: &mut usize) -> KeyTableResult<(u32, u32)> {
        *visited += 1;
        if *visited > self.arena.len() {
            return Err(violation("cycle in tree links".to_string()));
        }

        let row = &self.arena[id];
        if row.sentinel {
            return Err(violation(format!("sentinel reachable below {id:?}")));
        }

        let mut child_counts = [(0, 0); 2];
        for (slot, (child, is_left)) in [(row.left, true), (row.right, false)]
            .into_iter()
            .enumerate()
        {
            let Some(child) = child else { continue };
            let child_row = self
                .arena
                .get(child)
                .ok_or_else(|| violation(format!("row {} links to freed node", row.key)))?;
            if child_row.parent != Some(id) || child_row.is_left != is_left {
                return Err(violation(format!(
                    "row {} has inconsistent parent link",
                    child_row.key
                )));
            }
            child_counts[slot] = self.verify_subtree(child, visited)?;
        }

        let [(left_visible, left_height), (right_visible, right_height)] = child_counts;
        let visible = u32::from(!row.hidden) + left_visible + right_visible;
        let height = 1 + left_height.max(right_height);

        if row.visible != visible || row.height != height {
            return Err(violation(format!(
                "row {} counts {}/{} expected {}/{}",
                row.key, row.visible, row.height, visible, height
            )));
        }
        if left_height.abs_diff(right_height) > 1 {
            return Err(violation(format!(
                "row {} unbalanced ({} vs {})",
                row.key, left_height, right_height
            )));
        }

        Ok((visible, height))
    }

    fn verify_order(&self) -> KeyTableResult<()> {
        let mut prev: Option<NodeId> = None;
        let mut cur = self.step_next(Some(SENTINEL));
        while let Some(id) = cur {
            if let Some(prev) = prev {
                let (a, b) = (&self.arena[prev], &self.arena[id]);
                if self.comparator.compare(&a.columns, &b.columns, false) == Ordering::Greater {
                    return Err(violation(format!("row {} sorts after {}", a.key, b.key)));
                }
            }
            prev = Some(id);
            cur = self.step_next(cur);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{cols, key, table};

    fn filled() -> TableInner {
        let mut t = table();
        for (n, s) in [(1, "d"), (2, "b"), (3, "f"), (4, "a"), (5, "c")] {
            t.upsert(key(n), cols(s), false).unwrap();
        }
        t
    }

    #[test]
    fn test_valid_tables_pass() {
        assert!(table().verify().is_ok());
        assert!(filled().verify().is_ok());
    }

    #[test]
    fn test_detects_bad_count() {
        let mut t = filled();
        let id = t.lookup(key(4)).unwrap();
        t.arena[id].visible = 7;
        let err = t.verify().unwrap_err();
        assert!(matches!(err, KeyTableError::Corrupted { .. }));
    }

    #[test]
    fn test_detects_unsynced_hidden_flag() {
        let mut t = filled();
        let id = t.lookup(key(2)).unwrap();
        t.arena[id].hidden = true;
        assert!(t.verify().is_err());
        t.update_counts(id);
        assert!(t.verify().is_ok());
    }

    #[test]
    fn test_detects_bad_order() {
        let mut t = filled();
        let id = t.lookup(key(4)).unwrap();
        t.arena[id].columns = cols("zzz");
        let err = t.verify().unwrap_err();
        assert!(err.to_string().contains("sorts after"));
    }

    #[test]
    fn test_detects_stale_index() {
        let mut t = filled();
        let id = t.lookup(key(1)).unwrap();
        t.index.insert(key(9), id);
        assert!(t.verify().is_err());
    }

    #[test]
    fn test_detects_bad_parent_link() {
        let mut t = filled();
        let root = t.root().unwrap();
        let child = t.arena[root].left.unwrap();
        t.arena[child].is_left = false;
        assert!(t.verify().is_err());
    }
}
