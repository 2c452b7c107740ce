//! Slot arena owning every row of a table.
//!
//! Nodes refer to each other by [`NodeId`] instead of pointers. The tree
//! structure (child links down, parent link up) lives in the rows; the arena
//! only owns the storage and recycles freed slots.
//!
//! Slot 0 always holds the sentinel and is never freed.

use std::ops::{Index, IndexMut};

use keytable_common::error::{KeyTableError, KeyTableResult};

use crate::row::{NodeId, TableRow};

/// Arena of table rows with a free list.
#[derive(Debug)]
pub(crate) struct RowArena {
    slots: Vec<Option<TableRow>>,
    free: Vec<NodeId>,
}

impl RowArena {
    /// Creates an arena holding only the sentinel.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.saturating_add(1));
        slots.push(Some(TableRow::sentinel()));
        Self {
            slots,
            free: Vec::new(),
        }
    }

    /// Makes sure the next [`alloc`](Self::alloc) cannot fail.
    ///
    /// Called before any structural change so that an allocation failure
    /// leaves the table untouched.
    pub(crate) fn reserve_one(&mut self) -> KeyTableResult<()> {
        if !self.free.is_empty() {
            return Ok(());
        }
        if self.slots.len() > u32::MAX as usize {
            return Err(KeyTableError::OutOfMemory);
        }
        self.slots
            .try_reserve(1)
            .map_err(|_| KeyTableError::OutOfMemory)?;
        // Freeing the new slot later must not allocate either
        self.free
            .try_reserve(self.slots.len() + 1 - self.free.len())
            .map_err(|_| KeyTableError::OutOfMemory)
    }

    /// Stores a row and returns its id.
    pub(crate) fn alloc(&mut self, row: TableRow) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(row);
            return id;
        }

        let id = NodeId::new(self.slots.len() as u32);
        self.slots.push(Some(row));
        id
    }

    /// Removes a row from the arena.
    pub(crate) fn free(&mut self, id: NodeId) -> Option<TableRow> {
        if id == NodeId::SENTINEL {
            return None;
        }
        let row = self.slots.get_mut(id.index())?.take()?;
        self.free.push(id);
        Some(row)
    }

    /// Returns the row with the given id, if the slot is occupied.
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&TableRow> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Number of live rows, excluding the sentinel.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len() - 1
    }

    /// Drops every row and keeps a fresh sentinel.
    pub(crate) fn clear(&mut self) {
        self.slots.truncate(1);
        self.slots[0] = Some(TableRow::sentinel());
        self.free.clear();
    }

    /// Iterates over live rows, sentinel excluded, in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeId, &TableRow)> {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, slot)| slot.as_ref().map(|row| (NodeId::new(i as u32), row)))
    }

    /// Bytes held by the arena itself and by the rows' column data.
    pub(crate) fn memory_usage(&self) -> usize {
        let slot_bytes = self.slots.capacity() * std::mem::size_of::<Option<TableRow>>();
        let free_bytes = self.free.capacity() * std::mem::size_of::<NodeId>();
        let column_bytes: usize = self
            .iter()
            .map(|(_, row)| row.memory_size() - std::mem::size_of::<TableRow>())
            .sum();
        slot_bytes + free_bytes + column_bytes
    }
}

impl Index<NodeId> for RowArena {
    type Output = TableRow;

    #[inline]
    fn index(&self, id: NodeId) -> &TableRow {
        match self.slots.get(id.index()) {
            Some(Some(row)) => row,
            _ => panic!("dangling {id:?}"),
        }
    }
}

impl IndexMut<NodeId> for RowArena {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut TableRow {
        match self.slots.get_mut(id.index()) {
            Some(Some(row)) => row,
            _ => panic!("dangling {id:?}"),
        }
    }
}
