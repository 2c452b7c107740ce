//! Random workload generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use keytable_common::error::{KeyTableError, KeyTableResult};
use keytable_common::types::{RowKey, SortColumn};
use keytable_core::{KeyTable, SeekOrigin};

use crate::model::ReferenceTable;

/// One table operation.
#[derive(Debug, Clone, PartialEq)]
pub enum TableOp {
    /// Insert or re-sort a row.
    Upsert {
        /// Row identity.
        key: RowKey,
        /// Sort key.
        columns: Vec<SortColumn>,
        /// Initial visibility.
        hidden: bool,
    },
    /// Delete a row; a missing key is not an error for the workload.
    Delete {
        /// Row identity.
        key: RowKey,
    },
    /// Seek relative to the current position.
    Seek {
        /// Signed offset.
        offset: i64,
    },
    /// Read a page forward from the cursor.
    Read {
        /// Page size.
        count: usize,
    },
    /// Collapse the category headed by a row; a missing key is ignored.
    Hide {
        /// Header row.
        key: RowKey,
    },
    /// Expand the category headed by a row; a missing or hidden header is
    /// ignored.
    Unhide {
        /// Header row.
        key: RowKey,
    },
}

/// Generates random operations over a bounded key space.
///
/// Sort keys are a string column followed by a descending number, so rows
/// regularly tie on the first column. With a category depth set, sort keys
/// are instead one to `depth` short string columns, so rows regularly head
/// categories of other rows.
pub struct WorkloadGenerator {
    rng: StdRng,
    key_space: u32,
    value_space: u64,
    hidden_ratio: f64,
    category_depth: usize,
}

impl WorkloadGenerator {
    /// Creates a generator with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            key_space: 1000,
            value_space: 100,
            hidden_ratio: 0.0,
            category_depth: 0,
        }
    }

    /// Sets the number of distinct row keys.
    pub fn with_key_space(mut self, key_space: u32) -> Self {
        self.key_space = key_space.max(1);
        self
    }

    /// Sets the number of distinct sort values.
    pub fn with_value_space(mut self, value_space: u64) -> Self {
        self.value_space = value_space.max(1);
        self
    }

    /// Sets the share of rows inserted hidden.
    pub fn with_hidden_ratio(mut self, ratio: f64) -> Self {
        self.hidden_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Switches to nested string sort keys of at most `depth` columns.
    pub fn with_category_depth(mut self, depth: usize) -> Self {
        self.category_depth = depth;
        self
    }

    /// Returns a random key from the key space.
    pub fn random_key(&mut self) -> RowKey {
        RowKey::new(self.rng.gen_range(1..=self.key_space), 0)
    }

    /// Returns a random two-column sort key.
    pub fn random_columns(&mut self) -> Vec<SortColumn> {
        if self.category_depth > 0 {
            let depth = self.rng.gen_range(1..=self.category_depth);
            return (0..depth)
                .map(|_| {
                    let part = self.rng.gen_range(0..self.value_space.min(3)) as u8;
                    SortColumn::string(&char::from(b'a' + part).to_string())
                })
                .collect();
        }

        let group = self.rng.gen_range(0..self.value_space.min(26)) as u8;
        let name = char::from(b'a' + group).to_string();
        vec![
            SortColumn::string(&name),
            SortColumn::unsigned(self.rng.gen_range(0..self.value_space)).descending(),
        ]
    }

    /// Returns the next operation.
    pub fn next_op(&mut self) -> TableOp {
        match self.rng.gen_range(0..12) {
            0..=5 => TableOp::Upsert {
                key: self.random_key(),
                columns: self.random_columns(),
                hidden: self.rng.gen_bool(self.hidden_ratio),
            },
            6 | 7 => TableOp::Delete {
                key: self.random_key(),
            },
            8 => TableOp::Seek {
                offset: self.rng.gen_range(-50..=50),
            },
            9 => TableOp::Hide {
                key: self.random_key(),
            },
            10 => TableOp::Unhide {
                key: self.random_key(),
            },
            _ => TableOp::Read {
                count: self.rng.gen_range(1..=20),
            },
        }
    }

    /// Returns `count` operations.
    pub fn ops(&mut self, count: usize) -> Vec<TableOp> {
        (0..count).map(|_| self.next_op()).collect()
    }

    /// Returns rows keyed 1..=count with random sort keys.
    pub fn bulk_rows(&mut self, count: u32) -> Vec<(RowKey, Vec<SortColumn>)> {
        (1..=count)
            .map(|n| (RowKey::new(n, 0), self.random_columns()))
            .collect()
    }
}

/// Applies an operation to a table.
pub fn apply(table: &KeyTable, op: &TableOp) -> KeyTableResult<()> {
    match op {
        TableOp::Upsert {
            key,
            columns,
            hidden,
        } => table.upsert(*key, columns.clone(), *hidden).map(|_| ()),
        TableOp::Delete { key } => ignore_missing(table.delete(*key)),
        TableOp::Seek { offset } => table.seek(SeekOrigin::Current, *offset).map(|_| ()),
        TableOp::Read { count } => {
            table.query_rows(*count, false, false, true);
            Ok(())
        }
        TableOp::Hide { key } => ignore_missing(table.hide_from(*key).map(|_| ())),
        TableOp::Unhide { key } => ignore_missing(table.unhide_from(*key).map(|_| ())),
    }
}

fn ignore_missing(result: KeyTableResult<()>) -> KeyTableResult<()> {
    match result {
        Err(KeyTableError::NotFound { .. }) => Ok(()),
        other => other,
    }
}

/// Applies an operation to the reference model. Cursor operations are
/// ignored.
pub fn apply_model(model: &mut ReferenceTable, op: &TableOp) {
    match op {
        TableOp::Upsert {
            key,
            columns,
            hidden,
        } => model.upsert(*key, columns.clone(), *hidden),
        TableOp::Delete { key } => {
            model.delete(*key);
        }
        TableOp::Hide { key } => {
            model.hide_from(*key);
        }
        TableOp::Unhide { key } => {
            model.unhide_from(*key);
        }
        TableOp::Seek { .. } | TableOp::Read { .. } => {}
    }
}

/// Builds category rows: `categories` one-column headers, each followed by
/// `members` two-column rows. Keys are numbered from 1 in sort order.
pub fn category_rows(categories: u32, members: u32) -> Vec<(RowKey, Vec<SortColumn>)> {
    let mut rows = Vec::with_capacity((categories * (members + 1)) as usize);
    let mut next = 1;
    for c in 0..categories {
        let header = format!("cat{c:04}");
        rows.push((RowKey::new(next, 0), vec![SortColumn::string(&header)]));
        next += 1;
        for m in 0..members {
            rows.push((
                RowKey::new(next, 0),
                vec![
                    SortColumn::string(&header),
                    SortColumn::string(&format!("m{m:04}")),
                ],
            ));
            next += 1;
        }
    }
    rows
}
