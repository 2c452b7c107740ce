//! Shared helpers for integration tests.

use std::sync::Once;

use keytable_common::types::{RowKey, SortColumn};
use keytable_core::{CursorPosition, KeyTable, SeekOrigin};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// The filter comes from `RUST_LOG`; nothing is printed when it is unset.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Builds a row key from an object id, with order id 0.
pub fn key(object_id: u32) -> RowKey {
    RowKey::new(object_id, 0)
}

/// Builds a sort key of ascending string columns.
pub fn string_row(parts: &[&str]) -> Vec<SortColumn> {
    parts.iter().map(|part| SortColumn::string(part)).collect()
}

/// Reads every row in sort order.
///
/// Leaves the cursor before the first row.
pub fn all_rows(table: &KeyTable, include_hidden: bool) -> Vec<RowKey> {
    rewind(table);
    table.query_rows(usize::MAX, false, include_hidden, false)
}

/// Moves the cursor before the first row, hidden rows included.
pub fn rewind(table: &KeyTable) {
    let _ = table.seek(SeekOrigin::Start, 0);
    while table.cursor_position() != CursorPosition::BeforeFirst {
        table.prev();
    }
}

/// Reads the visible rows between two ranks.
pub fn page(table: &KeyTable, start: u32, count: usize) -> Vec<RowKey> {
    let _ = table.seek(SeekOrigin::Start, i64::from(start));
    table.query_rows(count, false, false, false)
}
