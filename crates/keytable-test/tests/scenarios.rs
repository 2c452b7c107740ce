//! Scenario tests for the KeyTable public API.
//!
//! Each test drives a table the way a view layer would: mutate, seek, page
//! through rows, collapse and expand categories, keep bookmarks.

use keytable_common::types::{BookmarkId, SortColumn};
use keytable_core::{
    CursorPosition, KeyTable, KeyTableError, RowAction, SeekOrigin, Warning,
};
use keytable_common::config::KeyTableConfig;
use keytable_test::utils::{all_rows, init_tracing, key, page, string_row};
use keytable_test::model::ReferenceTable;
use keytable_test::workload::{apply, apply_model, category_rows, WorkloadGenerator};

// =============================================================================
// Sorting and paging
// =============================================================================

#[test]
fn test_insert_and_delete_scenario() {
    init_tracing();
    let table = KeyTable::new();
    table.upsert(key(1), string_row(&["b"]), false).unwrap();
    table.upsert(key(2), string_row(&["a"]), false).unwrap();
    table.upsert(key(3), string_row(&["c"]), false).unwrap();

    table.seek(SeekOrigin::Start, 0).unwrap();
    assert_eq!(
        table.query_rows(3, false, false, true),
        vec![key(2), key(1), key(3)]
    );

    table.delete(key(1)).unwrap();
    assert_eq!(table.visible_count(), 2);
    table.seek(SeekOrigin::Start, 0).unwrap();
    assert_eq!(table.query_rows(3, false, false, true), vec![key(2), key(3)]);
    table.verify().unwrap();
}

#[test]
fn test_multi_column_sort() {
    // Folder ascending, then date descending
    let table = KeyTable::new();
    let row = |folder: &str, date: u64| {
        vec![SortColumn::string(folder), SortColumn::unsigned(date).descending()]
    };
    table.upsert(key(1), row("inbox", 100), false).unwrap();
    table.upsert(key(2), row("inbox", 300), false).unwrap();
    table.upsert(key(3), row("archive", 200), false).unwrap();
    table.upsert(key(4), row("inbox", 200), false).unwrap();

    assert_eq!(all_rows(&table, false), vec![key(3), key(2), key(4), key(1)]);
}

#[test]
fn test_float_and_signed_columns() {
    let table = KeyTable::new();
    table.upsert(key(1), vec![SortColumn::float(2.5)], false).unwrap();
    table.upsert(key(2), vec![SortColumn::float(-7.0)], false).unwrap();
    table.upsert(key(3), vec![SortColumn::float(0.0)], false).unwrap();
    assert_eq!(all_rows(&table, false), vec![key(2), key(3), key(1)]);

    let table = KeyTable::new();
    table.upsert(key(1), vec![SortColumn::signed(5)], false).unwrap();
    table.upsert(key(2), vec![SortColumn::signed(-5)], false).unwrap();
    table.upsert(key(3), vec![SortColumn::signed(i64::MIN)], false).unwrap();
    assert_eq!(all_rows(&table, false), vec![key(3), key(2), key(1)]);
}

#[test]
fn test_paging_through_large_table() {
    let table = KeyTable::new();
    for n in 1..=1000u32 {
        // Insert in a scrambled order
        let value = (n * 7919) % 1000;
        table
            .upsert(key(n), vec![SortColumn::unsigned(u64::from(value))], false)
            .unwrap();
    }

    let mut seen = Vec::new();
    table.seek(SeekOrigin::Start, 0).unwrap();
    loop {
        let rows = table.query_rows(64, false, false, true);
        if rows.is_empty() {
            break;
        }
        seen.extend(rows);
    }
    assert_eq!(seen.len(), 1000);
    assert_eq!(table.cursor_position(), CursorPosition::PastEnd);

    // Random access pages agree with the sequential scan
    assert_eq!(page(&table, 500, 10), seen[500..510].to_vec());
    table.verify().unwrap();
}

#[test]
fn test_backward_paging() {
    let table = KeyTable::new();
    for n in 1..=10 {
        table
            .upsert(key(n), vec![SortColumn::unsigned(u64::from(n))], false)
            .unwrap();
    }

    table.seek(SeekOrigin::End, 0).unwrap();
    assert_eq!(table.query_rows(3, true, false, true), vec![key(10), key(9), key(8)]);
    assert_eq!(table.query_rows(3, true, false, true), vec![key(7), key(6), key(5)]);
    assert_eq!(table.current_rank(), 3);
}

#[test]
fn test_get_previous_row_skips_hidden() {
    let table = KeyTable::new();
    table.upsert(key(1), string_row(&["a"]), false).unwrap();
    table.upsert(key(2), string_row(&["b"]), true).unwrap();
    table.upsert(key(3), string_row(&["c"]), false).unwrap();

    assert_eq!(table.get_previous_row(key(3)).unwrap(), Some(key(1)));
    assert_eq!(table.get_previous_row(key(1)).unwrap(), None);
    assert!(matches!(
        table.get_previous_row(key(4)),
        Err(KeyTableError::NotFound { .. })
    ));
}

// =============================================================================
// Mutation under a cursor
// =============================================================================

#[test]
fn test_noop_update_leaves_ranks_alone() {
    let table = KeyTable::new();
    for n in 1..=5 {
        table
            .upsert(key(n), vec![SortColumn::unsigned(u64::from(n))], false)
            .unwrap();
    }
    table.seek(SeekOrigin::Start, 3).unwrap();

    let up = table
        .upsert(key(2), vec![SortColumn::unsigned(2)], false)
        .unwrap();
    assert_eq!(up.action, RowAction::Modified);
    assert_eq!(up.predecessor, Some(key(1)));
    assert_eq!(table.current_rank(), 3);
    assert_eq!(table.stats().noop_updates(), 1);
}

#[test]
fn test_resort_reports_new_predecessor() {
    let table = KeyTable::new();
    for (n, s) in [(1, "a"), (2, "b"), (3, "c")] {
        table.upsert(key(n), string_row(&[s]), false).unwrap();
    }
    let up = table.upsert(key(1), string_row(&["bb"]), false).unwrap();
    assert_eq!(up.action, RowAction::Modified);
    assert_eq!(up.predecessor, Some(key(2)));
    assert_eq!(all_rows(&table, false), vec![key(2), key(1), key(3)]);
}

#[test]
fn test_cursor_follows_resorted_row() {
    let table = KeyTable::new();
    for (n, s) in [(1, "a"), (2, "b"), (3, "c")] {
        table.upsert(key(n), string_row(&[s]), false).unwrap();
    }
    table.seek_id(key(1)).unwrap();
    table.upsert(key(1), string_row(&["z"]), false).unwrap();

    assert_eq!(table.cursor_position(), CursorPosition::Row(key(1)));
    assert_eq!(table.current_rank(), 2);
}

#[test]
fn test_delete_under_cursor() {
    let table = KeyTable::new();
    for (n, s) in [(1, "a"), (2, "b")] {
        table.upsert(key(n), string_row(&[s]), false).unwrap();
    }
    table.seek_id(key(1)).unwrap();
    table.delete(key(1)).unwrap();
    assert_eq!(table.cursor_position(), CursorPosition::Row(key(2)));

    table.delete(key(2)).unwrap();
    assert_eq!(table.cursor_position(), CursorPosition::PastEnd);
    assert!(table.is_empty());
}

#[test]
fn test_partial_sort_key_update() {
    let table = KeyTable::new();
    let row = |a: &str, n: u64| vec![SortColumn::string(a), SortColumn::unsigned(n)];
    table.upsert(key(1), row("x", 1), false).unwrap();
    table.upsert(key(2), row("x", 2), false).unwrap();
    table.upsert(key(3), row("y", 0), false).unwrap();

    let up = table
        .update_partial_sort_key(key(1), 0, SortColumn::string("z"))
        .unwrap();
    assert_eq!(up.predecessor, Some(key(3)));
    assert!(!up.hidden);
    assert_eq!(
        table.get_row(key(1)).unwrap().columns,
        row("z", 1)
    );

    assert!(matches!(
        table.update_partial_sort_key(key(1), 5, SortColumn::unsigned(0)),
        Err(KeyTableError::InvalidParameter { .. })
    ));
}

#[test]
fn test_failed_mutation_leaves_table_unchanged() {
    let table = KeyTable::new();
    table.upsert(key(1), string_row(&["a"]), false).unwrap();
    table.seek(SeekOrigin::Start, 0).unwrap();

    assert!(table.delete(key(9)).is_err());
    assert!(table
        .upsert(keytable_common::types::RowKey::EMPTY, string_row(&["b"]), false)
        .is_err());
    assert!(table.update_partial_sort_key(key(1), 3, SortColumn::unsigned(1)).is_err());

    assert_eq!(table.len(), 1);
    assert_eq!(table.cursor_position(), CursorPosition::Row(key(1)));
    table.verify().unwrap();
}

// =============================================================================
// Categories
// =============================================================================

#[test]
fn test_collapse_category_scenario() {
    init_tracing();
    let table = KeyTable::new();
    table.upsert(key(2), string_row(&["cat1", "x"]), false).unwrap();
    table.upsert(key(3), string_row(&["cat1", "y"]), false).unwrap();
    table.upsert(key(4), string_row(&["cat2", "z"]), false).unwrap();
    table.upsert(key(1), string_row(&["cat1"]), false).unwrap();
    let before = table.visible_count();

    let hidden = table.hide_from(key(1)).unwrap();
    assert_eq!(hidden, vec![key(2), key(3)]);
    assert_eq!(table.visible_count(), before - 2);
    assert!(!table.get_row(key(4)).unwrap().hidden);
    table.verify().unwrap();
}

#[test]
fn test_collapse_expand_roundtrip() {
    let table = KeyTable::new();
    for (key, columns) in category_rows(4, 5) {
        table.upsert(key, columns, false).unwrap();
    }
    let visible = table.visible_count();
    let order = all_rows(&table, false);

    // Second category header is key 7
    let header = key(7);
    let members = table.rows_by_prefix(header).unwrap();
    assert_eq!(members.len(), 6);

    assert_eq!(table.hide_from(header).unwrap(), members[1..].to_vec());
    assert_eq!(table.visible_count(), visible - 5);
    assert_eq!(table.unhide_from(header).unwrap(), members[1..].to_vec());
    assert_eq!(table.visible_count(), visible);
    assert_eq!(all_rows(&table, false), order);
}

#[test]
fn test_hidden_rows_and_paging() {
    let table = KeyTable::new();
    for (key, columns) in category_rows(3, 3) {
        table.upsert(key, columns, false).unwrap();
    }
    // Collapse the first category: header 1 keeps members 2..=4 hidden
    table.hide_from(key(1)).unwrap();

    assert_eq!(page(&table, 0, 3), vec![key(1), key(5), key(6)]);
    table.seek(SeekOrigin::Start, 1).unwrap();
    assert_eq!(table.cursor_position(), CursorPosition::Row(key(5)));
    assert_eq!(table.query_rows(100, false, true, false).len(), 8);
}

#[test]
fn test_expand_nested_category_one_level() {
    let table = KeyTable::new();
    table.upsert(key(1), string_row(&["2024"]), false).unwrap();
    table.upsert(key(2), string_row(&["2024", "jan"]), false).unwrap();
    table.upsert(key(3), string_row(&["2024", "jan", "m1"]), false).unwrap();
    table.upsert(key(4), string_row(&["2024", "feb"]), false).unwrap();
    table.upsert(key(5), string_row(&["2024", "feb", "m2"]), false).unwrap();

    table.hide_from(key(1)).unwrap();
    assert_eq!(table.visible_count(), 1);

    let shown = table.unhide_from(key(1)).unwrap();
    assert_eq!(shown, vec![key(4), key(2)]);
    assert_eq!(all_rows(&table, false), vec![key(1), key(4), key(2)]);

    // A nested header that is hidden cannot be expanded
    table.hide_from(key(1)).unwrap();
    assert!(matches!(
        table.unhide_from(key(2)),
        Err(KeyTableError::NotFound { .. })
    ));
}

// =============================================================================
// Bookmarks
// =============================================================================

#[test]
fn test_bookmark_drift() {
    let table = KeyTable::new();
    for (n, s) in [(1, "b"), (2, "c")] {
        table.upsert(key(n), string_row(&[s]), false).unwrap();
    }
    table.seek_id(key(2)).unwrap();
    let bookmark = table.create_bookmark().unwrap();
    assert!(bookmark.as_u32() >= 3);

    table.upsert(key(3), string_row(&["a"]), false).unwrap();
    let pos = table.resolve_bookmark(bookmark).unwrap();
    assert!(pos.drifted);
    assert_eq!(pos.rank, 2);
    assert_eq!(pos.warning(), Some(Warning::PositionChanged));

    table.seek(SeekOrigin::Start, 0).unwrap();
    let out = table.seek(SeekOrigin::Bookmark(bookmark), -1).unwrap();
    assert_eq!(out.rows_moved, -1);
    assert_eq!(out.warning(), Some(Warning::PositionChanged));
    assert_eq!(table.cursor_position(), CursorPosition::Row(key(1)));
}

#[test]
fn test_bookmark_limit_and_reuse() {
    let table = KeyTable::with_config(KeyTableConfig::new().with_bookmark_limit(2)).unwrap();
    let a = table.create_bookmark().unwrap();
    let _b = table.create_bookmark().unwrap();
    assert_eq!(
        table.create_bookmark(),
        Err(KeyTableError::ResourceExhausted { limit: 2 })
    );

    table.free_bookmark(a).unwrap();
    assert!(table.create_bookmark().is_ok());
}

#[test]
fn test_bookmark_on_deleted_row_is_invalid() {
    let table = KeyTable::new();
    table.upsert(key(1), string_row(&["a"]), false).unwrap();
    table.seek_id(key(1)).unwrap();
    let bookmark = table.create_bookmark().unwrap();

    table.delete(key(1)).unwrap();
    assert_eq!(
        table.resolve_bookmark(bookmark),
        Err(KeyTableError::InvalidBookmark { id: bookmark })
    );
    assert!(table.free_bookmark(BookmarkId::new(999)).is_err());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_clear_and_reuse() {
    let table = KeyTable::with_config(KeyTableConfig::for_testing()).unwrap();
    for (key, columns) in category_rows(2, 2) {
        table.upsert(key, columns, false).unwrap();
    }
    table.create_bookmark().unwrap();
    table.clear();

    assert!(table.is_empty());
    assert_eq!(table.bookmark_count(), 0);
    assert_eq!(table.cursor_position(), CursorPosition::BeforeFirst);
    assert!(table.find(&string_row(&["cat0000"])).is_none());

    table.upsert(key(1), string_row(&["fresh"]), false).unwrap();
    assert_eq!(table.visible_count(), 1);
    table.verify().unwrap();
}

#[test]
fn test_lower_bound_positions_cursor() {
    let table = KeyTable::new();
    for (n, s) in [(1, "apple"), (2, "banana"), (3, "cherry")] {
        table.upsert(key(n), string_row(&[s]), false).unwrap();
    }
    table.lower_bound(&string_row(&["b"]));
    assert_eq!(table.cursor_position(), CursorPosition::Row(key(2)));
    assert_eq!(table.query_rows(5, false, false, true), vec![key(2), key(3)]);
}

// =============================================================================
// Long churn
// =============================================================================

#[test]
fn test_long_churn_with_categories_and_bookmarks() {
    init_tracing();
    let table = KeyTable::new();
    let mut model = ReferenceTable::new();
    let mut workload = WorkloadGenerator::new(2024)
        .with_key_space(200)
        .with_category_depth(3)
        .with_hidden_ratio(0.05);

    let mut bookmarks = Vec::new();
    for (step, op) in workload.ops(5000).iter().enumerate() {
        apply(&table, op).unwrap();
        apply_model(&mut model, op);
        if step % 50 == 0 {
            if let Ok(id) = table.create_bookmark() {
                bookmarks.push(id);
            }
        }
        if step % 250 == 0 {
            table.verify().unwrap();
        }
    }

    table.verify().unwrap();
    assert_eq!(table.len(), model.len());
    assert_eq!(all_rows(&table, true), model.keys(true));
    assert_eq!(all_rows(&table, false), model.keys(false));

    // Bookmarks on deleted or re-sorted rows are gone, the rest resolve
    let visible = table.visible_count();
    for id in bookmarks {
        match table.resolve_bookmark(id) {
            Ok(pos) => assert!(pos.rank <= visible),
            Err(err) => assert!(matches!(err, KeyTableError::InvalidBookmark { .. })),
        }
    }
}
