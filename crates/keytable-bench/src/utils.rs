//! Benchmark utilities and helpers.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use keytable_common::types::{RowKey, SortColumn};
use keytable_core::KeyTable;

/// Generates a random subject-like string.
pub fn random_string(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates message-list rows: subject ascending, then date descending.
pub fn generate_message_rows(count: u32) -> Vec<(RowKey, Vec<SortColumn>)> {
    let mut rng = StdRng::seed_from_u64(42);
    (1..=count)
        .map(|n| {
            let subject = random_string(&mut rng, 12);
            let date: u64 = rng.gen_range(1_600_000_000..1_700_000_000);
            (
                RowKey::new(n, 0),
                vec![
                    SortColumn::string(&subject),
                    SortColumn::unsigned(date).descending(),
                ],
            )
        })
        .collect()
}

/// Generates rows whose single column follows insertion order.
pub fn generate_sequential_rows(count: u32) -> Vec<(RowKey, Vec<SortColumn>)> {
    (1..=count)
        .map(|n| (RowKey::new(n, 0), vec![SortColumn::unsigned(u64::from(n))]))
        .collect()
}

/// Builds a table from rows.
pub fn build_table(rows: &[(RowKey, Vec<SortColumn>)]) -> KeyTable {
    let table = KeyTable::new();
    for (key, columns) in rows {
        // Keys are unique and non-empty
        let _ = table.upsert(*key, columns.clone(), false);
    }
    table
}
