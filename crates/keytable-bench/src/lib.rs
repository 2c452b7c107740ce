//! KeyTable Performance Benchmarks
//!
//! This crate contains benchmarks for the table engine:
//! - Bulk and random inserts
//! - Re-sorting existing rows
//! - Rank seeks and paging
//! - Category collapse and expand
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p keytable-bench
//! ```

pub mod utils;
