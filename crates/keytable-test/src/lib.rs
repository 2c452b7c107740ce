//! # keytable-test
//!
//! Integration tests for the KeyTable engine.
//!
//! This crate contains:
//! - Workload generators for random operation sequences
//! - A reference model that predicts row order
//! - Helpers shared by the tests under `tests/` and the benchmarks

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Reference model of table ordering
pub mod model;

/// Test utilities and helpers
pub mod utils;

/// Workload generators
pub mod workload;
