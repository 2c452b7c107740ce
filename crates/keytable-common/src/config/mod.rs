//! Configuration for the KeyTable engine.

mod table;

pub use table::KeyTableConfig;
