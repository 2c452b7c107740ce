//! Error handling for the KeyTable engine.
//!
//! This module provides the error type, its stable codes, the non-fatal
//! warning signal, and the result alias used across the engine.

mod table;

pub use table::{ErrorCode, KeyTableError, Warning};

/// Result type alias for table operations.
pub type KeyTableResult<T> = std::result::Result<T, KeyTableError>;
