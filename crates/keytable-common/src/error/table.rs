//! Table error types.

use std::fmt;
use thiserror::Error;

use crate::types::{BookmarkId, RowKey};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling by the protocol
/// layer and are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Invalid argument provided.
    InvalidParameter = 0x0001,
    /// Invalid configuration.
    InvalidConfig = 0x0002,

    // Lookup errors (0x0100 - 0x01FF)
    /// Row not found.
    NotFound = 0x0100,
    /// Bookmark id unknown or invalidated.
    InvalidBookmark = 0x0101,

    // Resource errors (0x0200 - 0x02FF)
    /// A fixed-size resource is exhausted.
    ResourceExhausted = 0x0200,
    /// Memory allocation failed.
    OutOfMemory = 0x0201,

    // Integrity errors (0x0300 - 0x03FF)
    /// Structural invariant violated.
    Corrupted = 0x0300,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Lookup",
            0x02 => "Resource",
            0x03 => "Integrity",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The error type for table operations.
///
/// A failed mutation leaves the table exactly as it was before the call.
///
/// # Example
///
/// ```rust
/// use keytable_common::error::{ErrorCode, KeyTableError, KeyTableResult};
/// use keytable_common::types::RowKey;
///
/// fn lookup(key: RowKey) -> KeyTableResult<()> {
///     Err(KeyTableError::NotFound { key })
/// }
///
/// let err = lookup(RowKey::new(4, 0)).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyTableError {
    /// No live row has the given key.
    #[error("row {key} not found")]
    NotFound {
        /// The missing row.
        key: RowKey,
    },

    /// An argument was malformed.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Error message.
        message: String,
    },

    /// The bookmark is unknown or its row was deleted.
    #[error("invalid bookmark {id}")]
    InvalidBookmark {
        /// The bookmark id.
        id: BookmarkId,
    },

    /// The bookmark cap was reached.
    #[error("resource exhausted: limit of {limit} reached")]
    ResourceExhausted {
        /// The configured limit.
        limit: usize,
    },

    /// Allocation failed while creating a row.
    #[error("out of memory")]
    OutOfMemory,

    /// The integrity checker found a broken invariant.
    #[error("table corrupted: {reason}")]
    Corrupted {
        /// Description of the violation.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl KeyTableError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Self::InvalidBookmark { .. } => ErrorCode::InvalidBookmark,
            Self::ResourceExhausted { .. } => ErrorCode::ResourceExhausted,
            Self::OutOfMemory => ErrorCode::OutOfMemory,
            Self::Corrupted { .. } => ErrorCode::Corrupted,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
        }
    }

    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    #[must_use]
    pub fn corrupted(reason: impl Into<String>) -> Self {
        Self::Corrupted {
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// A non-fatal condition reported next to a successful result.
///
/// Callers must not treat a warning as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    /// The row a bookmark refers to has moved since the bookmark was created.
    PositionChanged,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionChanged => write!(f, "position changed"),
        }
    }
}
