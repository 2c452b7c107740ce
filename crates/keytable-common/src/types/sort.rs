//! Sortable column encoding.
//!
//! A row carries an ordered sequence of [`SortColumn`]s, most significant
//! first. Each column holds comparison-ready bytes produced by an external
//! sort-key encoder, tagged with how those bytes are compared:
//!
//! - [`SortKind::Binary`]: bytes are compared lexicographically; a shorter
//!   column that is a prefix of a longer one sorts first.
//! - [`SortKind::AsciiString`]: bytes are a collation key, compared through
//!   the collator injected into the table.
//! - [`SortKind::Float64`]: bytes are a native-endian IEEE-754 double.
//!
//! The `descending` flag inverts the result of the column that decides a
//! comparison.

use bytes::Bytes;
use std::fmt;

use crate::constants::{
    FLOAT_SORT_KEY_SIZE, SORT_FLAG_DESCENDING, SORT_FLAG_FLOAT, SORT_FLAG_STRING,
};

/// How the bytes of a sort column are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKind {
    /// Raw byte-wise comparison.
    #[default]
    Binary,
    /// Collation key comparison through the table's collator.
    AsciiString,
    /// IEEE-754 double comparison.
    Float64,
}

/// One comparison unit of a row's sort key.
///
/// The bytes are reference counted, so cloning a column (or a whole column
/// vector) does not copy the encoded data.
///
/// # Example
///
/// ```rust
/// use keytable_common::types::{SortColumn, SortKind};
///
/// let subject = SortColumn::string("re: lunch");
/// let received = SortColumn::unsigned(1_700_000_000).descending();
///
/// assert_eq!(subject.kind(), SortKind::AsciiString);
/// assert!(received.is_descending());
/// assert_eq!(received.len(), 8);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SortColumn {
    kind: SortKind,
    descending: bool,
    bytes: Bytes,
}

impl SortColumn {
    /// Creates a column from already encoded bytes.
    #[inline]
    #[must_use]
    pub fn new(kind: SortKind, descending: bool, bytes: impl Into<Bytes>) -> Self {
        Self {
            kind,
            descending,
            bytes: bytes.into(),
        }
    }

    /// Creates an ascending binary column.
    #[inline]
    #[must_use]
    pub fn binary(bytes: &[u8]) -> Self {
        Self::new(SortKind::Binary, false, Bytes::copy_from_slice(bytes))
    }

    /// Creates an ascending string column using the UTF-8 bytes as the
    /// collation key.
    #[inline]
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::new(SortKind::AsciiString, false, Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Creates an ascending string column from a pre-computed collation key.
    #[inline]
    #[must_use]
    pub fn collation_key(key: impl Into<Bytes>) -> Self {
        Self::new(SortKind::AsciiString, false, key)
    }

    /// Creates an ascending floating point column.
    #[inline]
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::new(
            SortKind::Float64,
            false,
            Bytes::copy_from_slice(&value.to_ne_bytes()),
        )
    }

    /// Creates an ascending binary column that orders unsigned integers
    /// numerically (big-endian encoding).
    #[inline]
    #[must_use]
    pub fn unsigned(value: u64) -> Self {
        Self::new(
            SortKind::Binary,
            false,
            Bytes::copy_from_slice(&value.to_be_bytes()),
        )
    }

    /// Creates an ascending binary column that orders signed integers
    /// numerically (big-endian with the sign bit flipped).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn signed(value: i64) -> Self {
        let biased = (value as u64) ^ (1 << 63);
        Self::new(
            SortKind::Binary,
            false,
            Bytes::copy_from_slice(&biased.to_be_bytes()),
        )
    }

    /// Creates a column from a flag byte as used on the wire.
    ///
    /// `SORT_FLAG_FLOAT` takes precedence over `SORT_FLAG_STRING`.
    #[must_use]
    pub fn from_flags(flags: u8, bytes: impl Into<Bytes>) -> Self {
        let kind = if flags & SORT_FLAG_FLOAT != 0 {
            SortKind::Float64
        } else if flags & SORT_FLAG_STRING != 0 {
            SortKind::AsciiString
        } else {
            SortKind::Binary
        };
        Self::new(kind, flags & SORT_FLAG_DESCENDING != 0, bytes)
    }

    /// Returns this column with the descending flag set.
    #[inline]
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Returns the flag byte describing this column.
    #[must_use]
    pub fn flags(&self) -> u8 {
        let kind = match self.kind {
            SortKind::Binary => 0,
            SortKind::AsciiString => SORT_FLAG_STRING,
            SortKind::Float64 => SORT_FLAG_FLOAT,
        };
        if self.descending {
            kind | SORT_FLAG_DESCENDING
        } else {
            kind
        }
    }

    /// Returns the comparison kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> SortKind {
        self.kind
    }

    /// Returns true if the column sorts in descending order.
    #[inline]
    #[must_use]
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Returns the encoded bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the underlying `Bytes`.
    #[inline]
    #[must_use]
    pub fn as_raw(&self) -> &Bytes {
        &self.bytes
    }

    /// Returns the encoded length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the encoded value is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes a `Float64` column. Returns `None` for other kinds or when the
    /// encoded length is not 8 bytes.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        if self.kind != SortKind::Float64 {
            return None;
        }
        let raw: [u8; FLOAT_SORT_KEY_SIZE] = self.bytes.as_ref().try_into().ok()?;
        Some(f64::from_ne_bytes(raw))
    }
}

impl fmt::Debug for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.descending { "desc" } else { "asc" };
        match self.kind {
            SortKind::Float64 => match self.as_f64() {
                Some(v) => write!(f, "Float64({v}, {dir})"),
                None => write!(f, "Float64(<{} bytes>, {dir})", self.len()),
            },
            SortKind::AsciiString => match std::str::from_utf8(&self.bytes) {
                Ok(s) => write!(f, "AsciiString({s:?}, {dir})"),
                Err(_) => write!(f, "AsciiString({:02x?}, {dir})", self.bytes.as_ref()),
            },
            SortKind::Binary => write!(f, "Binary({:02x?}, {dir})", self.bytes.as_ref()),
        }
    }
}
