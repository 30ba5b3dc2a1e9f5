//! Error types for chain operations.

use std::fmt;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur while encoding/decoding through a buffer chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The chain does not yet hold enough bytes for the requested value.
    ///
    /// Always recoverable: the reader position is left unchanged and the
    /// caller may retry once more bytes have been appended.
    Incomplete {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes available past the reader position.
        available: usize,
    },

    /// The backing arena cannot satisfy another segment.
    ///
    /// This indicates an undersized fixed budget, not a runtime condition;
    /// callers are expected to treat it as fatal.
    ArenaExhausted {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes already carved from the arena.
        used: usize,
        /// Total arena capacity in bytes.
        capacity: usize,
    },

    /// A variable-length integer ran past its maximum encoded width.
    MalformedVarint {
        /// Maximum number of encoded bytes for this width.
        max_bytes: usize,
    },

    /// A length-prefixed string held bytes that are not valid UTF-8.
    InvalidUtf8 {
        /// Declared byte length of the string.
        len: usize,
    },
}

impl ChainError {
    /// Returns `true` for the recoverable not-enough-bytes case.
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete {
                requested,
                available,
            } => {
                write!(
                    f,
                    "chain incomplete: requested {requested} bytes but only {available} buffered"
                )
            }
            Self::ArenaExhausted {
                requested,
                used,
                capacity,
            } => {
                write!(
                    f,
                    "arena exhausted: requested {requested} bytes with {used}/{capacity} used"
                )
            }
            Self::MalformedVarint { max_bytes } => {
                write!(f, "varint exceeded its maximum width of {max_bytes} bytes")
            }
            Self::InvalidUtf8 { len } => {
                write!(f, "length-prefixed string of {len} bytes is not valid UTF-8")
            }
        }
    }
}

impl std::error::Error for ChainError {}
