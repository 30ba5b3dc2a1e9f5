//! Error types for frame operations.

use std::fmt;

use chain::ChainError;

/// Result type for frame operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors produced while framing or deframing packets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireError {
    /// An underlying chain read failed. Carries the incomplete-data case,
    /// which callers must treat as "wait for more bytes", not a violation.
    Chain(ChainError),

    /// Declared frame length is negative.
    NegativeLength { declared: i32 },

    /// Declared frame length exceeds the configured limit.
    FrameTooLarge { declared: usize, max: usize },

    /// The packet id varint ran past the declared frame length.
    IdOverrunsFrame { declared: usize, id_len: usize },
}

impl WireError {
    /// True when the failure only means more bytes are needed.
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        matches!(self, Self::Chain(err) if err.is_incomplete())
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chain(err) => write!(f, "chain error: {err}"),
            Self::NegativeLength { declared } => {
                write!(f, "negative frame length: {declared}")
            }
            Self::FrameTooLarge { declared, max } => {
                write!(f, "frame too large: {declared} bytes, limit {max}")
            }
            Self::IdOverrunsFrame { declared, id_len } => {
                write!(
                    f,
                    "packet id spans {id_len} bytes but the frame declares only {declared}"
                )
            }
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Chain(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChainError> for WireError {
    fn from(err: ChainError) -> Self {
        Self::Chain(err)
    }
}
