//! Error types for protocol decoding.

use std::fmt;

use chain::ChainError;
use wire::WireError;

use crate::state::ProtocolState;

/// Result type for protocol operations.
pub type ProtoResult<T> = Result<T, ProtoError>;

/// Errors produced while decoding or serializing packets.
///
/// Only the incomplete-data case is recoverable; every other variant is a
/// protocol violation that terminates the connection it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtoError {
    /// An underlying chain read failed.
    Chain(ChainError),

    /// Frame-layer failure.
    Frame(WireError),

    /// Handshake requested a next state other than status or login.
    IllegalNextState { requested: i32 },

    /// A packet id outside the catalogue for a pre-play state.
    IllegalPacket { state: ProtocolState, id: i32 },

    /// Login username longer than the protocol's 16-byte maximum.
    UsernameTooLong { len: usize },

    /// A fully buffered packet body decoded to a different size than its
    /// frame declared.
    BodyLengthMismatch {
        id: i32,
        declared: usize,
        consumed: usize,
    },
}

impl ProtoError {
    /// True when the failure only means more bytes are needed.
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        match self {
            Self::Chain(err) => err.is_incomplete(),
            Self::Frame(err) => err.is_incomplete(),
            _ => false,
        }
    }
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chain(err) => write!(f, "chain error: {err}"),
            Self::Frame(err) => write!(f, "frame error: {err}"),
            Self::IllegalNextState { requested } => {
                write!(f, "illegal handshake next state: {requested}")
            }
            Self::IllegalPacket { state, id } => {
                write!(f, "illegal packet 0x{id:02X} in {state} state")
            }
            Self::UsernameTooLong { len } => {
                write!(f, "username too long: {len} bytes, limit 16")
            }
            Self::BodyLengthMismatch {
                id,
                declared,
                consumed,
            } => {
                write!(
                    f,
                    "packet 0x{id:02X} consumed {consumed} bytes of a {declared}-byte body"
                )
            }
        }
    }
}

impl std::error::Error for ProtoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Chain(err) => Some(err),
            Self::Frame(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChainError> for ProtoError {
    fn from(err: ChainError) -> Self {
        Self::Chain(err)
    }
}

impl From<WireError> for ProtoError {
    fn from(err: WireError) -> Self {
        Self::Frame(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_passes_through_both_layers() {
        let chain_err = ChainError::Incomplete {
            requested: 8,
            available: 3,
        };
        assert!(ProtoError::from(chain_err.clone()).is_incomplete());
        assert!(ProtoError::from(WireError::from(chain_err)).is_incomplete());
    }

    #[test]
    fn violations_are_not_incomplete() {
        assert!(!ProtoError::IllegalNextState { requested: 7 }.is_incomplete());
        assert!(!ProtoError::UsernameTooLong { len: 17 }.is_incomplete());
    }

    #[test]
    fn display_illegal_packet() {
        let err = ProtoError::IllegalPacket {
            state: ProtocolState::Status,
            id: 0x7F,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x7F"));
        assert!(msg.contains("status"));
    }
}
