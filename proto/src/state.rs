//! Connection protocol states.

use std::fmt;

use crate::error::{ProtoError, ProtoResult};

/// The four states a connection moves through.
///
/// Every connection starts in handshaking. The handshake packet selects
/// status or login; login success moves the connection to play. There are no
/// other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolState {
    Handshaking,
    Status,
    Login,
    Play,
}

impl ProtocolState {
    /// Maps a handshake `next_state` field to a state.
    ///
    /// Only status (1) and login (2) are legal requests.
    pub fn from_next_state(requested: i32) -> ProtoResult<Self> {
        match requested {
            1 => Ok(Self::Status),
            2 => Ok(Self::Login),
            _ => Err(ProtoError::IllegalNextState { requested }),
        }
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handshaking => "handshaking",
            Self::Status => "status",
            Self::Login => "login",
            Self::Play => "play",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_state_mapping() {
        assert_eq!(
            ProtocolState::from_next_state(1).unwrap(),
            ProtocolState::Status
        );
        assert_eq!(
            ProtocolState::from_next_state(2).unwrap(),
            ProtocolState::Login
        );
    }

    #[test]
    fn next_state_rejects_everything_else() {
        for requested in [-1, 0, 3, 4, 498] {
            assert_eq!(
                ProtocolState::from_next_state(requested).unwrap_err(),
                ProtoError::IllegalNextState { requested }
            );
        }
    }
}
