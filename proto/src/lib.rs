//! Protocol states, packet catalogue, and serializers for the lodestone
//! server.
//!
//! This crate assigns meaning to the opaque frames the wire crate produces:
//! which packet ids exist in which protocol state, how their bodies decode,
//! and how every clientbound packet serializes. It holds no connection or
//! world state.
//!
//! # Design Principles
//!
//! - **Owned decode results** - [`inbound::decode`] returns owned values so
//!   callers can release their reader before acting on a packet.
//! - **Strict pre-play states** - Before play, any packet outside the
//!   catalogue is a violation. In play, unknown well-framed packets are
//!   skipped.
//! - **Violations are terminal** - Every error except incomplete data ends
//!   the connection it occurred on; nothing here resynchronizes a stream.

pub mod ids;
pub mod inbound;
pub mod outbound;

mod error;
mod state;

pub use error::{ProtoError, ProtoResult};
pub use inbound::{Inbound, UseEntityAction};
pub use outbound::{Animation, PlayerInfo, PlayerInfoEntry};
pub use state::ProtocolState;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = ProtocolState::Handshaking;
        let _ = Animation::SwingMainArm;
        let _ = ids::inbound::play::CHAT;
        let _: ProtoResult<()> = Ok(());
    }
}
