//! Packet framing over buffer chains for the lodestone server.
//!
//! This crate handles the frame layer of the wire format: the varint length
//! prefix, the packet id, and the limits enforced on both. It does not know
//! about protocol states or packet bodies.
//!
//! # Design Principles
//!
//! - **Retryable deframing** - A frame that is not fully buffered yet fails
//!   without consuming anything, so the caller can retry after the next read.
//! - **Bounded decoding** - The declared length is validated against
//!   [`Limits`] before it influences any buffering decision.
//! - **No domain knowledge** - Packet ids are opaque integers here; meaning
//!   is assigned per protocol state by the layer above.

mod error;
mod frame;
mod limits;

pub use error::{WireError, WireResult};
pub use frame::{encode_packet, read_frame, varint_len, varlong_len, Frame};
pub use limits::Limits;
