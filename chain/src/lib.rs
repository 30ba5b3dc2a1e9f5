//! Arena-backed segment pool and buffer chain primitives.
//!
//! This crate provides the byte plumbing under the lodestone protocol
//! stack: a bump [`Arena`], a [`SegmentPool`] of fixed-capacity segments
//! with LIFO reuse, and the [`ChainReader`]/[`ChainWriter`] pair that
//! decodes and encodes wire primitives across segment boundaries.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Segments are addressed by index, not pointer.
//! - **Bounded operations** - Reads are checked; a failed read never moves
//!   the cursor, so incremental decoding can always retry.
//! - **No domain knowledge** - This crate knows nothing about packets,
//!   sessions, or protocol states.
//! - **Bulk reclamation** - Chains release back to the pool as a unit or as
//!   a fully-consumed prefix; the arena only resets wholesale.
//!
//! # Example
//!
//! ```
//! use chain::{ChainReader, ChainWriter, SegmentPool};
//!
//! let mut pool = SegmentPool::new(4096, 8);
//! let mut writer = ChainWriter::new(&mut pool).unwrap();
//! writer.write_varint(498).unwrap();
//! writer.write_str("bob").unwrap();
//! let head = writer.finish();
//!
//! let mut reader = ChainReader::new(&pool, Some(head), 0);
//! assert_eq!(reader.read_varint().unwrap(), 498);
//! assert_eq!(reader.read_string().unwrap(), "bob");
//! ```

mod arena;
mod error;
mod pool;
mod reader;
mod writer;

pub use arena::Arena;
pub use error::{ChainError, ChainResult};
pub use pool::{NodeIndex, SegmentPool};
pub use reader::{ChainReader, VARINT_MAX_BYTES, VARLONG_MAX_BYTES};
pub use writer::ChainWriter;
