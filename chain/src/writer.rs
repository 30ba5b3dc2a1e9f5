//! Typed appends onto the end of a buffer chain.

use crate::error::ChainResult;
use crate::pool::{NodeIndex, SegmentPool};
use crate::reader::{VARINT_MAX_BYTES, VARLONG_MAX_BYTES};

/// An encoding cursor appending to a buffer chain.
///
/// The writer exists only while a message is being built; acquiring segments
/// from the pool as values spill over segment boundaries, it never fails for
/// capacity short of arena exhaustion. [`finish`](Self::finish) hands the
/// chain head to the caller, typically for a socket send followed by a
/// whole-chain release.
#[derive(Debug)]
pub struct ChainWriter<'a> {
    pool: &'a mut SegmentPool,
    head: NodeIndex,
    tail: NodeIndex,
}

impl<'a> ChainWriter<'a> {
    /// Starts a new chain with one empty segment.
    pub fn new(pool: &'a mut SegmentPool) -> ChainResult<Self> {
        let head = pool.acquire()?;
        Ok(Self {
            pool,
            head,
            tail: head,
        })
    }

    /// Appends raw bytes, splitting across segments as needed.
    pub fn write_raw(&mut self, mut src: &[u8]) -> ChainResult<()> {
        loop {
            let written = self.pool.append(self.tail, src);
            src = &src[written..];
            if src.is_empty() {
                return Ok(());
            }
            let next = self.pool.acquire()?;
            self.pool.link(self.tail, Some(next));
            self.tail = next;
        }
    }

    pub fn write_u8(&mut self, value: u8) -> ChainResult<()> {
        self.write_raw(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> ChainResult<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> ChainResult<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> ChainResult<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> ChainResult<()> {
        self.write_u32(value.to_bits())
    }

    pub fn write_f64(&mut self, value: f64) -> ChainResult<()> {
        self.write_u64(value.to_bits())
    }

    /// Encodes a 32-bit varint, reinterpreting the signed input as unsigned.
    pub fn write_varint(&mut self, value: i32) -> ChainResult<()> {
        let mut scratch = [0u8; VARINT_MAX_BYTES];
        let len = encode_var(u64::from(value as u32), &mut scratch);
        self.write_raw(&scratch[..len])
    }

    /// Encodes a 64-bit varint.
    pub fn write_varlong(&mut self, value: i64) -> ChainResult<()> {
        let mut scratch = [0u8; VARLONG_MAX_BYTES];
        #[allow(clippy::cast_sign_loss)]
        let len = encode_var(value as u64, &mut scratch);
        self.write_raw(&scratch[..len])
    }

    /// Appends a length-prefixed string: varint byte length, then the raw
    /// bytes with no terminator.
    pub fn write_str(&mut self, value: &str) -> ChainResult<()> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        self.write_varint(value.len() as i32)?;
        self.write_raw(value.as_bytes())
    }

    /// Completes the chain and returns its head.
    #[must_use]
    pub fn finish(self) -> NodeIndex {
        self.head
    }

    /// Links an already-built chain after the current tail and continues
    /// writing at its end.
    pub fn append_chain(&mut self, head: NodeIndex) {
        self.pool.link(self.tail, Some(head));
        self.tail = self.pool.chain_tail(head);
    }
}

fn encode_var(mut value: u64, out: &mut [u8]) -> usize {
    let mut len = 0;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out[len] = byte;
        len += 1;
        if value == 0 {
            return len;
        }
    }
}
