//! Cursor-based decoding across a buffer chain.

use crate::error::{ChainError, ChainResult};
use crate::pool::{NodeIndex, SegmentPool};

/// Maximum encoded width of a 32-bit varint.
pub const VARINT_MAX_BYTES: usize = 5;
/// Maximum encoded width of a 64-bit varint.
pub const VARLONG_MAX_BYTES: usize = 10;

/// A decoding cursor over a buffer chain.
///
/// The reader is transient: it is re-derived from a chain head and an
/// absolute offset for every decode attempt and never outlives its chain.
/// Every failed read leaves the position unchanged, so a caller can retry
/// the same decode once more bytes have been appended to the chain.
#[derive(Debug)]
pub struct ChainReader<'a> {
    pool: &'a SegmentPool,
    head: Option<NodeIndex>,
    pos: usize,
}

impl<'a> ChainReader<'a> {
    /// Creates a reader at `pos` bytes into the chain starting at `head`.
    #[must_use]
    pub fn new(pool: &'a SegmentPool, head: Option<NodeIndex>, pos: usize) -> Self {
        Self { pool, head, pos }
    }

    /// Absolute read offset from the chain start.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Restores a previously snapshotted position.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Bytes buffered past the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total_len().saturating_sub(self.pos)
    }

    /// Total used bytes in the chain.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.head.map_or(0, |head| self.pool.chain_len(head))
    }

    /// Advances past `count` bytes without decoding them.
    pub fn skip(&mut self, count: usize) -> ChainResult<()> {
        let available = self.remaining();
        if count > available {
            return Err(ChainError::Incomplete {
                requested: count,
                available,
            });
        }
        self.pos += count;
        Ok(())
    }

    /// Fills `out` from the chain, following node links as needed.
    pub fn read_raw(&mut self, out: &mut [u8]) -> ChainResult<()> {
        let available = self.remaining();
        if out.len() > available {
            return Err(ChainError::Incomplete {
                requested: out.len(),
                available,
            });
        }

        let (mut node, mut index) = self
            .locate(self.pos)
            .expect("remaining() guaranteed the bytes exist");
        let mut filled = 0;
        while filled < out.len() {
            let segment = self.pool.segment(node);
            let take = (out.len() - filled).min(segment.len() - index);
            out[filled..filled + take].copy_from_slice(&segment[index..index + take]);
            filled += take;
            index += take;
            if index == segment.len() && filled < out.len() {
                node = self
                    .pool
                    .next(node)
                    .expect("remaining() guaranteed the bytes exist");
                index = 0;
            }
        }

        self.pos += out.len();
        Ok(())
    }

    pub fn read_u8(&mut self) -> ChainResult<u8> {
        let mut scratch = [0u8; 1];
        self.read_raw(&mut scratch)?;
        Ok(scratch[0])
    }

    pub fn read_u16(&mut self) -> ChainResult<u16> {
        let mut scratch = [0u8; 2];
        self.read_raw(&mut scratch)?;
        Ok(u16::from_be_bytes(scratch))
    }

    pub fn read_u32(&mut self) -> ChainResult<u32> {
        let mut scratch = [0u8; 4];
        self.read_raw(&mut scratch)?;
        Ok(u32::from_be_bytes(scratch))
    }

    pub fn read_u64(&mut self) -> ChainResult<u64> {
        let mut scratch = [0u8; 8];
        self.read_raw(&mut scratch)?;
        Ok(u64::from_be_bytes(scratch))
    }

    pub fn read_f32(&mut self) -> ChainResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> ChainResult<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Decodes a 32-bit varint: 7 payload bits per byte, least-significant
    /// group first, high bit set while more bytes follow.
    pub fn read_varint(&mut self) -> ChainResult<i32> {
        let (value, count) = self.decode_var(VARINT_MAX_BYTES)?;
        self.pos += count;
        #[allow(clippy::cast_possible_truncation)]
        Ok(value as u32 as i32)
    }

    /// Decodes a 64-bit varint.
    pub fn read_varlong(&mut self) -> ChainResult<i64> {
        let (value, count) = self.decode_var(VARLONG_MAX_BYTES)?;
        self.pos += count;
        #[allow(clippy::cast_possible_wrap)]
        Ok(value as i64)
    }

    /// Decodes only the length prefix of a string and rewinds, letting the
    /// caller size its own buffer before committing with
    /// [`read_string`](Self::read_string).
    pub fn string_len(&mut self) -> ChainResult<usize> {
        let snapshot = self.pos;
        let result = self.read_varint();
        self.pos = snapshot;
        let len = result?;
        usize::try_from(len).map_err(|_| ChainError::MalformedVarint {
            max_bytes: VARINT_MAX_BYTES,
        })
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> ChainResult<String> {
        let snapshot = self.pos;
        let len = self.string_len()?;
        // Consume the length prefix we just peeked.
        self.read_varint()?;

        let mut bytes = vec![0u8; len];
        if let Err(err) = self.read_raw(&mut bytes) {
            self.pos = snapshot;
            return Err(err);
        }
        match String::from_utf8(bytes) {
            Ok(value) => Ok(value),
            Err(_) => {
                self.pos = snapshot;
                Err(ChainError::InvalidUtf8 { len })
            }
        }
    }

    /// Reads exactly `len` raw bytes into a new buffer.
    pub fn read_exact_vec(&mut self, len: usize) -> ChainResult<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        self.read_raw(&mut bytes)?;
        Ok(bytes)
    }

    /// Walks from the chain start to the node containing `offset`,
    /// returning the node and a node-relative index.
    fn locate(&self, offset: usize) -> Option<(NodeIndex, usize)> {
        let mut current = self.head;
        let mut base = 0;
        while let Some(node) = current {
            let len = self.pool.len(node);
            if offset < base + len {
                return Some((node, offset - base));
            }
            base += len;
            current = self.pool.next(node);
        }
        None
    }

    /// Shared varint loop. Returns the raw accumulated value and the number
    /// of bytes it spanned without advancing the position.
    fn decode_var(&self, max_bytes: usize) -> ChainResult<(u64, usize)> {
        let mut value = 0u64;
        let mut count = 0;
        loop {
            let Some((node, index)) = self.locate(self.pos + count) else {
                // Continuation bit still set when the chain ran out.
                return Err(ChainError::Incomplete {
                    requested: count + 1,
                    available: count,
                });
            };
            let byte = self.pool.segment(node)[index];
            value |= u64::from(byte & 0x7F) << (7 * count as u32);
            count += 1;
            if byte & 0x80 == 0 {
                return Ok((value, count));
            }
            if count == max_bytes {
                return Err(ChainError::MalformedVarint { max_bytes });
            }
        }
    }
}
