//! Bump allocator over a fixed pre-allocated region.

use crate::error::{ChainError, ChainResult};

/// A bump allocator with bulk reset.
///
/// Storage is allocated once up front; `alloc` hands out offsets into it and
/// only ever moves the cursor forward. There is no per-allocation free —
/// [`reset`](Self::reset) reclaims everything at once, so nothing handed out
/// before a reset may be referenced after it.
#[derive(Debug)]
pub struct Arena {
    data: Vec<u8>,
    cursor: usize,
}

impl Arena {
    /// Creates an arena with a fixed capacity in bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            cursor: 0,
        }
    }

    /// Allocates `size` bytes, returning the offset of the region.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::ArenaExhausted`] when the region does not fit.
    /// Callers treat this as a fatal sizing defect.
    pub fn alloc(&mut self, size: usize) -> ChainResult<usize> {
        let offset = self.cursor;
        let end = offset.checked_add(size).ok_or(ChainError::ArenaExhausted {
            requested: size,
            used: self.cursor,
            capacity: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(ChainError::ArenaExhausted {
                requested: size,
                used: self.cursor,
                capacity: self.data.len(),
            });
        }
        self.cursor = end;
        Ok(offset)
    }

    /// Moves the cursor back to the base, invalidating all prior allocations.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Bytes carved so far.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Borrows an allocated region.
    #[must_use]
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// Mutably borrows an allocated region.
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.data[offset..offset + len]
    }
}
