//! Segment pool with an intrusive free list over an arena.

use crate::arena::Arena;
use crate::error::ChainResult;

/// Index of a chain node inside its pool.
///
/// Nodes never move, so an index stays valid for the pool's lifetime; it is
/// the caller's job not to use a node after releasing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeIndex(u32);

#[derive(Debug)]
struct Node {
    /// Offset of this node's segment in the arena.
    offset: usize,
    /// Used bytes of the segment.
    len: usize,
    /// Next node in the chain, or next free node while on the free list.
    next: Option<NodeIndex>,
}

/// A pool of fixed-capacity byte segments carved from one arena.
///
/// Segments are owned by the pool at rest and by exactly one chain in
/// flight. Releasing pushes nodes onto a LIFO free list; the arena only
/// grows when the free list is empty, so steady-state traffic runs without
/// touching the allocator.
#[derive(Debug)]
pub struct SegmentPool {
    arena: Arena,
    segment_capacity: usize,
    nodes: Vec<Node>,
    free_head: Option<NodeIndex>,
}

impl SegmentPool {
    /// Creates a pool whose segments are `segment_capacity` bytes, backed by
    /// a fresh arena of `arena_capacity` bytes.
    #[must_use]
    pub fn new(arena_capacity: usize, segment_capacity: usize) -> Self {
        assert!(segment_capacity > 0, "segment capacity must be non-zero");
        Self {
            arena: Arena::with_capacity(arena_capacity),
            segment_capacity,
            nodes: Vec::new(),
            free_head: None,
        }
    }

    /// Acquires a node with an empty segment.
    ///
    /// Reuses the most-recently-released node when one exists, otherwise
    /// carves a new segment from the arena.
    pub fn acquire(&mut self) -> ChainResult<NodeIndex> {
        if let Some(index) = self.free_head {
            self.free_head = self.node(index).next;
            let node = self.node_mut(index);
            node.next = None;
            node.len = 0;
            return Ok(index);
        }

        let offset = self.arena.alloc(self.segment_capacity)?;
        let index = NodeIndex(
            u32::try_from(self.nodes.len()).expect("node count must stay within u32 range"),
        );
        self.nodes.push(Node {
            offset,
            len: 0,
            next: None,
        });
        Ok(index)
    }

    /// Releases `head` back to the pool.
    ///
    /// With `whole_chain` set, every node reachable from `head` is returned
    /// and the result is `None`. Otherwise only the head node is returned
    /// and the remainder of the chain is handed back — used when a leading
    /// segment has been fully decoded but later segments are still pending.
    pub fn release(&mut self, head: NodeIndex, whole_chain: bool) -> Option<NodeIndex> {
        if whole_chain {
            let mut current = Some(head);
            while let Some(index) = current {
                current = self.node(index).next;
                self.push_free(index);
            }
            None
        } else {
            let remaining = self.node(head).next;
            self.push_free(head);
            remaining
        }
    }

    /// Next node in the chain.
    #[must_use]
    pub fn next(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.node(index).next
    }

    /// Links `next` after `index`, replacing any existing link.
    pub fn link(&mut self, index: NodeIndex, next: Option<NodeIndex>) {
        self.node_mut(index).next = next;
    }

    /// Used bytes of a node's segment.
    #[must_use]
    pub fn len(&self, index: NodeIndex) -> usize {
        self.node(index).len
    }

    /// Sets the used length of a node's segment.
    pub fn set_len(&mut self, index: NodeIndex, len: usize) {
        assert!(len <= self.segment_capacity);
        self.node_mut(index).len = len;
    }

    /// The used bytes of a node's segment.
    #[must_use]
    pub fn segment(&self, index: NodeIndex) -> &[u8] {
        let node = self.node(index);
        self.arena.bytes(node.offset, node.len)
    }

    /// The full-capacity segment region, for filling before `set_len`.
    pub fn segment_mut(&mut self, index: NodeIndex) -> &mut [u8] {
        let offset = self.node(index).offset;
        self.arena.bytes_mut(offset, self.segment_capacity)
    }

    /// Copies as much of `src` as fits into the node's spare capacity,
    /// bumping the used length. Returns the number of bytes copied.
    pub fn append(&mut self, index: NodeIndex, src: &[u8]) -> usize {
        let node = self.node(index);
        let (offset, len) = (node.offset, node.len);
        let take = src.len().min(self.segment_capacity - len);
        self.arena
            .bytes_mut(offset + len, take)
            .copy_from_slice(&src[..take]);
        self.node_mut(index).len = len + take;
        take
    }

    /// Total used bytes across a chain.
    #[must_use]
    pub fn chain_len(&self, head: NodeIndex) -> usize {
        let mut total = 0;
        let mut current = Some(head);
        while let Some(index) = current {
            let node = self.node(index);
            total += node.len;
            current = node.next;
        }
        total
    }

    /// Last node reachable from `head`.
    #[must_use]
    pub fn chain_tail(&self, head: NodeIndex) -> NodeIndex {
        let mut current = head;
        while let Some(next) = self.node(current).next {
            current = next;
        }
        current
    }

    /// Fixed segment capacity in bytes.
    #[must_use]
    pub const fn segment_capacity(&self) -> usize {
        self.segment_capacity
    }

    /// Bytes carved from the backing arena so far.
    #[must_use]
    pub const fn arena_used(&self) -> usize {
        self.arena.used()
    }

    fn push_free(&mut self, index: NodeIndex) {
        let free_head = self.free_head;
        let node = self.node_mut(index);
        node.next = free_head;
        node.len = 0;
        self.free_head = Some(index);
    }

    fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0 as usize]
    }

    fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_carves_from_arena() {
        let mut pool = SegmentPool::new(1024, 64);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.arena_used(), 128);
        assert_eq!(pool.len(a), 0);
    }

    #[test]
    fn release_reuses_lifo() {
        let mut pool = SegmentPool::new(1024, 64);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.link(a, Some(b));
        pool.release(a, true);

        // LIFO: `a` was pushed last, so it comes back first.
        let c = pool.acquire().unwrap();
        assert_eq!(c, a);
        assert_eq!(pool.next(c), None, "reacquired node must be unlinked");
        assert_eq!(pool.arena_used(), 128, "no new carving");
    }

    #[test]
    fn release_head_only_returns_remainder() {
        let mut pool = SegmentPool::new(1024, 64);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.link(a, Some(b));

        let remaining = pool.release(a, false);
        assert_eq!(remaining, Some(b));
        let remaining = pool.release(b, false);
        assert_eq!(remaining, None);
    }

    #[test]
    fn append_respects_capacity() {
        let mut pool = SegmentPool::new(1024, 4);
        let node = pool.acquire().unwrap();
        let written = pool.append(node, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(written, 4);
        assert_eq!(pool.segment(node), &[1, 2, 3, 4]);
    }

    #[test]
    fn chain_len_sums_used_bytes() {
        let mut pool = SegmentPool::new(1024, 4);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.append(a, &[1, 2, 3, 4]);
        pool.append(b, &[5, 6]);
        pool.link(a, Some(b));
        assert_eq!(pool.chain_len(a), 6);
        assert_eq!(pool.chain_tail(a), b);
    }

    #[test]
    fn recycling_keeps_arena_flat() {
        let mut pool = SegmentPool::new(1024, 16);

        let mut head = pool.acquire().unwrap();
        for _ in 0..7 {
            let next = pool.acquire().unwrap();
            pool.link(next, Some(head));
            head = next;
        }
        let footprint = pool.arena_used();
        pool.release(head, true);

        let mut head = pool.acquire().unwrap();
        for _ in 0..7 {
            let next = pool.acquire().unwrap();
            pool.link(next, Some(head));
            head = next;
        }
        assert_eq!(pool.arena_used(), footprint);
    }
}
