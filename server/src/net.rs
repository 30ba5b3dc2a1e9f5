//! Non-blocking socket helpers over mio streams.

use std::io::{self, Read, Write};

use chain::{NodeIndex, SegmentPool};
use mio::net::TcpStream;

/// Outcome of one bounded receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// Bytes landed in the segment.
    Count(usize),
    /// The socket had nothing ready; spurious wakeups reach here.
    WouldBlock,
    /// Orderly shutdown from the peer.
    Closed,
}

/// Reads once into `buf`, never more than its length.
pub fn receive(stream: &mut TcpStream, buf: &mut [u8]) -> io::Result<Received> {
    loop {
        match stream.read(buf) {
            Ok(0) => return Ok(Received::Closed),
            Ok(count) => return Ok(Received::Count(count)),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Ok(Received::WouldBlock);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
}

/// Writes every used byte of the chain to the socket, in chain order.
///
/// Outbound packets are small relative to kernel buffers, so a transient
/// `WouldBlock` mid-chain is retried rather than queued. The chain is not
/// released here; callers decide whether it is being reused for a broadcast.
pub fn send_chain(stream: &mut TcpStream, pool: &SegmentPool, head: NodeIndex) -> io::Result<()> {
    let mut current = Some(head);
    while let Some(node) = current {
        let mut segment = pool.segment(node);
        while !segment.is_empty() {
            match stream.write(segment) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "socket accepted no bytes",
                    ));
                }
                Ok(written) => segment = &segment[written..],
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        current = pool.next(node);
    }
    Ok(())
}
