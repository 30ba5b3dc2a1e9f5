//! Length-prefixed packet frames.
//!
//! Every packet travels as `varint length`, then `varint id`, then the body,
//! where `length` counts the id and body together.

use chain::{ChainReader, ChainResult, ChainWriter, NodeIndex, SegmentPool};

use crate::error::{WireError, WireResult};
use crate::limits::Limits;

/// Encoded width of a 32-bit varint.
#[must_use]
pub const fn varint_len(value: i32) -> usize {
    var_width(value as u32 as u64)
}

/// Encoded width of a 64-bit varint.
#[must_use]
pub const fn varlong_len(value: i64) -> usize {
    var_width(value as u64)
}

const fn var_width(mut value: u64) -> usize {
    let mut len = 1;
    value >>= 7;
    while value != 0 {
        len += 1;
        value >>= 7;
    }
    len
}

/// A decoded frame header: the packet id and the body size that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Packet id, interpreted per protocol state by the layer above.
    pub id: i32,
    /// Bytes of body remaining after the id.
    pub body_len: usize,
}

/// Reads one frame header from the chain.
///
/// On any failure the reader position is restored to where it started, so an
/// incomplete frame can be retried verbatim once more bytes arrive. A
/// negative or over-limit declared length is a protocol violation, not a
/// retryable condition.
pub fn read_frame(reader: &mut ChainReader<'_>, limits: &Limits) -> WireResult<Frame> {
    let snapshot = reader.position();
    match read_frame_inner(reader, limits) {
        Ok(frame) => Ok(frame),
        Err(err) => {
            reader.set_position(snapshot);
            Err(err)
        }
    }
}

fn read_frame_inner(reader: &mut ChainReader<'_>, limits: &Limits) -> WireResult<Frame> {
    let declared = reader.read_varint()?;
    let Ok(length) = usize::try_from(declared) else {
        return Err(WireError::NegativeLength { declared });
    };
    if length > limits.max_frame_bytes {
        return Err(WireError::FrameTooLarge {
            declared: length,
            max: limits.max_frame_bytes,
        });
    }

    let available = reader.remaining();
    if length > available {
        return Err(chain::ChainError::Incomplete {
            requested: length,
            available,
        }
        .into());
    }

    let id = reader.read_varint()?;
    let id_len = varint_len(id);
    let Some(body_len) = length.checked_sub(id_len) else {
        return Err(WireError::IdOverrunsFrame {
            declared: length,
            id_len,
        });
    };
    Ok(Frame { id, body_len })
}

/// Builds a complete outbound frame: the payload is written first, then the
/// `varint length` + `varint id` header chain is prepended to it. Returns the
/// head of the finished chain, ready for the socket.
pub fn encode_packet<F>(pool: &mut SegmentPool, id: i32, build_payload: F) -> WireResult<NodeIndex>
where
    F: FnOnce(&mut ChainWriter<'_>) -> ChainResult<()>,
{
    let mut writer = ChainWriter::new(pool)?;
    build_payload(&mut writer)?;
    let payload = writer.finish();

    let id_len = varint_len(id);
    let body_len = pool.chain_len(payload);
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let length = (id_len + body_len) as i32;

    let mut header = ChainWriter::new(pool)?;
    header.write_varint(length)?;
    header.write_varint(id)?;
    header.append_chain(payload);
    Ok(header.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_width_boundaries() {
        assert_eq!(varint_len(0), 1);
        assert_eq!(varint_len(127), 1);
        assert_eq!(varint_len(128), 2);
        assert_eq!(varint_len(2_097_151), 3);
        assert_eq!(varint_len(i32::MAX), 5);
        assert_eq!(varint_len(-1), 5);
        assert_eq!(varlong_len(-1), 10);
    }

    #[test]
    fn read_frame_roundtrips_encode_packet() {
        let mut pool = SegmentPool::new(4096, 8);
        let head = encode_packet(&mut pool, 0x25, |w| {
            w.write_u32(0xDEAD_BEEF)?;
            w.write_str("overworld")
        })
        .unwrap();

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let frame = read_frame(&mut reader, &Limits::for_testing()).unwrap();
        assert_eq!(frame.id, 0x25);
        assert_eq!(frame.body_len, 4 + 1 + 9);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_string().unwrap(), "overworld");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn partial_frame_restores_position() {
        let mut pool = SegmentPool::new(4096, 8);
        let head = encode_packet(&mut pool, 0x0F, |w| w.write_u64(77)).unwrap();

        // Chop the chain down to just the length prefix.
        let total = pool.chain_len(head);
        assert_eq!(total, 1 + 1 + 8);
        pool.set_len(head, 1);
        pool.link(head, None);

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let err = read_frame(&mut reader, &Limits::for_testing()).unwrap_err();
        assert!(err.is_incomplete());
        assert_eq!(reader.position(), 0, "failed deframe must not consume");
    }

    #[test]
    fn oversized_declared_length_rejected() {
        let mut pool = SegmentPool::new(4096, 8);
        let mut writer = ChainWriter::new(&mut pool).unwrap();
        writer.write_varint(5000).unwrap();
        let head = writer.finish();

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let err = read_frame(&mut reader, &Limits::for_testing()).unwrap_err();
        assert_eq!(
            err,
            WireError::FrameTooLarge {
                declared: 5000,
                max: 4096
            }
        );
        assert!(!err.is_incomplete());
    }

    #[test]
    fn negative_declared_length_rejected() {
        let mut pool = SegmentPool::new(4096, 8);
        let mut writer = ChainWriter::new(&mut pool).unwrap();
        writer.write_varint(-1).unwrap();
        let head = writer.finish();

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let err = read_frame(&mut reader, &Limits::default()).unwrap_err();
        assert_eq!(err, WireError::NegativeLength { declared: -1 });
    }

    #[test]
    fn empty_body_frame() {
        // Status Request is id-only: length 1, id 0x00.
        let mut pool = SegmentPool::new(4096, 8);
        let head = encode_packet(&mut pool, 0x00, |_| Ok(())).unwrap();
        assert_eq!(pool.chain_len(head), 2);

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let frame = read_frame(&mut reader, &Limits::for_testing()).unwrap();
        assert_eq!(frame.id, 0x00);
        assert_eq!(frame.body_len, 0);
    }
}
