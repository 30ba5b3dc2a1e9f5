use chain::{ChainReader, ChainWriter, SegmentPool};
use wire::{encode_packet, read_frame, Limits};

/// Flattens a chain to contiguous bytes for slicing in tests.
fn chain_bytes(pool: &SegmentPool, head: chain::NodeIndex) -> Vec<u8> {
    let mut reader = ChainReader::new(pool, Some(head), 0);
    let len = reader.remaining();
    reader.read_exact_vec(len).unwrap()
}

#[test]
fn deframe_is_idempotent_at_every_prefix() {
    let mut pool = SegmentPool::new(4096, 8);
    let head = encode_packet(&mut pool, 0x11, |w| {
        w.write_f64(12.5)?;
        w.write_f64(70.0)?;
        w.write_f64(-3.25)?;
        w.write_u8(1)
    })
    .unwrap();
    let bytes = chain_bytes(&pool, head);
    pool.release(head, true);

    // Feed every strict prefix; the deframe must fail as incomplete and leave
    // the cursor untouched each time, then succeed on the full buffer.
    for split in 0..bytes.len() {
        let mut pool = SegmentPool::new(4096, 3);
        let mut writer = ChainWriter::new(&mut pool).unwrap();
        writer.write_raw(&bytes[..split]).unwrap();
        let head = writer.finish();

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let err = read_frame(&mut reader, &Limits::default()).unwrap_err();
        assert!(err.is_incomplete(), "prefix of {split} bytes");
        assert_eq!(reader.position(), 0, "prefix of {split} bytes");
    }

    let mut pool = SegmentPool::new(4096, 3);
    let mut writer = ChainWriter::new(&mut pool).unwrap();
    writer.write_raw(&bytes).unwrap();
    let head = writer.finish();

    let mut reader = ChainReader::new(&pool, Some(head), 0);
    let frame = read_frame(&mut reader, &Limits::default()).unwrap();
    assert_eq!(frame.id, 0x11);
    assert_eq!(frame.body_len, 25);
}

#[test]
fn back_to_back_frames_deframe_in_order() {
    let mut pool = SegmentPool::new(4096, 8);

    let first = encode_packet(&mut pool, 0x0F, |w| w.write_u64(1)).unwrap();
    let second = encode_packet(&mut pool, 0x03, |w| w.write_str("hello")).unwrap();
    let tail = pool.chain_tail(first);
    pool.link(tail, Some(second));

    let limits = Limits::default();
    let mut reader = ChainReader::new(&pool, Some(first), 0);

    let frame = read_frame(&mut reader, &limits).unwrap();
    assert_eq!(frame.id, 0x0F);
    assert_eq!(reader.read_u64().unwrap(), 1);

    let frame = read_frame(&mut reader, &limits).unwrap();
    assert_eq!(frame.id, 0x03);
    assert_eq!(reader.read_string().unwrap(), "hello");
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn trailing_garbage_after_frame_is_left_unread() {
    let mut pool = SegmentPool::new(4096, 8);
    let head = encode_packet(&mut pool, 0x00, |w| w.write_varint(498)).unwrap();
    let mut writer = ChainWriter::new(&mut pool).unwrap();
    writer.write_raw(&[0xAA, 0xBB]).unwrap();
    let garbage = writer.finish();
    let tail = pool.chain_tail(head);
    pool.link(tail, Some(garbage));

    let mut reader = ChainReader::new(&pool, Some(head), 0);
    let frame = read_frame(&mut reader, &Limits::default()).unwrap();
    assert_eq!(frame.id, 0x00);
    reader.skip(frame.body_len).unwrap();
    assert_eq!(reader.remaining(), 2);
}
