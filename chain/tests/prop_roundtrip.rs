use chain::{ChainReader, ChainWriter, SegmentPool};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    VarInt(i32),
    VarLong(i64),
    Str(String),
    Raw(Vec<u8>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::U8),
        any::<u16>().prop_map(Op::U16),
        any::<u32>().prop_map(Op::U32),
        any::<u64>().prop_map(Op::U64),
        any::<f32>().prop_map(Op::F32),
        any::<f64>().prop_map(Op::F64),
        any::<i32>().prop_map(Op::VarInt),
        any::<i64>().prop_map(Op::VarLong),
        ".{0,24}".prop_map(Op::Str),
        prop::collection::vec(any::<u8>(), 0..48).prop_map(Op::Raw),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(
        ops in prop::collection::vec(op_strategy(), 1..48),
        segment_capacity in 1usize..40,
    ) {
        let mut pool = SegmentPool::new(1 << 16, segment_capacity);
        let mut writer = ChainWriter::new(&mut pool).unwrap();

        for op in &ops {
            match op {
                Op::U8(v) => writer.write_u8(*v).unwrap(),
                Op::U16(v) => writer.write_u16(*v).unwrap(),
                Op::U32(v) => writer.write_u32(*v).unwrap(),
                Op::U64(v) => writer.write_u64(*v).unwrap(),
                Op::F32(v) => writer.write_f32(*v).unwrap(),
                Op::F64(v) => writer.write_f64(*v).unwrap(),
                Op::VarInt(v) => writer.write_varint(*v).unwrap(),
                Op::VarLong(v) => writer.write_varlong(*v).unwrap(),
                Op::Str(v) => writer.write_str(v).unwrap(),
                Op::Raw(v) => writer.write_raw(v).unwrap(),
            }
        }

        let head = writer.finish();
        let mut reader = ChainReader::new(&pool, Some(head), 0);

        for op in &ops {
            match op {
                Op::U8(v) => prop_assert_eq!(reader.read_u8().unwrap(), *v),
                Op::U16(v) => prop_assert_eq!(reader.read_u16().unwrap(), *v),
                Op::U32(v) => prop_assert_eq!(reader.read_u32().unwrap(), *v),
                Op::U64(v) => prop_assert_eq!(reader.read_u64().unwrap(), *v),
                Op::F32(v) => {
                    prop_assert_eq!(reader.read_f32().unwrap().to_bits(), v.to_bits());
                }
                Op::F64(v) => {
                    prop_assert_eq!(reader.read_f64().unwrap().to_bits(), v.to_bits());
                }
                Op::VarInt(v) => prop_assert_eq!(reader.read_varint().unwrap(), *v),
                Op::VarLong(v) => prop_assert_eq!(reader.read_varlong().unwrap(), *v),
                Op::Str(v) => prop_assert_eq!(&reader.read_string().unwrap(), v),
                Op::Raw(v) => prop_assert_eq!(&reader.read_exact_vec(v.len()).unwrap(), v),
            }
        }

        prop_assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn prop_truncated_read_never_advances(
        bytes in prop::collection::vec(any::<u8>(), 0..16),
        segment_capacity in 1usize..8,
    ) {
        let mut pool = SegmentPool::new(1 << 12, segment_capacity);
        let mut writer = ChainWriter::new(&mut pool).unwrap();
        writer.write_raw(&bytes).unwrap();
        let head = writer.finish();

        // Ask for more than is buffered; the cursor must stay put so the
        // caller can retry after appending more bytes.
        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let err = reader.read_exact_vec(bytes.len() + 1).unwrap_err();
        prop_assert!(err.is_incomplete());
        prop_assert_eq!(reader.position(), 0);
        prop_assert_eq!(reader.remaining(), bytes.len());
    }
}
