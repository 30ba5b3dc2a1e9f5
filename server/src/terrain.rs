//! Flat demo terrain: palette building, section bit-packing, and the
//! heightmap NBT blob.

use rand::Rng;

/// Global block-state palette for the single generated section.
pub const PALETTE: [i32; 5] = [0, 33, 132, 126, 141];

/// Bits per block for a palette this small. The client rejects anything
/// under four.
pub const BITS_PER_BLOCK: u8 = 4;

const SECTION_VOLUME: usize = 16 * 16 * 16;

/// Block palette indices for one 16x16x16 section, `[y][z][x]`.
#[derive(Debug, Clone)]
pub struct Terrain {
    blocks: Box<[[[u8; 16]; 16]; 16]>,
}

impl Terrain {
    /// Generates the demo island: a solid floor layer under a randomized
    /// surface layer with a rim of the last palette entry.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut blocks = Box::new([[[0u8; 16]; 16]; 16]);

        #[allow(clippy::cast_possible_truncation)]
        let palette_len = PALETTE.len() as u8;

        for z in 0..16 {
            for x in 0..16 {
                blocks[0][z][x] = 1;
                blocks[1][z][x] = rng.gen_range(2..palette_len);
            }
        }
        for i in 0..16 {
            blocks[1][0][i] = palette_len - 1;
            blocks[1][i][0] = palette_len - 1;
            blocks[1][i][15] = palette_len - 1;
            blocks[1][15][i] = palette_len - 1;
        }

        Self { blocks }
    }

    /// Encodes the section payload: block count, bits per block, palette,
    /// and the packed block data as big-endian longs.
    pub fn section_payload(&self) -> Vec<u8> {
        let longs = self.pack_blocks();

        let mut out = Vec::with_capacity(3 + PALETTE.len() + 2 + longs.len() * 8);
        out.extend_from_slice(&256u16.to_be_bytes());
        out.push(BITS_PER_BLOCK);
        push_varint(&mut out, PALETTE.len() as i32);
        for entry in PALETTE {
            push_varint(&mut out, entry);
        }
        push_varint(&mut out, longs.len() as i32);
        for long in longs {
            out.extend_from_slice(&long.to_be_bytes());
        }
        out
    }

    /// Packs the 4096 palette indices at [`BITS_PER_BLOCK`] bits each,
    /// least-significant bit first, straddling long boundaries.
    fn pack_blocks(&self) -> Vec<u64> {
        let mut longs = vec![0u64; SECTION_VOLUME * BITS_PER_BLOCK as usize / 64];
        let mut bit_index = 0usize;

        for y in 0..16 {
            for z in 0..16 {
                for x in 0..16 {
                    let value = u64::from(self.blocks[y][z][x]);
                    let long_index = bit_index / 64;
                    let offset = (bit_index % 64) as u32;

                    longs[long_index] |= value << offset;
                    let spill = offset as usize + BITS_PER_BLOCK as usize;
                    if spill > 64 {
                        longs[long_index + 1] |= value >> (64 - offset);
                    }

                    bit_index += BITS_PER_BLOCK as usize;
                }
            }
        }
        longs
    }
}

/// The MOTION_BLOCKING heightmap compound the chunk packet embeds, as raw
/// NBT: an unnamed root holding one 36-entry long array.
pub fn heightmap_nbt() -> Vec<u8> {
    const MOTION_BLOCKING: &[u8] = b"MOTION_BLOCKING";

    let mut out = Vec::with_capacity(1 + 2 + 1 + 2 + MOTION_BLOCKING.len() + 4 + 36 * 8 + 1);
    // Root compound, empty name.
    out.push(0x0A);
    out.extend_from_slice(&0u16.to_be_bytes());
    // Long array tag.
    out.push(0x0C);
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(MOTION_BLOCKING.len() as u16).to_be_bytes());
    out.extend_from_slice(MOTION_BLOCKING);
    out.extend_from_slice(&36u32.to_be_bytes());
    out.extend_from_slice(&[0u8; 36 * 8]);
    // End of root.
    out.push(0x00);
    out
}

#[allow(clippy::cast_sign_loss)]
fn push_varint(out: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            return;
        }
    }
}
