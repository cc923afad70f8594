use once_cell::sync::OnceCell;

use crate::bitboard::occupancy_from_index;
use crate::moves::attacks::{BISHOP_DIRECTIONS, ROOK_DIRECTIONS};
use crate::square::Square;

// Magic multipliers. The widely published constant set (including the
// sub-shift fixups credited to Osborne, Annuss, Fiekas and Österlund);
// regenerating them is an offline job, the engine only consumes them.
// Rows run a8..h8 down to a1..h1 to match this engine's square order.
#[rustfmt::skip]
const ROOK_MAGICS: [u64; 64] = [
    0xEBFF_FFB9_FF9F_C526, 0x61FF_FEDD_FEED_AEAE, 0x53BF_FFED_FFDE_B1A2, 0x127F_FFB9_FFDF_B5F6, // a8..d8
    0x411F_FFDD_FFDB_F4D6, 0x0822_0024_0810_4502, 0x0003_ffef_27ee_be74, 0x7645_FFFE_CBFE_A79E, // e8..h8
    0x48FF_FE99_FECF_AA00, 0x48FF_FE99_FECF_AA00, 0x497F_FFAD_FF9C_2E00, 0x613F_FFDD_FFCE_9200, // a7..d7
    0xffff_ffe9_ffe7_ce00, 0xffff_fff5_fff3_e600, 0x0003_ff95_e5e6_a4c0, 0x510F_FFF5_F63C_96A0, // e7..h7
    0x0000_c000_228d_8000, 0x6410_0420_1440_4001, 0x1002_0040_8226_0014, 0x206a_0088_11c2_0021, // a6..d6
    0x0002_0018_1022_0024, 0x2001_0200_0400_8080, 0x1000_0801_100c_001a, 0x0048_0082_5402_0011, // e6..h6
    0x0040_8040_0280_0020, 0x0470_0020_0640_0240, 0x0001_2000_8080_1000, 0x0000_0812_0200_2040, // a5..d5
    0x00c0_8044_0080_0800, 0x9000_800a_0080_0400, 0x0001_0004_0100_0600, 0x0042_1088_ca00_2401, // e5..h5
    0x0640_0128_8008_8040, 0x8410_4000_8020_008a, 0x0400_2008_8010_0080, 0x2001_0121_0009_1004, // a4..d4
    0x1200_0d01_0008_0010, 0x6004_0004_0120_1008, 0x7500_aa04_0008_4110, 0x0100_0052_0004_0981, // e4..h4
    0x0540_0880_0080_24c1, 0x2000_8480_4002_2000, 0x0400_4100_1100_6000, 0x0040_a100_3001_0108, // a3..d3
    0x1204_8080_0800_0402, 0x0802_8080_0400_2201, 0x1002_8080_5200_0500, 0x0004_0a00_2112_4184, // e3..h3
    0x0208_8002_28c0_0081, 0x2280_4010_0340_2000, 0x0008_8010_0020_0184, 0x0001_0020_1000_0900, // a2..d2
    0x0182_0006_0010_6008, 0x2058_8004_0080_0200, 0x0004_8002_0080_0900, 0x052d_0012_0040_a100, // e2..h2
    0x4080_0020_4000_1480, 0x0040_0010_0140_2000, 0x0300_2000_1810_4100, 0x2100_0409_0110_0120, // a1..d1
    0x8a00_0600_0408_2070, 0x0080_0144_0002_0080, 0x1100_2500_208a_0004, 0x0900_0042_2201_8100, // e1..h1
];

/// Index bits per rook square; shift is `64 - bits`.
#[rustfmt::skip]
const ROOK_BITS: [u32; 64] = [
    11, 10, 10, 10, 10, 11, 10, 11, // rank 8
    10,  9,  9,  9,  9,  9,  9, 10, // rank 7
    11, 10, 10, 10, 10, 10, 10, 11, // rank 6
    11, 10, 10, 10, 10, 10, 10, 11, // rank 5
    11, 10, 10, 10, 10, 10, 10, 11, // rank 4
    11, 10, 10, 10, 10, 10, 10, 11, // rank 3
    11, 10, 10, 10, 10, 10, 10, 11, // rank 2
    12, 11, 11, 11, 11, 11, 11, 12, // rank 1
];

#[rustfmt::skip]
const BISHOP_MAGICS: [u64; 64] = [
    0xffff_fcfc_fd79_edff, 0xfc08_63fc_cb14_7576, 0x40a0_0400_6213_3000, 0x0142_0280_0084_0400, // a8..d8
    0x0009_0900_1006_1200, 0x0800_8445_2810_0308, 0xfc08_7e8e_4bb2_f736, 0x43ff_9e4e_f4ca_2c89, // e8..h8
    0xfc0f_f286_5334_f576, 0xfc0b_f6ce_5924_f576, 0x8052_2060_8c30_0001, 0x2084_1050_4202_0400, // a7..d7
    0xe018_8010_2206_0220, 0x0001_1220_4901_0200, 0xc3ff_b7dc_36ca_8c89, 0xc3ff_8a54_f4ca_2c89, // e7..h7
    0xDCEF_D9B5_4BFC_C09F, 0xF95F_FA76_5AFD_602B, 0x200a_1041_1000_2040, 0x0800_000c_0831_0c00, // a6..d6
    0x0218_0401_0a01_0400, 0x1092_2004_0022_4100, 0x43ff_9a5c_f4ca_0c01, 0x4BFF_CD8E_7C58_7601, // e6..h6
    0xc001_0412_1121_2004, 0x0208_0188_0004_4800, 0x0080_2064_1058_0800, 0x0000_2011_0008_0084, // a5..d5
    0x0208_0034_0009_4100, 0x2190_4102_0000_4058, 0x0188_8214_0180_8080, 0x2006_0a02_0000_c4c0, // e5..h5
    0x0810_0420_d104_1080, 0x0904_5100_0210_0100, 0x0202_2808_0406_4403, 0x004c_0040_0c03_0082, // a4..d4
    0x0602_0010_0200_5011, 0x7209_0200_c108_9000, 0x4211_4104_2400_8805, 0x0002_8484_2126_0804, // e4..h4
    0x73C0_1AF5_6CF4_CFFB, 0x41A0_1CFA_D64A_AFFC, 0x0604_0002_04a2_0202, 0x0002_8208_0602_4000, // a3..d3
    0x008a_0024_2201_0201, 0x2082_0040_8801_0802, 0x7c0c_028f_5b34_ff76, 0xfc0a_028e_5ab4_df76, // e3..h3
    0xfc08_46a6_4a34_fff6, 0xfc08_7a87_4a3c_f7f6, 0x0009_8802_0420_a000, 0x8000_4404_0080_8200, // a2..d2
    0x208c_8450_c001_3407, 0x1980_1105_2010_8030, 0xfc08_64ae_59b4_ff76, 0x3c08_60af_4b35_ff76, // e2..h2
    0xffed_f9fd_7cfc_ffff, 0xfc09_6285_4a77_f576, 0x0012_2808_c102_a004, 0x2851_2400_8240_0440, // a1..d1
    0x0011_1040_1100_0202, 0x0008_2208_2000_0010, 0xfc0a_66c6_4a7e_f576, 0x7ffd_fdfc_bd79_ffff, // e1..h1
];

#[rustfmt::skip]
const BISHOP_BITS: [u32; 64] = [
    5, 4, 5, 5, 5, 5, 4, 5, // rank 8
    4, 4, 5, 5, 5, 5, 4, 4, // rank 7
    4, 4, 7, 7, 7, 7, 4, 4, // rank 6
    5, 5, 7, 9, 9, 7, 5, 5, // rank 5
    5, 5, 7, 9, 9, 7, 5, 5, // rank 4
    4, 4, 7, 7, 7, 7, 4, 4, // rank 3
    4, 4, 5, 5, 5, 5, 4, 4, // rank 2
    5, 4, 5, 5, 5, 5, 4, 5, // rank 1
];

/// One square's magic lookup: `(occupancy & mask)`, byte-swapped, multiplied
/// and shifted indexes `table`.
pub struct MagicEntry {
    pub magic: u64,
    pub shift: u32,
    pub mask: u64,
    pub table: Box<[u64]>,
}

impl MagicEntry {
    /// The multiplier set is defined over rank-1-first bit order; swapping
    /// bytes maps this engine's rank-8-first boards onto it.
    #[inline(always)]
    fn index(&self, blockers: u64) -> usize {
        ((blockers & self.mask).swap_bytes().wrapping_mul(self.magic) >> self.shift) as usize
    }
}

pub struct MagicTables {
    pub rook: Vec<MagicEntry>,
    pub bishop: Vec<MagicEntry>,
}

impl MagicTables {
    #[inline(always)]
    pub fn rook_attacks(&self, sq: Square, blockers: u64) -> u64 {
        let entry = &self.rook[sq.usize()];
        entry.table[entry.index(blockers)]
    }

    #[inline(always)]
    pub fn bishop_attacks(&self, sq: Square, blockers: u64) -> u64 {
        let entry = &self.bishop[sq.usize()];
        entry.table[entry.index(blockers)]
    }

    /// Queen attacks are the union of the rook and bishop lookups.
    #[inline(always)]
    pub fn queen_attacks(&self, sq: Square, blockers: u64) -> u64 {
        self.rook_attacks(sq, blockers) | self.bishop_attacks(sq, blockers)
    }
}

/// Global tables, built on first use and immutable afterwards.
pub fn magics() -> &'static MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(|| MagicTables {
        rook: build_entries(&ROOK_MAGICS, &ROOK_BITS, &ROOK_DIRECTIONS),
        bishop: build_entries(&BISHOP_MAGICS, &BISHOP_BITS, &BISHOP_DIRECTIONS),
    })
}

/// Scan-based sliding attacks, used only to fill the tables.
pub fn sliding_attacks(sq: u8, directions: &[(i8, i8)], blockers: u64) -> u64 {
    let mut attacks = 0u64;
    for &(dr, df) in directions {
        let mut row = sq as i8 / 8;
        let mut file = sq as i8 % 8;
        loop {
            row += dr;
            file += df;
            if !(0..8).contains(&row) || !(0..8).contains(&file) {
                break;
            }
            let bit = 1u64 << (row * 8 + file);
            attacks |= bit;
            if blockers & bit != 0 {
                break;
            }
        }
    }
    attacks
}

/// Relevant-occupancy mask: the rays without their final edge square, since
/// a piece on the very edge of a ray cannot alter the reachable squares.
fn relevant_mask(sq: u8, directions: &[(i8, i8)]) -> u64 {
    let mut mask = 0u64;
    for &(dr, df) in directions {
        let mut row = sq as i8 / 8;
        let mut file = sq as i8 % 8;
        loop {
            let next_row = row + dr;
            let next_file = file + df;
            if !(0..8).contains(&next_row) || !(0..8).contains(&next_file) {
                break;
            }
            let beyond_row = next_row + dr;
            let beyond_file = next_file + df;
            if !(0..8).contains(&beyond_row) || !(0..8).contains(&beyond_file) {
                break;
            }
            mask |= 1u64 << (next_row * 8 + next_file);
            row = next_row;
            file = next_file;
        }
    }
    mask
}

fn build_entries(magics: &[u64; 64], bits: &[u32; 64], directions: &[(i8, i8)]) -> Vec<MagicEntry> {
    let mut entries = Vec::with_capacity(64);
    for sq in 0u8..64 {
        let mask = relevant_mask(sq, directions);
        let shift = 64 - bits[sq as usize];
        let magic = magics[sq as usize];
        let mut table = vec![0u64; 1usize << bits[sq as usize]].into_boxed_slice();

        let permutations = 1usize << mask.count_ones();
        for index in 0..permutations {
            let occupancy = occupancy_from_index(index, mask);
            let attacks = sliding_attacks(sq, directions, occupancy);
            let key = (occupancy.swap_bytes().wrapping_mul(magic) >> shift) as usize;
            // Sub-shift magics hash distinct occupancies with identical
            // attack sets onto one slot; anything else would be a bad
            // multiplier.
            debug_assert!(table[key] == 0 || table[key] == attacks);
            table[key] = attacks;
        }

        entries.push(MagicEntry { magic, shift, mask, table });
    }
    entries
}
