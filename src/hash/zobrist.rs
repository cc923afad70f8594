use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::board::Piece;

/// Fixed seed so every process derives the same keys. Cache entries and
/// logged fingerprints stay comparable across runs.
const ZOBRIST_SEED: u64 = 0x70D0_94C1_9A6E_3D21;

pub struct ZobristKeys {
    /// `[piece][square]` with `Piece::None` at index 0 left unused.
    pub piece: [[u64; 64]; 13],
    /// One key per castling right, in WK, WQ, BK, BQ bit order.
    pub castling: [u64; 4],
    /// En-passant file a..h => 0..7.
    pub ep_file: [u64; 8],
    pub black_to_move: u64,
}

/// Global keys, initialized on first use and immutable afterwards.
pub fn keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate(StdRng::seed_from_u64(ZOBRIST_SEED)))
}

fn generate(mut rng: StdRng) -> ZobristKeys {
    // Zero keys would make features vanish from the fingerprint.
    fn non_zero(rng: &mut StdRng) -> u64 {
        let mut v = rng.next_u64();
        while v == 0 {
            v = rng.next_u64();
        }
        v
    }

    let mut keys = ZobristKeys {
        piece: [[0u64; 64]; 13],
        castling: [0u64; 4],
        ep_file: [0u64; 8],
        black_to_move: 0,
    };

    for piece in Piece::ALL {
        for sq in 0..64 {
            keys.piece[piece as usize][sq] = non_zero(&mut rng);
        }
    }
    for right in 0..4 {
        keys.castling[right] = non_zero(&mut rng);
    }
    for file in 0..8 {
        keys.ep_file[file] = non_zero(&mut rng);
    }
    keys.black_to_move = non_zero(&mut rng);
    keys
}

/// XOR in/out the castling keys whose rights changed between `old` and `new`.
#[inline]
pub fn xor_castling_delta(hash: &mut u64, old: u8, new: u8) {
    let delta = old ^ new;
    let keys = keys();
    for right in 0..4 {
        if delta & (1 << right) != 0 {
            *hash ^= keys.castling[right];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic_and_distinct() {
        let a = generate(StdRng::seed_from_u64(ZOBRIST_SEED));
        let b = generate(StdRng::seed_from_u64(ZOBRIST_SEED));
        assert_eq!(a.black_to_move, b.black_to_move);
        assert_eq!(a.piece[1][0], b.piece[1][0]);
        assert_ne!(a.piece[1][0], a.piece[1][1]);
    }

    #[test]
    fn castling_delta_is_symmetric() {
        let mut h = 0u64;
        xor_castling_delta(&mut h, 0b1111, 0b0000);
        let all_rights = h;
        xor_castling_delta(&mut h, 0b0000, 0b1111);
        assert_eq!(h, 0);
        assert_ne!(all_rights, 0);
    }
}
