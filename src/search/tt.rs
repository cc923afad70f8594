use crate::board::Position;
use crate::eval::score;
use crate::moves::movegen::validate_move;
use crate::moves::types::Move;
use crate::square::Square;

/// One cached position: the full key for verification plus a bit-packed
/// data word.
///
///   63..58  ToHorizon (remaining full-width depth when stored)
///   57..51  best move from (7 bits, Illegal when absent)
///   50..44  best move to
///   43..40  best move promotion piece
///   39..10  score, biased by 2^29
///   9..8    score precision
///   7..0    last accessed (search generation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedPosition {
    pub key: u64,
    pub data: u64,
}

const HORIZON_SHIFT: u32 = 58;
const FROM_SHIFT: u32 = 51;
const TO_SHIFT: u32 = 44;
const PROMOTED_SHIFT: u32 = 40;
const SCORE_SHIFT: u32 = 10;
const PRECISION_SHIFT: u32 = 8;

const HORIZON_MASK: u64 = 0x3F;
const SQUARE_MASK: u64 = 0x7F;
const PIECE_MASK: u64 = 0xF;
const SCORE_MASK: u64 = (1 << 30) - 1;
const PRECISION_MASK: u64 = 0x3;
const ACCESSED_MASK: u64 = 0xFF;

const SCORE_BIAS: i32 = 1 << 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScorePrecision {
    Unknown = 0,
    Exact = 1,
    LowerBound = 2,
    UpperBound = 3,
}

impl ScorePrecision {
    #[inline(always)]
    fn from_bits(bits: u64) -> ScorePrecision {
        match bits {
            1 => ScorePrecision::Exact,
            2 => ScorePrecision::LowerBound,
            3 => ScorePrecision::UpperBound,
            _ => ScorePrecision::Unknown,
        }
    }
}

// Pure bit manipulation over the data word; callers write results back.

#[inline(always)]
pub fn to_horizon(data: u64) -> i32 {
    ((data >> HORIZON_SHIFT) & HORIZON_MASK) as i32
}

#[inline(always)]
pub fn set_to_horizon(data: u64, horizon: i32) -> u64 {
    let clamped = horizon.clamp(0, HORIZON_MASK as i32) as u64;
    (data & !(HORIZON_MASK << HORIZON_SHIFT)) | clamped << HORIZON_SHIFT
}

#[inline(always)]
pub fn best_from(data: u64) -> Square {
    Square::from_index(((data >> FROM_SHIFT) & SQUARE_MASK) as u8)
}

#[inline(always)]
pub fn best_to(data: u64) -> Square {
    Square::from_index(((data >> TO_SHIFT) & SQUARE_MASK) as u8)
}

#[inline(always)]
pub fn best_promoted(data: u64) -> u64 {
    (data >> PROMOTED_SHIFT) & PIECE_MASK
}

#[inline(always)]
pub fn set_best_move(data: u64, mv: Move) -> u64 {
    let cleared = data
        & !(SQUARE_MASK << FROM_SHIFT)
        & !(SQUARE_MASK << TO_SHIFT)
        & !(PIECE_MASK << PROMOTED_SHIFT);
    cleared
        | (mv.from().index() as u64) << FROM_SHIFT
        | (mv.to().index() as u64) << TO_SHIFT
        | (mv.promoted() as u64) << PROMOTED_SHIFT
}

#[inline(always)]
pub fn score_of(data: u64) -> i32 {
    ((data >> SCORE_SHIFT) & SCORE_MASK) as i32 - SCORE_BIAS
}

#[inline(always)]
pub fn set_score(data: u64, value: i32) -> u64 {
    let biased = (value + SCORE_BIAS) as u64 & SCORE_MASK;
    (data & !(SCORE_MASK << SCORE_SHIFT)) | biased << SCORE_SHIFT
}

#[inline(always)]
pub fn precision(data: u64) -> ScorePrecision {
    ScorePrecision::from_bits((data >> PRECISION_SHIFT) & PRECISION_MASK)
}

#[inline(always)]
pub fn set_precision(data: u64, value: ScorePrecision) -> u64 {
    (data & !(PRECISION_MASK << PRECISION_SHIFT)) | (value as u64) << PRECISION_SHIFT
}

#[inline(always)]
pub fn last_accessed(data: u64) -> u8 {
    (data & ACCESSED_MASK) as u8
}

#[inline(always)]
pub fn set_last_accessed(data: u64, generation: u8) -> u64 {
    (data & !ACCESSED_MASK) | generation as u64
}

/// A data word carrying no move and no usable score.
pub fn empty_data() -> u64 {
    let mut data = set_score(0, score::NOT_CACHED);
    data = set_best_move(data, Move::NULL);
    data
}

pub const BUCKET_SIZE: usize = 4;

/// 16-byte entries: 65 536 of them per megabyte.
pub const CAPACITY_PER_MEGABYTE: usize = (1024 * 1024) / std::mem::size_of::<CachedPosition>();

/// Fixed-capacity bucketed transposition cache with aging replacement.
pub struct Cache {
    entries: Vec<CachedPosition>,
    /// Wrapping search-generation counter; stamped into entries on access.
    pub searches: u8,
    pub positions: u64,
    pub probes: u64,
    pub hits: u64,
}

impl Cache {
    pub fn new(megabytes: usize) -> Self {
        let mut cache = Cache { entries: Vec::new(), searches: 0, positions: 0, probes: 0, hits: 0 };
        cache.resize(megabytes);
        cache
    }

    /// Allocate `megabytes` worth of entries, rounded down to whole buckets.
    /// At least one bucket always exists so a principal variation can be
    /// extracted.
    pub fn resize(&mut self, megabytes: usize) {
        let entries = (megabytes * CAPACITY_PER_MEGABYTE / BUCKET_SIZE * BUCKET_SIZE)
            .max(BUCKET_SIZE);
        self.entries = vec![CachedPosition { key: 0, data: empty_data() }; entries];
        self.searches = 0;
        self.positions = 0;
        self.probes = 0;
        self.hits = 0;
    }

    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            *entry = CachedPosition { key: 0, data: empty_data() };
        }
        self.searches = 0;
        self.positions = 0;
        self.probes = 0;
        self.hits = 0;
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn new_search(&mut self) {
        self.searches = self.searches.wrapping_add(1);
    }

    /// Hashtable fill, per mille, for `info hashfull`.
    pub fn fill_per_mille(&self) -> u64 {
        self.positions * 1000 / self.entries.len() as u64
    }

    /// Dispersion hash: index by a 32-bit mix of the key rather than the raw
    /// key so bucket choice is not correlated with the key bits the bucket
    /// count ignores.
    #[inline(always)]
    fn bucket_base(&self, key: u64) -> usize {
        let mut mixed = key;
        mixed = (mixed ^ (mixed >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        mixed = (mixed ^ (mixed >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        let hash = (mixed >> 32) as u32;
        let buckets = self.entries.len() / BUCKET_SIZE;
        (hash as usize % buckets) * BUCKET_SIZE
    }

    /// Probe the bucket. A hit refreshes the entry's generation stamp.
    pub fn get(&mut self, key: u64) -> Option<CachedPosition> {
        self.probes += 1;
        let base = self.bucket_base(key);
        for slot in base..base + BUCKET_SIZE {
            if self.entries[slot].key == key {
                let refreshed = set_last_accessed(self.entries[slot].data, self.searches);
                self.entries[slot].data = refreshed;
                self.hits += 1;
                return Some(self.entries[slot]);
            }
        }
        None
    }

    /// Store into the bucket: overwrite the same key if present, otherwise
    /// evict the entry that has gone unaccessed longest.
    pub fn set(&mut self, mut entry: CachedPosition) {
        entry.data = set_last_accessed(entry.data, self.searches);
        let base = self.bucket_base(entry.key);

        let mut victim = base;
        let mut oldest = u16::MAX;
        for slot in base..base + BUCKET_SIZE {
            if self.entries[slot].key == entry.key {
                self.entries[slot] = entry;
                return;
            }
            let age = last_accessed(self.entries[slot].data) as u16;
            if age < oldest {
                oldest = age;
                victim = slot;
            }
        }

        if self.entries[victim].key == 0 {
            self.positions += 1;
        }
        self.entries[victim] = entry;
    }

    /// Rebuild the stored best move and re-validate it against `position`.
    /// Stale or corrupt cached moves come back as `Move::NULL`, never as an
    /// error.
    pub fn best_move(position: &Position, data: u64) -> Move {
        let from = best_from(data);
        if from.is_illegal() {
            return Move::NULL;
        }
        let mut mv = Move::new(from, best_to(data));
        mv.set_promoted(crate::board::Piece::from_u8(best_promoted(data) as u8));
        if !validate_move(position, &mut mv) {
            return Move::NULL;
        }
        mv.set_best(true);
        mv
    }
}
