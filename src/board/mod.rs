mod fen;

use std::fmt;
use std::str::FromStr;

use arrayvec::ArrayVec;

use crate::bitboard::BitboardExt;
use crate::error::EngineError;
use crate::eval::score;
use crate::hash::zobrist;
use crate::moves::movegen::GenStage;
use crate::moves::types::Move;
use crate::square::Square;

pub use fen::START_FEN;

/// Castling rights bits: WK, WQ, BK, BQ.
pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;
pub const CASTLE_ALL: u8 = CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ;

/// Staged move generation scratch holds at most this many moves.
pub const MAX_MOVES: usize = 128;

/// All pieces of both colors. Values are ordered so that a non-`None` piece
/// `<= WhiteKing` is white, which lets flag packing and color tests stay
/// integer comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Piece {
    None = 0,
    WhitePawn = 1,
    WhiteKnight = 2,
    WhiteBishop = 3,
    WhiteRook = 4,
    WhiteQueen = 5,
    WhiteKing = 6,
    BlackPawn = 7,
    BlackKnight = 8,
    BlackBishop = 9,
    BlackRook = 10,
    BlackQueen = 11,
    BlackKing = 12,
}

impl Piece {
    pub const ALL: [Piece; 12] = [
        Piece::WhitePawn,
        Piece::WhiteKnight,
        Piece::WhiteBishop,
        Piece::WhiteRook,
        Piece::WhiteQueen,
        Piece::WhiteKing,
        Piece::BlackPawn,
        Piece::BlackKnight,
        Piece::BlackBishop,
        Piece::BlackRook,
        Piece::BlackQueen,
        Piece::BlackKing,
    ];

    #[inline(always)]
    pub fn from_u8(v: u8) -> Piece {
        debug_assert!(v <= 12, "invalid piece encoding {v}");
        // Values 0..=12 cover every variant.
        unsafe { std::mem::transmute(v.min(12)) }
    }

    #[inline(always)]
    pub fn is_white(self) -> bool {
        (1..=6).contains(&(self as u8))
    }

    #[inline(always)]
    pub fn is_pawn(self) -> bool {
        self == Piece::WhitePawn || self == Piece::BlackPawn
    }

    #[inline(always)]
    pub fn is_king(self) -> bool {
        self == Piece::WhiteKing || self == Piece::BlackKing
    }

    /// Color-independent kind index: pawn 0 … king 5. `None` is a caller bug.
    #[inline(always)]
    pub fn kind(self) -> usize {
        debug_assert!(self != Piece::None);
        (self as usize - 1) % 6
    }

    #[inline(always)]
    pub fn pawn(white: bool) -> Piece {
        if white { Piece::WhitePawn } else { Piece::BlackPawn }
    }

    #[inline(always)]
    pub fn knight(white: bool) -> Piece {
        if white { Piece::WhiteKnight } else { Piece::BlackKnight }
    }

    #[inline(always)]
    pub fn bishop(white: bool) -> Piece {
        if white { Piece::WhiteBishop } else { Piece::BlackBishop }
    }

    #[inline(always)]
    pub fn rook(white: bool) -> Piece {
        if white { Piece::WhiteRook } else { Piece::BlackRook }
    }

    #[inline(always)]
    pub fn queen(white: bool) -> Piece {
        if white { Piece::WhiteQueen } else { Piece::BlackQueen }
    }

    #[inline(always)]
    pub fn king(white: bool) -> Piece {
        if white { Piece::WhiteKing } else { Piece::BlackKing }
    }

    pub fn to_char(self) -> char {
        match self {
            Piece::None => '.',
            Piece::WhitePawn => 'P',
            Piece::WhiteKnight => 'N',
            Piece::WhiteBishop => 'B',
            Piece::WhiteRook => 'R',
            Piece::WhiteQueen => 'Q',
            Piece::WhiteKing => 'K',
            Piece::BlackPawn => 'p',
            Piece::BlackKnight => 'n',
            Piece::BlackBishop => 'b',
            Piece::BlackRook => 'r',
            Piece::BlackQueen => 'q',
            Piece::BlackKing => 'k',
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        Some(match c {
            'P' => Piece::WhitePawn,
            'N' => Piece::WhiteKnight,
            'B' => Piece::WhiteBishop,
            'R' => Piece::WhiteRook,
            'Q' => Piece::WhiteQueen,
            'K' => Piece::WhiteKing,
            'p' => Piece::BlackPawn,
            'n' => Piece::BlackKnight,
            'b' => Piece::BlackBishop,
            'r' => Piece::BlackRook,
            'q' => Piece::BlackQueen,
            'k' => Piece::BlackKing,
            _ => return None,
        })
    }
}

/// Full position state. A value type: the game wrapper and the searcher
/// snapshot whole positions onto a history stack, so unmake is a pop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Indexed by `Piece`; slot 0 (`Piece::None`) stays empty.
    pub bitboards: [u64; 13],
    pub occupancy_white: u64,
    pub occupancy_black: u64,
    pub occupancy: u64,
    /// Own pieces pinned to the own king, refreshed by `find_pinned_pieces`.
    pub pinned: u64,
    pub white_move: bool,
    pub castling: u8,
    /// En-passant target square, `Square::ILLEGAL` when unavailable.
    pub en_passant: Square,
    /// Plies since the last capture or pawn move (fifty-move rule).
    pub halfmove_clock: u8,
    pub fullmove_number: u16,
    pub king_in_check: bool,

    // Staged move generation scratch.
    pub moves: ArrayVec<Move, MAX_MOVES>,
    pub current_move_index: usize,
    pub stage: GenStage,

    /// Zobrist hash over pieces and squares only.
    pub pieces_squares_key: u64,
    /// Full fingerprint: pieces/squares, side to move, castling, ep file.
    pub key: u64,
    /// Memoized static evaluation, `score::NONE` until computed.
    pub static_score: i32,
    /// The move that produced this position.
    pub played_move: Move,
}

impl Position {
    pub fn empty() -> Self {
        Position {
            bitboards: [0; 13],
            occupancy_white: 0,
            occupancy_black: 0,
            occupancy: 0,
            pinned: 0,
            white_move: true,
            castling: 0,
            en_passant: Square::ILLEGAL,
            halfmove_clock: 0,
            fullmove_number: 1,
            king_in_check: false,
            moves: ArrayVec::new(),
            current_move_index: 0,
            stage: GenStage::BestMove,
            pieces_squares_key: 0,
            key: 0,
            static_score: score::NONE,
            played_move: Move::NULL,
        }
    }

    pub fn start() -> Self {
        Position::from_fen(START_FEN).expect("start FEN is valid")
    }

    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let mut position = Position::empty();
        position.set_fen(fen)?;
        Ok(position)
    }

    #[inline(always)]
    pub fn piece_bb(&self, piece: Piece) -> u64 {
        self.bitboards[piece as usize]
    }

    #[inline(always)]
    pub fn occupancy_of(&self, white: bool) -> u64 {
        if white { self.occupancy_white } else { self.occupancy_black }
    }

    /// Place `piece` on `sq`, keeping occupancies and the pieces/squares key
    /// in step. The square must be empty.
    #[inline(always)]
    pub fn place(&mut self, piece: Piece, sq: Square) {
        debug_assert!(piece != Piece::None);
        debug_assert!(!self.occupancy.is_set(sq));
        let bit = sq.bit();
        self.bitboards[piece as usize] |= bit;
        if piece.is_white() {
            self.occupancy_white |= bit;
        } else {
            self.occupancy_black |= bit;
        }
        self.occupancy |= bit;
        self.pieces_squares_key ^= zobrist::keys().piece[piece as usize][sq.usize()];
    }

    /// Remove `piece` from `sq`. The piece must be there.
    #[inline(always)]
    pub fn remove(&mut self, piece: Piece, sq: Square) {
        debug_assert!(self.piece_bb(piece).is_set(sq));
        let bit = sq.bit();
        self.bitboards[piece as usize] &= !bit;
        if piece.is_white() {
            self.occupancy_white &= !bit;
        } else {
            self.occupancy_black &= !bit;
        }
        self.occupancy &= !bit;
        self.pieces_squares_key ^= zobrist::keys().piece[piece as usize][sq.usize()];
    }

    /// The piece on `sq`, or `Piece::None`. An occupancy bit without a
    /// matching piece bit is a corrupt position: asserted in debug builds,
    /// tolerated as empty in release.
    pub fn piece_at(&self, sq: Square) -> Piece {
        if !self.occupancy.is_set(sq) {
            return Piece::None;
        }
        let (lo, hi) = if self.occupancy_white.is_set(sq) { (1u8, 6u8) } else { (7u8, 12u8) };
        for p in lo..=hi {
            if self.bitboards[p as usize].is_set(sq) {
                return Piece::from_u8(p);
            }
        }
        debug_assert!(
            false,
            "{}",
            EngineError::CorruptPosition(format!("occupied {sq} has no piece bit"))
        );
        Piece::None
    }

    #[inline(always)]
    pub fn king_square(&self, white: bool) -> Square {
        self.piece_bb(Piece::king(white)).lsb()
    }

    /// Non-pawn, non-king material for the side, the null-move guard.
    #[inline(always)]
    pub fn has_non_pawn_material(&self, white: bool) -> bool {
        (self.piece_bb(Piece::knight(white))
            | self.piece_bb(Piece::bishop(white))
            | self.piece_bb(Piece::rook(white))
            | self.piece_bb(Piece::queen(white)))
            != 0
    }

    /// Fold side to move, castling rights and en-passant file into the
    /// pieces/squares key.
    pub fn compose_key(&self) -> u64 {
        let keys = zobrist::keys();
        let mut key = self.pieces_squares_key;
        if !self.white_move {
            key ^= keys.black_to_move;
        }
        for right in 0..4 {
            if self.castling & (1 << right) != 0 {
                key ^= keys.castling[right];
            }
        }
        if !self.en_passant.is_illegal() {
            key ^= keys.ep_file[self.en_passant.file() as usize];
        }
        key
    }

    /// Recompute both keys from scratch. Must agree with the incremental
    /// values at all times.
    pub fn compute_keys_full(&self) -> (u64, u64) {
        let keys = zobrist::keys();
        let mut psk = 0u64;
        for piece in Piece::ALL {
            let mut bb = self.piece_bb(piece);
            while bb != 0 {
                let sq = crate::bitboard::pop_lsb(&mut bb);
                psk ^= keys.piece[piece as usize][sq as usize];
            }
        }
        let mut probe = self.clone_state_only();
        probe.pieces_squares_key = psk;
        (psk, probe.compose_key())
    }

    /// Refresh `key` after state fields changed; `pieces_squares_key` is
    /// maintained by `place`/`remove`.
    #[inline(always)]
    pub fn refresh_key(&mut self) {
        self.key = self.compose_key();
    }

    #[cfg(any(debug_assertions, feature = "paranoid_hash"))]
    pub fn assert_keys(&self) {
        let (psk, key) = self.compute_keys_full();
        debug_assert_eq!(self.pieces_squares_key, psk, "pieces/squares key drifted");
        debug_assert_eq!(self.key, key, "full key drifted");
    }

    /// Copy everything except the move-generation scratch.
    pub fn clone_state_only(&self) -> Position {
        let mut copy = self.clone();
        copy.reset_move_gen();
        copy
    }

    pub fn reset_move_gen(&mut self) {
        self.moves.clear();
        self.current_move_index = 0;
        self.stage = GenStage::BestMove;
    }

    /// Occupancy bitboards must agree with the piece bitboards and no square
    /// may carry two pieces.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = 0u64;
        let mut white = 0u64;
        let mut black = 0u64;
        for piece in Piece::ALL {
            let bb = self.piece_bb(piece);
            if seen & bb != 0 {
                return Err(EngineError::CorruptPosition(format!(
                    "{:?} overlaps another piece",
                    piece
                )));
            }
            seen |= bb;
            if piece.is_white() {
                white |= bb;
            } else {
                black |= bb;
            }
        }
        if white != self.occupancy_white || black != self.occupancy_black || seen != self.occupancy
        {
            return Err(EngineError::CorruptPosition("occupancy out of step".into()));
        }
        if self.piece_bb(Piece::WhiteKing).count() != 1
            || self.piece_bb(Piece::BlackKing).count() != 1
        {
            return Err(EngineError::CorruptPosition("king count must be one".into()));
        }
        Ok(())
    }
}

impl FromStr for Position {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..8u8 {
            write!(f, "{} ", 8 - row)?;
            for file in 0..8u8 {
                let sq = Square::from_index(row * 8 + file);
                write!(f, " {}", self.piece_at(sq).to_char())?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")?;
        write!(f, "{}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_color_split_matches_ordering() {
        assert!(Piece::WhitePawn.is_white());
        assert!(Piece::WhiteKing.is_white());
        assert!(!Piece::BlackPawn.is_white());
        assert!(!Piece::None.is_white());
        assert!(Piece::WhiteKing as u8 == 6);
    }

    #[test]
    fn start_position_invariants() {
        let position = Position::start();
        position.validate().unwrap();
        assert_eq!(position.occupancy.count(), 32);
        assert_eq!(position.occupancy_white | position.occupancy_black, position.occupancy);
        assert!(position.white_move);
        assert_eq!(position.castling, CASTLE_ALL);
        assert!(position.en_passant.is_illegal());
    }

    #[test]
    fn place_remove_round_trips_keys() {
        let mut position = Position::empty();
        let before = position.pieces_squares_key;
        position.place(Piece::WhiteQueen, Square::E1);
        assert_eq!(position.piece_at(Square::E1), Piece::WhiteQueen);
        position.remove(Piece::WhiteQueen, Square::E1);
        assert_eq!(position.pieces_squares_key, before);
        assert_eq!(position.occupancy, 0);
    }

    #[test]
    fn composed_key_tracks_state_fields() {
        let mut position = Position::start();
        let original = position.key;
        position.white_move = false;
        position.refresh_key();
        assert_ne!(position.key, original);
        position.white_move = true;
        position.refresh_key();
        assert_eq!(position.key, original);
    }
}
