use crate::board::{
    CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Piece, Position,
};
use crate::eval::score;
use crate::moves::movegen::{find_pinned_pieces, is_square_attacked};
use crate::moves::types::Move;
use crate::square::Square;

/// Rook relocation for a castling move, keyed by the king's target square.
#[inline(always)]
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to.index() {
        62 => (Square::H1, Square::from_index(61)), // white O-O
        58 => (Square::A1, Square::from_index(59)), // white O-O-O
        6 => (Square::H8, Square::from_index(5)),   // black O-O
        2 => (Square::A8, Square::from_index(3)),   // black O-O-O
        _ => unreachable!("not a castling destination"),
    }
}

/// The castling right lost when a rook leaves or is captured on `sq`.
#[inline(always)]
fn rook_right(sq: Square) -> u8 {
    match sq.index() {
        63 => CASTLE_WK, // h1
        56 => CASTLE_WQ, // a1
        7 => CASTLE_BK,  // h8
        0 => CASTLE_BQ,  // a8
        _ => 0,
    }
}

/// Apply `mv` to `position`, producing the successor. The caller keeps the
/// predecessor (the game wrapper snapshots it), so unmake is a stack pop and
/// this function never needs to reverse anything.
pub fn make_move(position: &Position, mv: Move) -> Position {
    let mut next = position.clone_state_only();
    let white = position.white_move;
    let from = mv.from();
    let to = mv.to();
    let piece = position.piece_at(from);
    debug_assert!(piece != Piece::None, "no piece to move on {from}");
    debug_assert!(piece.is_white() == white, "moving the wrong side's piece");

    // Remove the capture victim first so the destination square is free.
    if mv.is_en_passant() {
        let victim_sq = if white {
            Square::from_index(to.index() + 8)
        } else {
            Square::from_index(to.index() - 8)
        };
        next.remove(Piece::pawn(!white), victim_sq);
    } else if mv.is_capture() {
        next.remove(mv.capture_victim(), to);
    }

    next.remove(piece, from);
    if mv.is_promotion() {
        next.place(mv.promoted(), to);
    } else {
        next.place(piece, to);
    }

    if mv.is_castling() {
        let (rook_from, rook_to) = castling_rook_squares(to);
        let rook = Piece::rook(white);
        next.remove(rook, rook_from);
        next.place(rook, rook_to);
    }

    // Castling rights: the king leaving home forfeits both, a rook leaving
    // or dying on its corner forfeits one.
    let mut lost_rights = 0u8;
    if piece.is_king() {
        lost_rights |= if white { CASTLE_WK | CASTLE_WQ } else { CASTLE_BK | CASTLE_BQ };
    }
    if piece == Piece::rook(white) {
        lost_rights |= rook_right(from);
    }
    if mv.is_capture() && mv.capture_victim() == Piece::rook(!white) {
        lost_rights |= rook_right(to);
    }
    next.castling &= !lost_rights;

    // En passant only exists for the single ply after a double push.
    next.en_passant = if mv.is_double_pawn_push() {
        if white { Square::from_index(from.index() - 8) } else { Square::from_index(from.index() + 8) }
    } else {
        Square::ILLEGAL
    };

    if mv.is_capture() || mv.is_pawn_move() {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = position.halfmove_clock.saturating_add(1);
    }
    if !white {
        next.fullmove_number += 1;
    }

    next.white_move = !white;
    next.played_move = mv;
    next.static_score = score::NONE;
    next.refresh_key();
    next.king_in_check =
        is_square_attacked(&next, next.king_square(next.white_move), !next.white_move);
    find_pinned_pieces(&mut next);

    #[cfg(feature = "paranoid_hash")]
    next.assert_keys();

    next
}

/// A pass: the side to move changes and nothing else happens on the board.
/// Null-move pruning only calls this when the mover is not in check.
pub fn make_null_move(position: &Position) -> Position {
    let mut next = position.clone_state_only();
    next.en_passant = Square::ILLEGAL;
    next.halfmove_clock = position.halfmove_clock.saturating_add(1);
    next.white_move = !position.white_move;
    next.played_move = Move::NULL;
    next.static_score = score::NONE;
    next.refresh_key();
    next.king_in_check =
        is_square_attacked(&next, next.king_square(next.white_move), !next.white_move);
    find_pinned_pieces(&mut next);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::movegen::validate_move;

    fn play(position: &Position, lan: &str) -> Position {
        let mut mv = Move::parse_long_algebraic(lan, position.white_move).unwrap();
        assert!(validate_move(position, &mut mv), "{lan} should be pseudo-legal");
        make_move(position, mv)
    }

    #[test]
    fn simple_pawn_push_updates_state() {
        let start = Position::start();
        let next = play(&start, "e2e4");
        assert_eq!(next.piece_at("e4".parse().unwrap()), Piece::WhitePawn);
        assert_eq!(next.piece_at("e2".parse().unwrap()), Piece::None);
        assert!(!next.white_move);
        assert_eq!(next.en_passant.to_string(), "e3");
        assert_eq!(next.halfmove_clock, 0);
        assert_eq!(next.fullmove_number, 1);
        next.validate().unwrap();
        let (psk, key) = next.compute_keys_full();
        assert_eq!(next.pieces_squares_key, psk);
        assert_eq!(next.key, key);
    }

    #[test]
    fn en_passant_removes_the_bypassing_pawn() {
        let position = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let next = play(&position, "e5d6");
        assert_eq!(next.piece_at("d6".parse().unwrap()), Piece::WhitePawn);
        assert_eq!(next.piece_at("d5".parse().unwrap()), Piece::None);
        assert_eq!(next.occupancy.count_ones(), 3);
        assert_eq!(next.halfmove_clock, 0);
    }

    #[test]
    fn castling_moves_the_rook_and_burns_rights() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let next = play(&position, "e1g1");
        assert_eq!(next.piece_at("g1".parse().unwrap()), Piece::WhiteKing);
        assert_eq!(next.piece_at("f1".parse().unwrap()), Piece::WhiteRook);
        assert_eq!(next.piece_at("h1".parse().unwrap()), Piece::None);
        assert_eq!(next.castling & (CASTLE_WK | CASTLE_WQ), 0);
    }

    #[test]
    fn rook_capture_on_home_square_burns_the_right() {
        let position =
            Position::from_fen("r3k3/8/8/8/8/8/8/R3K2R w KQq - 0 1").unwrap();
        let next = play(&position, "a1a8");
        assert_eq!(next.castling & CASTLE_BQ, 0);
        // White's own queenside right went with the rook leaving a1.
        assert_eq!(next.castling & CASTLE_WQ, 0);
        assert_ne!(next.castling & CASTLE_WK, 0);
    }

    #[test]
    fn promotion_swaps_the_pawn_for_the_piece() {
        let position = Position::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let next = play(&position, "a7a8q");
        assert_eq!(next.piece_at(Square::A8), Piece::WhiteQueen);
        assert_eq!(next.piece_bb(Piece::WhitePawn), 0);
    }

    #[test]
    fn giving_check_is_flagged_on_the_successor() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        let next = play(&position, "a1a8");
        assert!(next.king_in_check);
    }

    #[test]
    fn null_move_flips_side_and_clears_en_passant() {
        let position =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        let next = make_null_move(&position);
        assert!(next.white_move);
        assert!(next.en_passant.is_illegal());
        assert_eq!(next.occupancy, position.occupancy);
        let (_, key) = next.compute_keys_full();
        assert_eq!(next.key, key);
    }

    #[test]
    fn fifty_move_clock_counts_quiet_piece_moves() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/4KN2 w - - 12 40").unwrap();
        let next = play(&position, "f1g3");
        assert_eq!(next.halfmove_clock, 13);
    }
}
