use crate::board::Position;
use crate::error::EngineError;
use crate::moves::execute::{make_move, make_null_move};
use crate::moves::movegen::{
    ALL_SQUARES, GenMode, castling_path_safe, generate, is_square_attacked, validate_move,
};
use crate::moves::types::Move;

/// The current position plus a stack of every predecessor since the root.
/// Positions are value types, so unmake is a pop and repetition detection is
/// a key scan over the stack.
pub struct Game {
    pub position: Position,
    history: Vec<Position>,
}

impl Game {
    pub fn new() -> Self {
        Game { position: Position::start(), history: Vec::with_capacity(256) }
    }

    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        Ok(Game { position: Position::from_fen(fen)?, history: Vec::with_capacity(256) })
    }

    pub fn reset(&mut self) {
        self.position = Position::start();
        self.history.clear();
    }

    pub fn set_fen(&mut self, fen: &str) -> Result<(), EngineError> {
        self.position = Position::from_fen(fen)?;
        self.history.clear();
        Ok(())
    }

    #[inline(always)]
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Snapshot the current position, apply `mv`, and report whether the
    /// move was legal. On `false` the caller must `undo_move`; the board
    /// state is still pushed so control flow stays uniform.
    pub fn play_move(&mut self, mv: Move) -> bool {
        debug_assert!(mv.is_valid());
        let castling_ok = !mv.is_castling() || castling_path_safe(&self.position, mv);

        // A non-king move by an unpinned piece cannot expose the own king
        // unless it was already in check or captures en passant.
        let needs_king_test = self.position.king_in_check
            || mv.is_king_move()
            || mv.is_en_passant()
            || self.position.pinned & mv.from().bit() != 0;

        let next = make_move(&self.position, mv);
        self.history.push(std::mem::replace(&mut self.position, next));

        if !castling_ok {
            return false;
        }
        if !needs_king_test {
            return true;
        }
        let mover_is_white = !self.position.white_move;
        !is_square_attacked(
            &self.position,
            self.position.king_square(mover_is_white),
            self.position.white_move,
        )
    }

    pub fn play_null_move(&mut self) {
        let next = make_null_move(&self.position);
        self.history.push(std::mem::replace(&mut self.position, next));
    }

    pub fn undo_move(&mut self) {
        if let Some(previous) = self.history.pop() {
            self.position = previous;
        } else {
            debug_assert!(false, "undo with empty history");
        }
    }

    /// Occurrences of `key` among the predecessors on the stack.
    pub fn position_count(&self, key: u64) -> usize {
        self.history.iter().filter(|p| p.key == key).count()
    }

    /// How often the current position has occurred, itself included.
    #[inline]
    pub fn repetitions(&self) -> usize {
        self.position_count(self.position.key) + 1
    }

    #[inline]
    pub fn fifty_move_draw(&self) -> bool {
        self.position.halfmove_clock >= 100
    }

    /// Re-decorate a bare `(from, to, promoted)` move against the current
    /// position and verify full legality. On success the move carries its
    /// capture, castling, pawn and check flags and can be fed to the
    /// searcher or played.
    pub fn validate_move(&mut self, mv: &mut Move) -> Result<(), EngineError> {
        if !validate_move(&self.position, mv) {
            return Err(EngineError::IllegalMove(mv.to_lan()));
        }
        let legal = self.play_move(*mv);
        if legal {
            mv.set_check(self.position.king_in_check);
        }
        self.undo_move();
        if legal { Ok(()) } else { Err(EngineError::IllegalMove(mv.to_lan())) }
    }

    /// Parse and play one long-algebraic move (the `position … moves` path).
    pub fn play_lan(&mut self, lan: &str) -> Result<(), EngineError> {
        let mut mv = Move::parse_long_algebraic(lan, self.position.white_move)?;
        self.validate_move(&mut mv)?;
        let legal = self.play_move(mv);
        debug_assert!(legal);
        Ok(())
    }

    /// All legal moves of the current position, generated fresh.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        self.position.reset_move_gen();
        generate(&mut self.position, GenMode::AllMoves, ALL_SQUARES);
        let pseudo: Vec<Move> = self.position.moves.iter().copied().collect();
        self.position.reset_move_gen();

        let mut legal = Vec::with_capacity(pseudo.len());
        for mv in pseudo {
            if self.play_move(mv) {
                legal.push(mv);
            }
            self.undo_move();
        }
        legal
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_then_undo_restores_the_position_bit_for_bit() {
        let mut game = Game::new();
        let snapshot = game.position.clone();
        game.play_lan("g1f3").unwrap();
        assert_ne!(game.position.key, snapshot.key);
        game.undo_move();
        assert_eq!(game.position, snapshot);
    }

    #[test]
    fn illegal_moves_are_rejected_and_leave_no_trace() {
        let mut game = Game::new();
        let before = game.position.clone();
        assert!(game.play_lan("e2e5").is_err());
        assert!(game.play_lan("e7e5").is_err());
        assert!(game.play_lan("d1d5").is_err());
        assert_eq!(game.position, before);
        assert_eq!(game.ply_count(), 0);
    }

    #[test]
    fn moving_a_pinned_piece_off_the_line_is_illegal() {
        // The rook on e2 is pinned by the rook on e7.
        let mut game = Game::from_fen("4k3/4r3/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        assert!(game.play_lan("e2c2").is_err());
        // Sliding along the pin line stays legal.
        assert!(game.play_lan("e2e3").is_ok());
    }

    #[test]
    fn castling_through_an_attacked_square_is_illegal() {
        // Black rook on f8 covers f1.
        let mut game = Game::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(game.play_lan("e1g1").is_err());
        assert!(game.play_lan("e1c1").is_ok());
    }

    #[test]
    fn threefold_repetition_is_counted() {
        let mut game = Game::new();
        for _ in 0..2 {
            game.play_lan("g1f3").unwrap();
            game.play_lan("g8f6").unwrap();
            game.play_lan("f3g1").unwrap();
            game.play_lan("f6g8").unwrap();
        }
        // Start position now stood three times.
        assert_eq!(game.repetitions(), 3);
    }

    #[test]
    fn legal_move_counts_for_known_positions() {
        let mut game = Game::new();
        assert_eq!(game.legal_moves().len(), 20);

        let mut kiwipete = Game::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        assert_eq!(kiwipete.legal_moves().len(), 48);
    }

    #[test]
    fn validate_move_stamps_the_check_flag() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        let mut mv = Move::parse_long_algebraic("a1a8", true).unwrap();
        game.validate_move(&mut mv).unwrap();
        assert!(mv.is_check());
    }

    #[test]
    fn fifty_move_rule_trips_at_one_hundred_plies() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/4KN2 w - - 99 80").unwrap();
        assert!(!game.fifty_move_draw());
        game.play_lan("f1g3").unwrap();
        assert!(game.fifty_move_draw());
    }
}
