use tracing::debug;

use crate::game::Game;
use crate::moves::movegen::{ALL_SQUARES, GenMode, generate};
use crate::moves::types::Move;

/// Count leaf nodes of the legal move tree: generate pseudo-legal, filter
/// by playing, recurse.
pub fn perft(game: &mut Game, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    game.position.reset_move_gen();
    generate(&mut game.position, GenMode::AllMoves, ALL_SQUARES);
    let moves: Vec<Move> = game.position.moves.iter().copied().collect();
    game.position.reset_move_gen();

    let mut nodes = 0;
    for mv in moves {
        if game.play_move(mv) {
            nodes += if depth == 1 { 1 } else { perft(game, depth - 1) };
        }
        game.undo_move();
    }
    nodes
}

/// Per-root-move node counts, the classic divide diagnostic.
pub fn perft_divide(game: &mut Game, depth: u32) -> Vec<(Move, u64)> {
    let mut rows = Vec::new();
    for mv in game.legal_moves() {
        let played = game.play_move(mv);
        debug_assert!(played);
        let nodes = if depth <= 1 { 1 } else { perft(game, depth - 1) };
        game.undo_move();
        debug!(target: "perft", "{} {}", mv.to_lan(), nodes);
        rows.push((mv, nodes));
    }
    rows
}
