use vigil::game::Game;
use vigil::moves::perft::{perft, perft_divide};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const KIWI_FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn run_depth(fen: &str, depth: u32, expected: u64) {
    let mut game = Game::from_fen(fen).expect("valid FEN");
    let nodes = perft(&mut game, depth);
    assert_eq!(nodes, expected, "perft mismatch at depth {depth} for {fen}");
}

#[test]
fn perft_startpos_d1() {
    run_depth(START_FEN, 1, 20);
}

#[test]
fn perft_startpos_d2() {
    run_depth(START_FEN, 2, 400);
}

#[test]
fn perft_startpos_d3() {
    run_depth(START_FEN, 3, 8_902);
}

#[test]
fn perft_startpos_d4() {
    run_depth(START_FEN, 4, 197_281);
}

#[test]
fn perft_startpos_d5() {
    run_depth(START_FEN, 5, 4_865_609);
}

// Deep node counts, opt-in.
#[test]
#[ignore]
fn perft_startpos_d6() {
    run_depth(START_FEN, 6, 119_060_324);
}

/// Kiwipete exercises castling, pins, en passant and promotions at once.
#[test]
fn perft_kiwipete_shallow() {
    run_depth(KIWI_FEN, 1, 48);
    run_depth(KIWI_FEN, 2, 2_039);
    run_depth(KIWI_FEN, 3, 97_862);
}

#[test]
fn perft_kiwipete_d4() {
    run_depth(KIWI_FEN, 4, 4_085_603);
}

/// Positions with one tricky feature each.
#[test]
fn perft_feature_positions() {
    // En passant capture available: five king moves, push, and e5xd6.
    run_depth("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", 1, 7);
    // Promotion fan-out.
    run_depth("4k3/P7/8/8/8/8/8/4K3 w - - 0 1", 1, 9);
    // Position 3 from the classic perft suite.
    run_depth("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 3, 2_812);
    run_depth("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 4, 43_238);
}

#[test]
fn divide_sums_match_totals() {
    let mut game = Game::from_fen(KIWI_FEN).unwrap();
    let rows = perft_divide(&mut game, 2);
    assert_eq!(rows.len(), 48);
    let total: u64 = rows.iter().map(|(_, nodes)| nodes).sum();
    assert_eq!(total, 2_039);
}
