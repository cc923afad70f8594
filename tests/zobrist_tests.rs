use vigil::game::Game;

const FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
    "4k3/P7/8/8/8/8/8/4K3 w - - 0 1",
];

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[test]
fn keys_are_deterministic_per_position() {
    let a = Game::from_fen(FENS[1]).unwrap();
    let b = Game::from_fen(FENS[1]).unwrap();
    assert_eq!(a.position.key, b.position.key);
    assert_eq!(a.position.pieces_squares_key, b.position.pieces_squares_key);
    assert_ne!(a.position.key, 0);
}

#[test]
fn play_and_undo_restore_both_keys_exactly() {
    let mut game = Game::new();
    let key = game.position.key;
    let pieces_key = game.position.pieces_squares_key;
    for lan in ["e2e4", "c7c5", "g1f3", "d7d6", "f1b5", "c8d7", "e1g1"] {
        game.play_lan(lan).unwrap();
    }
    for _ in 0..7 {
        game.undo_move();
    }
    assert_eq!(game.position.key, key);
    assert_eq!(game.position.pieces_squares_key, pieces_key);
}

#[test]
fn incremental_keys_match_full_recomputation_along_random_games() {
    for &seed0 in &[1u64, 2, 42, 99] {
        for &fen in FENS {
            let mut game = Game::from_fen(fen).unwrap();
            let mut seed = seed0;
            for _ply in 0..120 {
                let (pieces_key, key) = game.position.compute_keys_full();
                assert_eq!(game.position.pieces_squares_key, pieces_key, "psk drift in {fen}");
                assert_eq!(game.position.key, key, "key drift in {fen}");

                let moves = game.legal_moves();
                if moves.is_empty() {
                    break;
                }
                seed = splitmix64(seed);
                let mv = moves[(seed as usize) % moves.len()];
                let legal = game.play_move(mv);
                assert!(legal);
            }
        }
    }
}

#[test]
fn side_to_move_and_castling_and_ep_feed_the_key() {
    // Same piece placement, different castling rights.
    let all = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let none = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
    assert_eq!(all.position.pieces_squares_key, none.position.pieces_squares_key);
    assert_ne!(all.position.key, none.position.key);

    // Side to move.
    let white = Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let black = Game::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert_ne!(white.position.key, black.position.key);

    // En-passant file.
    let with_ep =
        Game::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
    let without_ep =
        Game::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
    assert_ne!(with_ep.position.key, without_ep.position.key);
}

#[test]
fn transpositions_reach_the_same_key() {
    let mut kingside_first = Game::new();
    for lan in ["g1f3", "g8f6", "b1c3", "b8c6"] {
        kingside_first.play_lan(lan).unwrap();
    }
    let mut queenside_first = Game::new();
    for lan in ["b1c3", "b8c6", "g1f3", "g8f6"] {
        queenside_first.play_lan(lan).unwrap();
    }
    assert_eq!(kingside_first.position.key, queenside_first.position.key);
}
