//! The Universal Chess Interface loop. The stdin reader stays on the main
//! thread so `stop` and `quit` act immediately through the shared atomic;
//! everything else is forwarded to a worker thread that owns the game, the
//! cache and the heuristic tables for its whole lifetime.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, unbounded};
use tracing::info;

use crate::eval::score;
use crate::game::Game;
use crate::moves::notation::parse_standard_algebraic;
use crate::moves::perft::perft_divide;
use crate::search::{SearchLimits, SearchReport, Searcher, StrengthLimits};

const NAME: &str = "Vigil";
const AUTHOR: &str = "the Vigil authors";
const DEFAULT_HASH_MB: usize = 128;

/// Run the UCI session to completion. Returns the process exit code.
pub fn run() -> i32 {
    // An unhandled internal error anywhere must still produce diagnostics
    // and the documented exit status.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        eprintln!("fatal: {panic_info}");
        default_hook(panic_info);
        std::process::exit(-1);
    }));

    let stop_flag = Arc::new(AtomicBool::new(false));
    let (commands, inbox) = unbounded::<String>();
    let worker_flag = stop_flag.clone();
    let worker = thread::spawn(move || engine_thread(inbox, worker_flag));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let command = line.split_whitespace().next().unwrap_or_default();
        match command {
            "uci" => {
                println!("id name {NAME} {}", env!("CARGO_PKG_VERSION"));
                println!("id author {AUTHOR}");
                print_options();
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "stop" => stop_flag.store(false, Ordering::Release),
            "quit" => {
                stop_flag.store(false, Ordering::Release);
                let _ = commands.send("quit".to_string());
                break;
            }
            _ => {
                let _ = commands.send(line);
            }
        }
    }

    drop(commands);
    let _ = worker.join();
    0
}

fn print_options() {
    println!("option name Hash type spin default {DEFAULT_HASH_MB} min 1 max 2048");
    println!("option name ClearHash type button");
    println!("option name UCI_AnalyseMode type check default false");
    println!("option name Analyze type check default false");
    println!("option name MultiPV type spin default 1 min 1 max 64");
    println!("option name PieceLocation type check default true");
    println!("option name PassedPawns type check default true");
    println!("option name Mobility type check default true");
    println!("option name KingSafety type check default true");
    println!("option name NPS type spin default 0 min 0 max 100000000");
    println!("option name MoveError type spin default 0 min 0 max 1000");
    println!("option name BlunderError type spin default 0 min 0 max 5000");
    println!("option name BlunderPercent type spin default 0 min 0 max 100");
    println!("option name UCI_LimitStrength type check default false");
    println!("option name LimitStrength type check default false");
    println!("option name UCI_Elo type spin default 2400 min 600 max 2400");
    println!("option name ELO type spin default 2400 min 600 max 2400");
}

struct EngineState {
    game: Game,
    searcher: Searcher,
    debug: bool,
    limit_strength: bool,
    elo: i32,
}

fn engine_thread(inbox: Receiver<String>, stop_flag: Arc<AtomicBool>) {
    let mut searcher = Searcher::new(DEFAULT_HASH_MB);
    // The reader thread flips this exact flag on `stop`.
    searcher.continue_search = stop_flag;
    let mut state = EngineState {
        game: Game::new(),
        searcher,
        debug: false,
        limit_strength: false,
        elo: 2400,
    };

    for line in inbox {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first().copied().unwrap_or_default() {
            "quit" => break,
            "debug" => state.debug = tokens.get(1).copied() == Some("on"),
            "ucinewgame" => {
                state.game.reset();
                state.searcher.reset_heuristics();
            }
            "setoption" => handle_setoption(&mut state, &tokens),
            "position" => {
                if let Err(error) = handle_position(&mut state, &tokens) {
                    println!("info string error: {error}");
                }
            }
            "go" => handle_go(&mut state, &tokens),
            // Console conveniences, not part of the protocol.
            "d" | "display" => println!("{}", state.game.position),
            "perft" => {
                let depth = tokens.get(1).and_then(|t| t.parse().ok()).unwrap_or(1);
                let rows = perft_divide(&mut state.game, depth);
                let total: u64 = rows.iter().map(|(_, n)| n).sum();
                for (mv, nodes) in rows {
                    println!("{}: {nodes}", mv.to_lan());
                }
                println!("total: {total}");
            }
            "san" => {
                if let Some(text) = tokens.get(1) {
                    match parse_standard_algebraic(&mut state.game, text) {
                        Ok(mv) => println!("info string {text} = {}", mv.to_lan()),
                        Err(error) => println!("info string error: {error}"),
                    }
                }
            }
            _ => {
                if state.debug {
                    println!("info string unknown command: {line}");
                }
            }
        }
    }
}

/// `setoption name <N> [value <V>]`, name matched case-insensitively.
fn handle_setoption(state: &mut EngineState, tokens: &[&str]) {
    let mut name = String::new();
    let mut value = String::new();
    let mut into_value = false;
    for &token in &tokens[1..] {
        match token {
            "name" => into_value = false,
            "value" => into_value = true,
            other => {
                let buffer = if into_value { &mut value } else { &mut name };
                if !buffer.is_empty() {
                    buffer.push(' ');
                }
                buffer.push_str(other);
            }
        }
    }

    let as_bool = value.eq_ignore_ascii_case("true");
    let as_int: i64 = value.parse().unwrap_or(0);

    match name.to_ascii_lowercase().as_str() {
        "hash" => {
            let megabytes = as_int.clamp(1, 2048) as usize;
            state.searcher.cache.resize(megabytes);
            info!(megabytes, "cache resized");
        }
        "clearhash" => state.searcher.reset_heuristics(),
        "uci_analysemode" | "analyze" => state.searcher.analyze_mode = as_bool,
        "multipv" => state.searcher.multipv = as_int.clamp(1, 64) as usize,
        "piecelocation" => state.searcher.evaluator.config.piece_location = as_bool,
        "passedpawns" => state.searcher.evaluator.config.passed_pawns = as_bool,
        "mobility" => state.searcher.evaluator.config.mobility = as_bool,
        "kingsafety" => state.searcher.evaluator.config.king_safety = as_bool,
        "nps" => {
            state.searcher.strength.nps = if as_int > 0 { Some(as_int as u64) } else { None };
            state.searcher.strength.enabled = state.searcher.strength.nps.is_some()
                || state.searcher.strength.move_error > 0
                || state.limit_strength;
        }
        "moveerror" => {
            state.searcher.strength.move_error = as_int.clamp(0, 1000) as i32;
            state.searcher.strength.enabled = true;
        }
        "blundererror" => {
            state.searcher.strength.blunder_error = as_int.clamp(0, 5000) as i32;
            state.searcher.strength.enabled = true;
        }
        "blunderpercent" => {
            state.searcher.strength.blunder_percent = as_int.clamp(0, 100) as i32;
            state.searcher.strength.enabled = true;
        }
        "uci_limitstrength" | "limitstrength" => {
            state.limit_strength = as_bool;
            state.searcher.strength = if as_bool {
                StrengthLimits::from_elo(state.elo)
            } else {
                StrengthLimits::default()
            };
        }
        "uci_elo" | "elo" => {
            state.elo = as_int.clamp(600, 2400) as i32;
            if state.limit_strength {
                state.searcher.strength = StrengthLimits::from_elo(state.elo);
            }
        }
        other => {
            if state.debug {
                println!("info string unknown option: {other}");
            }
        }
    }
}

/// `position {startpos | fen <FEN>} [moves <m1> …]`
fn handle_position(
    state: &mut EngineState,
    tokens: &[&str],
) -> Result<(), crate::error::EngineError> {
    let plies_before = state.game.ply_count();

    let moves_at = tokens.iter().position(|&t| t == "moves");
    let setup_end = moves_at.unwrap_or(tokens.len());

    match tokens.get(1).copied() {
        Some("startpos") | None => state.game.reset(),
        Some("fen") => {
            let fen = tokens[2..setup_end].join(" ");
            state.game.set_fen(&fen)?;
        }
        Some(other) => {
            return Err(crate::error::EngineError::InvalidFen(format!(
                "expected startpos or fen, got {other}"
            )));
        }
    }

    if let Some(at) = moves_at {
        for lan in &tokens[at + 1..] {
            state.game.play_lan(lan)?;
        }
    }

    // Keep the killer table aligned with plies actually committed to the
    // game since the last setup.
    let plies_after = state.game.ply_count();
    if plies_after > plies_before {
        state.searcher.heuristics.killers.shift(plies_after - plies_before);
    }
    Ok(())
}

fn handle_go(state: &mut EngineState, tokens: &[&str]) {
    let mut limits = SearchLimits::default();
    let mut index = 1;
    while index < tokens.len() {
        let argument = tokens.get(index + 1).and_then(|t| t.parse::<u64>().ok());
        match tokens[index] {
            "depth" => limits.depth = argument.map(|v| v as usize),
            "nodes" => limits.nodes = argument,
            "mate" => limits.mate = argument.map(|v| v as i32),
            "movetime" => limits.movetime = argument,
            "wtime" => limits.wtime = argument,
            "btime" => limits.btime = argument,
            "winc" => limits.winc = argument.unwrap_or(0),
            "binc" => limits.binc = argument.unwrap_or(0),
            "movestogo" => limits.movestogo = argument,
            "infinite" => {
                limits.infinite = true;
                index += 1;
                continue;
            }
            _ => {
                index += 1;
                continue;
            }
        }
        index += 2;
    }

    let debug = state.debug;
    let best = {
        let mut print_report = |report: SearchReport| {
            let score_text = if score::is_checkmate(report.score) {
                format!("mate {}", score::mate_in(report.score))
            } else {
                format!("cp {}", report.score)
            };
            let pv_text: Vec<String> = report.pv.iter().map(|m| m.to_lan()).collect();
            let multipv_text = if report.multipv > 1 || debug {
                format!(" multipv {}", report.multipv)
            } else {
                String::new()
            };
            println!(
                "info depth {} seldepth {}{} score {} nodes {} nps {} time {} pv {}",
                report.depth,
                report.seldepth,
                multipv_text,
                score_text,
                report.nodes,
                report.nps,
                report.time_ms,
                pv_text.join(" ")
            );
        };
        state.searcher.find_best_move(&mut state.game, &limits, &mut print_report)
    };

    info!(bestmove = %best.to_lan(), "search finished");
    if best.is_null() {
        println!("bestmove 0000");
    } else {
        println!("bestmove {}", best.to_lan());
    }
}
