use crate::error::EngineError;
use crate::game::Game;
use crate::moves::types::Move;
use crate::square::Square;

/// Parse a move in standard algebraic notation against the current
/// position, disambiguating with a freshly generated legal move list.
pub fn parse_standard_algebraic(game: &mut Game, san: &str) -> Result<Move, EngineError> {
    let err = || EngineError::IllegalMove(san.to_string());
    let clean: String =
        san.chars().filter(|c| !matches!(c, '+' | '#' | 'x' | '=' | '!' | '?')).collect();
    if clean.is_empty() {
        return Err(err());
    }

    let legal = game.legal_moves();

    // Castling first; letter O and digit 0 both appear in the wild.
    let castle = clean.replace('0', "O");
    if castle == "O-O" || castle == "O-O-O" {
        let kingside = castle == "O-O";
        return legal
            .into_iter()
            .find(|m| m.is_castling() && (m.to().file() > m.from().file()) == kingside)
            .ok_or_else(err);
    }

    let mut rest: Vec<char> = clean.chars().collect();

    // Trailing promotion piece letter, as in `e8Q` (the `=` is stripped).
    let promoted_kind = match rest.last() {
        Some('Q') => Some(4usize),
        Some('R') => Some(3),
        Some('B') if rest.len() > 2 => Some(2),
        Some('N') => Some(1),
        _ => None,
    };
    if promoted_kind.is_some() {
        rest.pop();
    }

    if rest.len() < 2 {
        return Err(err());
    }
    let target: String = rest[rest.len() - 2..].iter().collect();
    let to = target.parse::<Square>().map_err(|_| err())?;
    rest.truncate(rest.len() - 2);

    // Leading capital names the piece; its absence means a pawn move.
    let piece_kind = match rest.first() {
        Some('N') => 1usize,
        Some('B') => 2,
        Some('R') => 3,
        Some('Q') => 4,
        Some('K') => 5,
        _ => 0,
    };
    if piece_kind != 0 {
        rest.remove(0);
    }

    // Whatever remains disambiguates the origin: a file, a rank, or both.
    let mut from_file: Option<u8> = None;
    let mut from_rank: Option<u8> = None;
    for c in rest {
        match c {
            'a'..='h' => from_file = Some(c as u8 - b'a'),
            '1'..='8' => from_rank = Some(c as u8 - b'0'),
            _ => return Err(err()),
        }
    }

    let position = &game.position;
    let matched: Vec<Move> = legal
        .into_iter()
        .filter(|m| {
            if m.to() != to || m.is_castling() {
                return false;
            }
            if position.piece_at(m.from()).kind() != piece_kind {
                return false;
            }
            let promotion_ok = match promoted_kind {
                Some(kind) => m.is_promotion() && m.promoted().kind() == kind,
                None => !m.is_promotion(),
            };
            promotion_ok
                && from_file.is_none_or(|f| m.from().file() == f)
                && from_rank.is_none_or(|r| m.from().rank() == r)
        })
        .collect();

    match matched.as_slice() {
        [only] => Ok(*only),
        _ => Err(err()),
    }
}
