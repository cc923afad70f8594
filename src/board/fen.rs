use crate::board::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Piece, Position};
use crate::error::EngineError;
use crate::square::Square;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// Load a position from Forsyth-Edwards Notation. The clock fields are
    /// optional; missing ones default to `0 1`.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), EngineError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(EngineError::InvalidFen(format!(
                "expected at least 4 fields, got {}",
                fields.len()
            )));
        }

        let mut position = Position::empty();

        // Field 1: piece placement, rank 8 first, the same order our
        // square indices run in.
        let mut sq = 0u8;
        let mut rows = 0;
        for row_text in fields[0].split('/') {
            let row_start = sq;
            for c in row_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) || sq as u32 + skip > 64 {
                        return Err(EngineError::InvalidFen(format!("bad skip `{c}`")));
                    }
                    sq += skip as u8;
                } else if let Some(piece) = Piece::from_char(c) {
                    if sq >= 64 {
                        return Err(EngineError::InvalidFen("too many squares".into()));
                    }
                    position.place(piece, Square::from_index(sq));
                    sq += 1;
                } else {
                    return Err(EngineError::InvalidFen(format!("bad piece char `{c}`")));
                }
            }
            if sq != row_start + 8 {
                return Err(EngineError::InvalidFen(format!(
                    "rank `{row_text}` does not span 8 files"
                )));
            }
            rows += 1;
        }
        if rows != 8 || sq != 64 {
            return Err(EngineError::InvalidFen("expected 8 ranks".into()));
        }

        // Field 2: side to move.
        position.white_move = match fields[1] {
            "w" => true,
            "b" => false,
            other => {
                return Err(EngineError::InvalidFen(format!("bad side to move `{other}`")));
            }
        };

        // Field 3: castling rights.
        if fields[2] != "-" {
            for c in fields[2].chars() {
                position.castling |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => {
                        return Err(EngineError::InvalidFen(format!(
                            "bad castling char `{other}`"
                        )));
                    }
                };
            }
        }

        // Field 4: en-passant target.
        position.en_passant = if fields[3] == "-" {
            Square::ILLEGAL
        } else {
            fields[3].parse::<Square>()?
        };

        // Fields 5 and 6: halfmove clock and fullmove number.
        if let Some(text) = fields.get(4) {
            position.halfmove_clock = text
                .parse()
                .map_err(|_| EngineError::InvalidFen(format!("bad halfmove clock `{text}`")))?;
        }
        if let Some(text) = fields.get(5) {
            position.fullmove_number = text
                .parse()
                .map_err(|_| EngineError::InvalidFen(format!("bad fullmove number `{text}`")))?;
        }

        position.validate()?;
        position.refresh_key();
        position.king_in_check = crate::moves::movegen::is_square_attacked(
            &position,
            position.king_square(position.white_move),
            !position.white_move,
        );
        crate::moves::movegen::find_pinned_pieces(&mut position);
        *self = position;
        Ok(())
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for row in 0..8u8 {
            let mut empty = 0;
            for file in 0..8u8 {
                let piece = self.piece_at(Square::from_index(row * 8 + file));
                if piece == Piece::None {
                    empty += 1;
                } else {
                    if empty > 0 {
                        fen.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    fen.push(piece.to_char());
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if row < 7 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.white_move { 'w' } else { 'b' });

        fen.push(' ');
        if self.castling == 0 {
            fen.push('-');
        } else {
            for (right, c) in [
                (CASTLE_WK, 'K'),
                (CASTLE_WQ, 'Q'),
                (CASTLE_BK, 'k'),
                (CASTLE_BQ, 'q'),
            ] {
                if self.castling & right != 0 {
                    fen.push(c);
                }
            }
        }

        fen.push(' ');
        if self.en_passant.is_illegal() {
            fen.push('-');
        } else {
            fen.push_str(&self.en_passant.to_string());
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}
