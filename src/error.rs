use thiserror::Error;

/// Engine-surface errors. Search never produces these; bad cached moves are
/// discarded silently and interruption is a score sentinel, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("corrupt position: {0}")]
    CorruptPosition(String),
}
