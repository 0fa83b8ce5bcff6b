//! Error types for FEN parsing and move parsing.

/// Errors that occur when parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// Fewer than the four mandatory FEN fields were supplied.
    #[error("expected at least 4 FEN fields, found {found}")]
    WrongFieldCount {
        /// Number of fields found.
        found: usize,
    },
    /// A move counter (halfmove clock or fullmove number) is not a valid number.
    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter {
        /// The field name ("halfmove clock" or "fullmove number").
        field: &'static str,
        /// The invalid string.
        found: String,
    },
    /// The placement, side, castling or en passant fields were rejected.
    #[error("invalid position: \"{fen}\"")]
    InvalidPosition {
        /// The FEN string that failed to parse.
        fen: String,
    },
}

/// Errors from turning text into a move on a given board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The text is not long algebraic notation.
    #[error("malformed move: {text}")]
    Malformed {
        /// The offending text.
        text: String,
    },
    /// The move is well-formed but not legal in the position.
    #[error("illegal move: {uci}")]
    Illegal {
        /// The move in UCI notation.
        uci: String,
    },
}

#[cfg(test)]
mod tests {
    use super::{FenError, MoveError};

    #[test]
    fn fen_error_display() {
        let err = FenError::WrongFieldCount { found: 2 };
        assert_eq!(format!("{err}"), "expected at least 4 FEN fields, found 2");
    }

    #[test]
    fn move_error_display() {
        let err = MoveError::Illegal { uci: "e2e5".to_string() };
        assert_eq!(format!("{err}"), "illegal move: e2e5");
    }
}
