//! FEN string parsing and serialization for [`Board`].

use std::fmt;
use std::str::FromStr;

use crate::board::Board;
use crate::error::FenError;

/// The FEN string for the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl FromStr for Board {
    type Err = FenError;

    /// Parse a FEN string. The halfmove clock and fullmove number are
    /// optional and default to `0` and `1`.
    fn from_str(fen: &str) -> Result<Board, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::WrongFieldCount {
                found: fields.len(),
            });
        }

        let halfmove_clock = parse_counter(fields.get(4), "halfmove clock", 0)?;
        let fullmove_number = parse_counter(fields.get(5), "fullmove number", 1)?.max(1);

        let placement = fields[..4].join(" ");
        let current = chess::Board::from_str(&placement).map_err(|_| FenError::InvalidPosition {
            fen: fen.to_string(),
        })?;

        tracing::trace!(fen, "parsed position");
        Ok(Board::from_parts(current, halfmove_clock, fullmove_number))
    }
}

fn parse_counter(field: Option<&&str>, name: &'static str, default: u32) -> Result<u32, FenError> {
    match field {
        None => Ok(default),
        Some(text) => text.parse().map_err(|_| FenError::InvalidMoveCounter {
            field: name,
            found: text.to_string(),
        }),
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The backing board prints placeholder clocks; keep its first four fields.
        let rendered = self.inner().to_string();
        let mut fields = rendered.split_whitespace().take(4);
        if let Some(first) = fields.next() {
            write!(f, "{first}")?;
        }
        for field in fields {
            write!(f, " {field}")?;
        }
        write!(f, " {} {}", self.halfmove_clock(), self.fullmove_number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn roundtrip(fen: &str) {
        let board: Board = fen.parse().unwrap();
        assert_eq!(board.to_string(), fen);
    }

    #[test]
    fn roundtrip_starting() {
        roundtrip(STARTING_FEN);
    }

    #[test]
    fn roundtrip_kiwipete() {
        roundtrip("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    }

    #[test]
    fn roundtrip_endgame_with_clocks() {
        roundtrip("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 17 43");
    }

    #[test]
    fn roundtrip_black_to_move() {
        roundtrip("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
    }

    #[test]
    fn starting_position_matches_fen() {
        let parsed: Board = STARTING_FEN.parse().unwrap();
        assert_eq!(parsed.hash_key(), Board::starting_position().hash_key());
    }

    #[test]
    fn clocks_default_when_missing() {
        let board: Board = "4k3/8/8/8/8/8/8/4K3 w - -".parse().unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
    }

    #[test]
    fn error_wrong_field_count() {
        let result = "rnbqkbnr/pppppppp w".parse::<Board>();
        assert_eq!(result.unwrap_err(), FenError::WrongFieldCount { found: 2 });
    }

    #[test]
    fn error_invalid_move_counter() {
        let result = "4k3/8/8/8/8/8/8/4K3 w - - x 1".parse::<Board>();
        assert!(matches!(
            result,
            Err(FenError::InvalidMoveCounter { field: "halfmove clock", .. })
        ));
    }

    #[test]
    fn error_invalid_position() {
        let result = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1".parse::<Board>();
        assert!(matches!(result, Err(FenError::InvalidPosition { .. })));
    }
}
