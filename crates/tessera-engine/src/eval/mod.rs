//! Static evaluation.
//!
//! The search only sees the [`Evaluator`] trait. [`Hce`] is the built-in
//! hand-crafted evaluator for [`Board`]: tapered material and piece-square
//! tables, a bishop pair bonus and a few material-only endgame rules.

pub mod material;
pub mod pst;
pub mod score;

use tessera_core::{Board, Color, PieceKind, Position, Square};

use material::{has_non_pawn_material, is_known_draw, material};
use pst::pst_value;
use score::Score;

/// Result of a static evaluation, from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticEval {
    pub score: i32,
    /// Set when being on move is likely a disadvantage, which makes null
    /// move based pruning unsound.
    pub zugzwang_likely: bool,
}

/// A deterministic static evaluator for positions of type `P`.
pub trait Evaluator<P> {
    /// Score `pos` for the side to move.
    fn evaluate(&self, pos: &P) -> StaticEval;
}

/// Hand-crafted evaluation for chess positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hce;

impl Hce {
    /// Piece-square total from White's point of view.
    fn placement(board: &Board) -> Score {
        let mut score = Score::ZERO;
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                let mut bb = board.pieces(color, kind);
                while bb != 0 {
                    let sq = Square::from_index(bb.trailing_zeros() as u8);
                    bb &= bb - 1;
                    let Some(sq) = sq else { continue };
                    match color {
                        Color::White => score += pst_value(color, kind, sq),
                        Color::Black => score -= pst_value(color, kind, sq),
                    }
                }
            }
        }
        score
    }

    /// White-relative centipawn score.
    pub fn white_score(board: &Board) -> i32 {
        if is_known_draw(board) {
            return 0;
        }
        (material(board) + Self::placement(board)).taper(board.game_phase())
    }
}

impl Evaluator<Board> for Hce {
    fn evaluate(&self, board: &Board) -> StaticEval {
        let us = board.side_to_move();
        let white = Self::white_score(board);
        StaticEval {
            score: if us == Color::White { white } else { -white },
            zugzwang_likely: !has_non_pawn_material(board, us),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(fen: &str) -> StaticEval {
        Hce.evaluate(&fen.parse::<Board>().unwrap())
    }

    #[test]
    fn starting_position_is_level() {
        let result = Hce.evaluate(&Board::starting_position());
        assert_eq!(result.score, 0);
        assert!(!result.zugzwang_likely);
    }

    #[test]
    fn score_is_side_to_move_relative() {
        let white = eval("4k3/8/8/8/8/8/8/3QK3 w - - 0 1");
        let black = eval("4k3/8/8/8/8/8/8/3QK3 b - - 0 1");
        assert!(white.score > 800);
        assert_eq!(white.score, -black.score);
    }

    #[test]
    fn mirrored_positions_mirror_scores() {
        let white = eval("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 1");
        let black = eval("rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 0 1");
        assert_eq!(white.score, black.score);
    }

    #[test]
    fn insufficient_material_is_a_draw() {
        assert_eq!(eval("4k3/8/8/8/8/8/8/4KB2 w - - 0 1").score, 0);
    }

    #[test]
    fn zugzwang_flag_follows_side_to_move() {
        let fen_white = "4k3/4p3/8/8/8/8/4P3/4KN2 w - - 0 1";
        let fen_black = "4k3/4p3/8/8/8/8/4P3/4KN2 b - - 0 1";
        assert!(!eval(fen_white).zugzwang_likely);
        assert!(eval(fen_black).zugzwang_likely);
    }
}
