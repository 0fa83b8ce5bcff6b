//! Material balance and material-only endgame knowledge.

use tessera_core::{Board, Color, PieceKind};

use crate::eval::score::{S, Score};

/// Material values indexed by [`PieceKind::index()`].
pub const MATERIAL_VALUE: [Score; PieceKind::COUNT] = [
    S(100, 120),
    S(320, 310),
    S(330, 320),
    S(500, 520),
    S(900, 950),
    S(0, 0),
];

/// Bonus for owning two or more bishops.
pub const BISHOP_PAIR_BONUS: Score = S(40, 60);

fn count(board: &Board, color: Color, kind: PieceKind) -> i32 {
    board.pieces(color, kind).count_ones() as i32
}

/// Material balance from White's point of view, bishop pair included.
pub fn material(board: &Board) -> Score {
    let mut score = Score::ZERO;
    for kind in PieceKind::ALL {
        let diff = count(board, Color::White, kind) - count(board, Color::Black, kind);
        score += MATERIAL_VALUE[kind.index()] * diff;
    }
    if count(board, Color::White, PieceKind::Bishop) >= 2 {
        score += BISHOP_PAIR_BONUS;
    }
    if count(board, Color::Black, PieceKind::Bishop) >= 2 {
        score -= BISHOP_PAIR_BONUS;
    }
    score
}

/// Whether `color` has any knight, bishop, rook or queen.
pub fn has_non_pawn_material(board: &Board, color: Color) -> bool {
    [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen]
        .into_iter()
        .any(|kind| board.pieces(color, kind) != 0)
}

/// Endings neither side can win by force: no pawns, rooks or queens, and at
/// most one minor piece per side.
pub fn is_known_draw(board: &Board) -> bool {
    Color::ALL.into_iter().all(|color| {
        let heavy = count(board, color, PieceKind::Pawn)
            + count(board, color, PieceKind::Rook)
            + count(board, color, PieceKind::Queen);
        let minors = count(board, color, PieceKind::Knight) + count(board, color, PieceKind::Bishop);
        heavy == 0 && minors <= 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    #[test]
    fn starting_position_is_balanced() {
        assert_eq!(material(&Board::starting_position()), Score::ZERO);
    }

    #[test]
    fn extra_rook_and_bishop_pair() {
        let score = material(&board("4k3/8/8/8/8/8/8/R1B1KB2 w - - 0 1"));
        let expected = MATERIAL_VALUE[PieceKind::Rook.index()]
            + MATERIAL_VALUE[PieceKind::Bishop.index()] * 2
            + BISHOP_PAIR_BONUS;
        assert_eq!(score, expected);
    }

    #[test]
    fn non_pawn_material() {
        let kp = board("4k3/4p3/8/8/8/8/4P3/4K1N1 w - - 0 1");
        assert!(has_non_pawn_material(&kp, Color::White));
        assert!(!has_non_pawn_material(&kp, Color::Black));
    }

    #[test]
    fn known_draws() {
        assert!(is_known_draw(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
        assert!(is_known_draw(&board("4k3/8/8/8/8/8/8/4KN2 w - - 0 1")));
        assert!(is_known_draw(&board("4kb2/8/8/8/8/8/8/4KN2 w - - 0 1")));
        assert!(!is_known_draw(&board("4k3/8/8/8/8/8/8/3BKB2 w - - 0 1")));
        assert!(!is_known_draw(&board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")));
    }
}
