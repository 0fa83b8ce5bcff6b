//! Static Exchange Evaluation (SEE).
//!
//! Plays out the capture sequence on a single square, each side always
//! recapturing with its least valuable attacker, and returns the material
//! balance for the side making the first move.

use chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_rook_moves, BitBoard,
};

use crate::board::{square_bitboard, to_chess_square, Board};
use crate::chess_move::Move;
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::Square;

/// Material values for SEE, indexed by `PieceKind::index()`.
pub const SEE_VALUE: [i32; PieceKind::COUNT] = [100, 320, 330, 500, 900, 20_000];

const ALL: BitBoard = BitBoard(u64::MAX);

/// Exchange value of a piece kind.
pub const fn see_value(kind: PieceKind) -> i32 {
    SEE_VALUE[kind.index()]
}

fn kind_bb(board: &Board, kind: PieceKind) -> u64 {
    board.pieces(Color::White, kind) | board.pieces(Color::Black, kind)
}

fn diagonal_sliders(board: &Board) -> u64 {
    kind_bb(board, PieceKind::Bishop) | kind_bb(board, PieceKind::Queen)
}

fn straight_sliders(board: &Board) -> u64 {
    kind_bb(board, PieceKind::Rook) | kind_bb(board, PieceKind::Queen)
}

/// Every piece of either color attacking `sq` given occupancy `occ`.
fn attackers_of(board: &Board, sq: Square, occ: u64) -> u64 {
    let target = to_chess_square(sq);
    let blockers = BitBoard(occ);

    let knights = get_knight_moves(target).0 & kind_bb(board, PieceKind::Knight);
    let kings = get_king_moves(target).0 & kind_bb(board, PieceKind::King);
    let straight = get_rook_moves(target, blockers).0 & straight_sliders(board);
    let diagonal = get_bishop_moves(target, blockers).0 & diagonal_sliders(board);
    let white_pawns =
        get_pawn_attacks(target, chess::Color::Black, ALL).0 & board.pieces(Color::White, PieceKind::Pawn);
    let black_pawns =
        get_pawn_attacks(target, chess::Color::White, ALL).0 & board.pieces(Color::Black, PieceKind::Pawn);

    knights | kings | straight | diagonal | white_pawns | black_pawns
}

/// Least valuable attacker in `attackers` belonging to `side`.
fn least_valuable_attacker(board: &Board, attackers: u64, side: Color) -> Option<(u64, PieceKind)> {
    PieceKind::ALL.into_iter().find_map(|kind| {
        let candidates = attackers & board.pieces(side, kind);
        (candidates != 0).then(|| (candidates & candidates.wrapping_neg(), kind))
    })
}

/// Full static exchange evaluation of `mv` from the mover's point of view.
///
/// A promotion is credited with the promoted piece and the attacker on the
/// target square is valued as the promoted piece from then on. En passant
/// removes the captured pawn from occupancy so X-rays through it are seen.
pub fn see(board: &Board, mv: Move) -> i32 {
    let src = mv.source();
    let dst = mv.dest();
    let us = board.side_to_move();

    let Some(attacker) = board.moving_piece(mv) else {
        return 0;
    };

    let mut occ = board.side(Color::White) | board.side(Color::Black);
    occ &= !square_bitboard(src).0;

    let victim_value = match board.piece_at(dst) {
        Some((_, kind)) => see_value(kind),
        None if board.is_capture(mv) => {
            // En passant: the captured pawn sits behind the target square.
            let captured = Square::from_index_masked(if us == Color::White {
                dst.index() as u16 - 8
            } else {
                dst.index() as u16 + 8
            });
            occ &= !square_bitboard(captured).0;
            see_value(PieceKind::Pawn)
        }
        None => 0,
    };

    let mut gain = [0i32; 32];
    let mut next_victim_value = see_value(attacker);
    gain[0] = victim_value;
    if let Some(promo) = mv.promotion() {
        let promoted = see_value(promo.to_piece_kind());
        gain[0] += promoted - see_value(PieceKind::Pawn);
        next_victim_value = promoted;
    }

    let mut depth = 0usize;
    let mut side = !us;
    let mut attackers = attackers_of(board, dst, occ) & occ;

    while let Some((from_bb, kind)) = least_valuable_attacker(board, attackers, side) {
        depth += 1;
        if depth >= gain.len() {
            break;
        }
        gain[depth] = next_victim_value - gain[depth - 1];
        next_victim_value = see_value(kind);

        occ &= !from_bb;
        let target = to_chess_square(dst);
        if matches!(kind, PieceKind::Pawn | PieceKind::Bishop | PieceKind::Queen) {
            attackers |= get_bishop_moves(target, BitBoard(occ)).0 & diagonal_sliders(board);
        }
        if matches!(kind, PieceKind::Rook | PieceKind::Queen) {
            attackers |= get_rook_moves(target, BitBoard(occ)).0 & straight_sliders(board);
        }
        attackers &= occ;
        side = !side;
    }

    if depth >= gain.len() {
        depth = gain.len() - 1;
    }
    while depth > 0 {
        depth -= 1;
        gain[depth] = -((-gain[depth]).max(gain[depth + 1]));
    }

    gain[0]
}
