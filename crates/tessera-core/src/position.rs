//! The position contract consumed by the search.
//!
//! The search never looks at how a position is stored. It only needs a
//! reversible make/unmake, a stable hash key, a handful of queries and three
//! move generators. [`Board`](crate::Board) implements this trait for chess;
//! tests implement it for synthetic game trees.

use crate::chess_move::Move;
use crate::color::Color;
use crate::move_list::MoveList;
use crate::piece_kind::PieceKind;

/// Game phase of a position with full opening material.
pub const PHASE_OPENING: i32 = 0;

/// Game phase of a bare king-and-pawn ending.
pub const PHASE_ENDGAME: i32 = 256;

/// Number of reversible halfmoves after which the fifty-move rule applies.
pub const FIFTY_MOVE_LIMIT: u32 = 100;

/// A mutable game position with reversible moves.
///
/// After any sequence of matched `make_*`/`unmake_*` calls the position and
/// its hash key are identical to the state before the sequence.
pub trait Position {
    /// Play `mv`. Returns `false`, leaving the position unchanged, if the
    /// move is illegal here.
    fn make_move(&mut self, mv: Move) -> bool;

    /// Undo the last successful [`make_move`](Self::make_move) of `mv`.
    fn unmake_move(&mut self, mv: Move);

    /// Pass the turn. Returns `false`, leaving the position unchanged, if
    /// passing is impossible (the side to move is in check).
    fn make_null_move(&mut self) -> bool;

    /// Undo the last successful [`make_null_move`](Self::make_null_move).
    fn unmake_null_move(&mut self);

    /// Whether the side to move is in check.
    fn in_check(&self) -> bool;

    /// 64-bit key identifying the position (pieces, side, castling, en passant).
    fn hash_key(&self) -> u64;

    /// The side to move.
    fn side_to_move(&self) -> Color;

    /// Reversible halfmoves since the last capture or pawn move.
    fn fifty_move_distance(&self) -> u32;

    /// Interpolation factor between opening ([`PHASE_OPENING`]) and endgame
    /// ([`PHASE_ENDGAME`]).
    fn game_phase(&self) -> i32;

    /// Append every pseudo-legal move to `moves`.
    ///
    /// Legality may be checked lazily by [`make_move`](Self::make_move).
    fn generate_pseudo_legal_moves(&self, moves: &mut MoveList);

    /// Append every legal reply to check. Only called when in check.
    fn generate_legal_evasions(&self, moves: &mut MoveList);

    /// Append pseudo-legal captures and promotions.
    fn generate_pseudo_legal_captures(&self, moves: &mut MoveList);

    /// Static exchange evaluation of `mv` from the mover's point of view.
    fn see(&self, mv: Move) -> i32;

    /// Whether `mv` captures a piece (en passant included).
    fn is_capture(&self, mv: Move) -> bool;

    /// The kind of piece standing on the move's source square.
    fn moving_piece(&self, mv: Move) -> Option<PieceKind>;

    /// A move that neither captures nor promotes.
    fn is_quiet(&self, mv: Move) -> bool {
        !mv.is_promotion() && !self.is_capture(mv)
    }
}
