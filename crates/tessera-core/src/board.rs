//! Chess positions backed by the `chess` crate, with a reversible move stack.
//!
//! The `chess` crate supplies bitboard move generation and Zobrist hashing
//! but is copy-make only and does not track the halfmove clock. [`Board`]
//! adds an undo stack of snapshots, the fifty-move counter, null moves,
//! game phase and the query surface the search needs.

use chess::{BitBoard, ChessMove, MoveGen, ALL_SQUARES, EMPTY};

use crate::chess_move::{Move, PromotionPiece};
use crate::color::Color;
use crate::error::MoveError;
use crate::move_list::MoveList;
use crate::piece_kind::PieceKind;
use crate::position::{PHASE_ENDGAME, Position};
use crate::see;
use crate::square::Square;

/// Phase weight of each piece kind (pawns and kings do not count).
const PHASE_WEIGHT: [i32; PieceKind::COUNT] = [0, 1, 1, 2, 4, 0];

/// Sum of phase weights in the starting position.
const TOTAL_PHASE: i32 = 24;

/// State restored by an unmake.
#[derive(Clone, Copy)]
struct Snapshot {
    board: chess::Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

/// A chess position with make/unmake support.
#[derive(Clone)]
pub struct Board {
    current: chess::Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    undo: Vec<Snapshot>,
}

impl Board {
    /// Return the standard starting position.
    pub fn starting_position() -> Board {
        Board::from_parts(chess::Board::default(), 0, 1)
    }

    pub(crate) fn from_parts(current: chess::Board, halfmove_clock: u32, fullmove_number: u32) -> Board {
        Board {
            current,
            halfmove_clock,
            fullmove_number,
            undo: Vec::with_capacity(128),
        }
    }

    /// The underlying `chess` crate board.
    pub(crate) fn inner(&self) -> &chess::Board {
        &self.current
    }

    /// Halfmove clock for the fifty-move rule.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Fullmove number (starts at 1, incremented after Black moves).
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of moves currently on the undo stack.
    pub fn ply_from_root(&self) -> usize {
        self.undo.len()
    }

    /// Bitboard of `color`'s pieces of `kind`, as a raw `u64` in LERF order.
    pub fn pieces(&self, color: Color, kind: PieceKind) -> u64 {
        let kind_bb = *self.current.pieces(kind.into());
        let side_bb = *self.current.color_combined(color.into());
        (kind_bb & side_bb).0
    }

    /// Bitboard of every piece of `color`.
    pub fn side(&self, color: Color) -> u64 {
        self.current.color_combined(color.into()).0
    }

    /// The color and kind of the piece on `sq`, if any.
    pub fn piece_at(&self, sq: Square) -> Option<(Color, PieceKind)> {
        let square = to_chess_square(sq);
        let kind = self.current.piece_on(square)?;
        let color = self.current.color_on(square)?;
        Some((color.into(), kind.into()))
    }

    /// Square of `color`'s king.
    pub fn king_square(&self, color: Color) -> Square {
        from_chess_square(self.current.king_square(color.into()))
    }

    /// All legal moves in the position.
    pub fn legal_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        for mv in MoveGen::new_legal(&self.current) {
            moves.push(from_chess_move(mv));
        }
        moves
    }

    /// Parse a long-algebraic move and check that it is legal here.
    pub fn parse_move(&self, text: &str) -> Result<Move, MoveError> {
        let mv = Move::from_uci(text).ok_or_else(|| MoveError::Malformed {
            text: text.to_string(),
        })?;
        if !self.current.legal(to_chess_move(mv)) {
            return Err(MoveError::Illegal { uci: mv.to_uci() });
        }
        Ok(mv)
    }

    /// Whether the target square is occupied, or `mv` is an en passant capture.
    fn captures(&self, mv: Move) -> bool {
        let dest = to_chess_square(mv.dest());
        if self.current.piece_on(dest).is_some() {
            return true;
        }
        let source = to_chess_square(mv.source());
        self.current.piece_on(source) == Some(chess::Piece::Pawn) && mv.source().file() != mv.dest().file()
    }

    fn push_snapshot(&mut self) {
        self.undo.push(Snapshot {
            board: self.current,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        });
    }

    fn pop_snapshot(&mut self) {
        let snapshot = self.undo.pop();
        debug_assert!(snapshot.is_some(), "unmake without a matching make");
        if let Some(snapshot) = snapshot {
            self.current = snapshot.board;
            self.halfmove_clock = snapshot.halfmove_clock;
            self.fullmove_number = snapshot.fullmove_number;
        }
    }

    fn collect(&self, moves: &mut MoveList, filter: impl Fn(Move) -> bool) {
        for mv in MoveGen::new_legal(&self.current) {
            let mv = from_chess_move(mv);
            if filter(mv) {
                moves.push(mv);
            }
        }
    }
}

impl Position for Board {
    fn make_move(&mut self, mv: Move) -> bool {
        let chess_move = to_chess_move(mv);
        if mv.is_null() || !self.current.legal(chess_move) {
            return false;
        }

        let resets_clock = self.captures(mv) || self.moving_piece(mv) == Some(PieceKind::Pawn);
        let black_moved = self.current.side_to_move() == chess::Color::Black;

        self.push_snapshot();
        self.current = self.current.make_move_new(chess_move);
        self.halfmove_clock = if resets_clock { 0 } else { self.halfmove_clock + 1 };
        if black_moved {
            self.fullmove_number += 1;
        }
        true
    }

    fn unmake_move(&mut self, _mv: Move) {
        self.pop_snapshot();
    }

    fn make_null_move(&mut self) -> bool {
        let Some(passed) = self.current.null_move() else {
            return false;
        };
        self.push_snapshot();
        self.current = passed;
        self.halfmove_clock += 1;
        true
    }

    fn unmake_null_move(&mut self) {
        self.pop_snapshot();
    }

    fn in_check(&self) -> bool {
        *self.current.checkers() != EMPTY
    }

    fn hash_key(&self) -> u64 {
        self.current.get_hash()
    }

    fn side_to_move(&self) -> Color {
        self.current.side_to_move().into()
    }

    fn fifty_move_distance(&self) -> u32 {
        self.halfmove_clock
    }

    fn game_phase(&self) -> i32 {
        let material: i32 = PieceKind::ALL
            .iter()
            .map(|&kind| PHASE_WEIGHT[kind.index()] * self.current.pieces(kind.into()).popcnt() as i32)
            .sum();
        let remaining = material.min(TOTAL_PHASE);
        ((TOTAL_PHASE - remaining) * PHASE_ENDGAME + TOTAL_PHASE / 2) / TOTAL_PHASE
    }

    fn generate_pseudo_legal_moves(&self, moves: &mut MoveList) {
        self.collect(moves, |_| true);
    }

    fn generate_legal_evasions(&self, moves: &mut MoveList) {
        debug_assert!(self.in_check());
        self.collect(moves, |_| true);
    }

    fn generate_pseudo_legal_captures(&self, moves: &mut MoveList) {
        self.collect(moves, |mv| mv.is_promotion() || self.captures(mv));
    }

    fn see(&self, mv: Move) -> i32 {
        see::see(self, mv)
    }

    fn is_capture(&self, mv: Move) -> bool {
        self.captures(mv)
    }

    fn moving_piece(&self, mv: Move) -> Option<PieceKind> {
        self.current.piece_on(to_chess_square(mv.source())).map(PieceKind::from)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting_position()
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("fen", &self.to_string())
            .field("undo_depth", &self.undo.len())
            .finish()
    }
}

pub(crate) fn to_chess_square(sq: Square) -> chess::Square {
    ALL_SQUARES[sq.index()]
}

pub(crate) fn from_chess_square(sq: chess::Square) -> Square {
    Square::from_index_masked(sq.to_index() as u16)
}

pub(crate) fn square_bitboard(sq: Square) -> BitBoard {
    BitBoard::from_square(to_chess_square(sq))
}

fn to_chess_move(mv: Move) -> ChessMove {
    let promotion = mv.promotion().map(|p| p.to_piece_kind().into());
    ChessMove::new(to_chess_square(mv.source()), to_chess_square(mv.dest()), promotion)
}

fn from_chess_move(mv: ChessMove) -> Move {
    let source = from_chess_square(mv.get_source());
    let dest = from_chess_square(mv.get_dest());
    match mv.get_promotion().and_then(|p| PromotionPiece::from_piece_kind(p.into())) {
        Some(promo) => Move::new_promotion(source, dest, promo),
        None => Move::new(source, dest),
    }
}
