//! Move ordering scores, the selection-sort move picker and the LMR table.

use std::sync::OnceLock;

use tessera_core::{MAX_MOVES, Move, MoveList, Position};

use crate::search::heuristics::{HistoryTable, KILLER_SLOTS, KillerTable};

/// Score of the transposition table move.
pub const HASH_MOVE_SCORE: i32 = 32_767;

/// Base score of captures and promotions that do not lose material.
pub const CAPTURE_MOVE_SCORE: i32 = 30_767;

/// Killer scores by rank (index 0 unused).
pub const KILLER_MOVE_SCORE: [i32; KILLER_SLOTS + 1] = [0, 28_767, 28_766, 28_765, 28_764];

/// Lowest ordering score that still marks a move as one worth searching in
/// full. Quiet moves ordered by history alone score in `0..LOWEST_KILLER_SCORE`.
pub const LOWEST_KILLER_SCORE: i32 = KILLER_MOVE_SCORE[KILLER_SLOTS];

/// Ordering score of `mv` in the main search.
///
/// Winning and equal captures and promotions come first, then killers by
/// rank, then quiet moves by history. Losing captures sort last with their
/// (negative) exchange value.
pub fn score_move<P: Position>(
    pos: &P,
    mv: Move,
    killers: &KillerTable,
    history: &HistoryTable,
    ply: usize,
) -> i32 {
    if !pos.is_quiet(mv) {
        let see = pos.see(mv);
        return if see >= 0 { CAPTURE_MOVE_SCORE + see } else { see };
    }

    let rank = killers.is_killer(ply, mv);
    if rank > 0 {
        return KILLER_MOVE_SCORE[rank];
    }

    pos.moving_piece(mv)
        .map_or(0, |piece| history.score(pos.side_to_move(), piece, mv.dest()))
}

/// Whether a move with ordering score `score` may be pruned or reduced.
pub fn is_non_critical(score: i32) -> bool {
    (0..LOWEST_KILLER_SCORE).contains(&score)
}

static LMR_TABLE: OnceLock<[i32; MAX_MOVES]> = OnceLock::new();

fn lmr_table() -> &'static [i32; MAX_MOVES] {
    LMR_TABLE.get_or_init(|| {
        let mut table = [0; MAX_MOVES];
        for (i, reduction) in table.iter_mut().enumerate() {
            *reduction = (((i + 1) as f64).ln().round() as i32).max(1);
        }
        table
    })
}

/// Late move reduction for the `late_index`-th move past the full-depth moves.
pub fn lmr_reduction(late_index: usize) -> i32 {
    lmr_table()[late_index.min(MAX_MOVES - 1)]
}

/// Yields moves in descending score order by selection sort.
///
/// Sorting is done lazily: a node that cuts off after the first move only
/// pays for one pass over the scores.
pub struct MovePicker {
    moves: [Move; MAX_MOVES],
    scores: [i32; MAX_MOVES],
    len: usize,
    cursor: usize,
}

impl MovePicker {
    fn with_scores(moves: &MoveList, mut score: impl FnMut(Move) -> i32) -> Self {
        let mut picker = Self {
            moves: [Move::NULL; MAX_MOVES],
            scores: [0; MAX_MOVES],
            len: moves.len(),
            cursor: 0,
        };
        for (i, &mv) in moves.as_slice().iter().enumerate() {
            picker.moves[i] = mv;
            picker.scores[i] = score(mv);
        }
        picker
    }

    /// Picker for the main search. `tt_move`, if present in the list, is
    /// yielded first.
    pub fn new<P: Position>(
        moves: &MoveList,
        pos: &P,
        tt_move: Move,
        killers: &KillerTable,
        history: &HistoryTable,
        ply: usize,
    ) -> Self {
        Self::with_scores(moves, |mv| {
            if !tt_move.is_null() && mv == tt_move {
                HASH_MOVE_SCORE
            } else {
                score_move(pos, mv, killers, history, ply)
            }
        })
    }

    /// Picker for quiescence captures, ordered by exchange value alone.
    pub fn new_quiescence<P: Position>(moves: &MoveList, pos: &P) -> Self {
        Self::with_scores(moves, |mv| pos.see(mv))
    }

    /// Number of moves in the picker.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the picker holds no moves at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The next best move and its ordering score.
    pub fn pick_next(&mut self) -> Option<(Move, i32)> {
        if self.cursor >= self.len {
            return None;
        }

        let mut best = self.cursor;
        for i in (self.cursor + 1)..self.len {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.cursor, best);
        self.scores.swap(self.cursor, best);

        let picked = (self.moves[self.cursor], self.scores[self.cursor]);
        self.cursor += 1;
        Some(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{Board, Color, PieceKind, Square};

    fn moves_of(board: &Board) -> MoveList {
        let mut moves = MoveList::new();
        board.generate_pseudo_legal_moves(&mut moves);
        moves
    }

    fn drain(picker: &mut MovePicker) -> Vec<(Move, i32)> {
        std::iter::from_fn(|| picker.pick_next()).collect()
    }

    #[test]
    fn lmr_reduction_grows_logarithmically() {
        assert_eq!(lmr_reduction(0), 1);
        assert_eq!(lmr_reduction(1), 1);
        assert_eq!(lmr_reduction(3), 1);
        assert_eq!(lmr_reduction(4), 2);
        assert_eq!(lmr_reduction(20), 3);
        assert_eq!(lmr_reduction(10_000), lmr_reduction(MAX_MOVES - 1));
    }

    #[test]
    fn picker_yields_every_move_in_descending_order() {
        let board = Board::starting_position();
        let moves = moves_of(&board);
        let mut history = HistoryTable::new();
        history.add_cutoff(Color::White, PieceKind::Knight, Square::F3, 6);
        let mut picker = MovePicker::new(&moves, &board, Move::NULL, &KillerTable::new(), &history, 0);

        let picked = drain(&mut picker);
        assert_eq!(picked.len(), 20);
        assert!(picked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(picked[0], (Move::new(Square::G1, Square::F3), 36));
        assert_eq!(picker.pick_next(), None);
    }

    #[test]
    fn ordering_bands() {
        // Qxe5 wins a pawn, Qxa7 loses the queen to the a8 rook, c2c3 is a killer.
        let board: Board = "r3k3/p7/8/4p3/3Q4/8/2P5/4K3 w - - 0 1".parse().unwrap();
        let moves = moves_of(&board);
        let tt_move = Move::new(Square::E1, Square::F1);
        let killer = Move::new(Square::C2, Square::C3);
        let mut killers = KillerTable::new();
        killers.insert(2, killer);

        let mut picker = MovePicker::new(&moves, &board, tt_move, &killers, &HistoryTable::new(), 2);
        let picked = drain(&mut picker);

        assert_eq!(picked[0], (tt_move, HASH_MOVE_SCORE));
        assert_eq!(picked[1], (Move::new(Square::D4, Square::E5), CAPTURE_MOVE_SCORE + 100));
        assert_eq!(picked[2], (killer, KILLER_MOVE_SCORE[1]));
        let last = picked[picked.len() - 1];
        assert_eq!(last.0, Move::new(Square::D4, Square::A7));
        assert!(last.1 < 0);
        assert!(!is_non_critical(last.1));
        assert!(is_non_critical(picked[3].1));
    }

    #[test]
    fn quiescence_picker_orders_by_exchange_value() {
        let board: Board = "r3k3/p7/8/4p3/3Q4/8/8/4K3 w - - 0 1".parse().unwrap();
        let mut captures = MoveList::new();
        board.generate_pseudo_legal_captures(&mut captures);
        let mut picker = MovePicker::new_quiescence(&captures, &board);
        assert_eq!(picker.len(), 2);
        let picked = drain(&mut picker);
        assert_eq!(picked[0], (Move::new(Square::D4, Square::E5), 100));
        assert_eq!(picked[1].0, Move::new(Square::D4, Square::A7));
    }

    #[test]
    fn empty_picker() {
        let mut picker = MovePicker::new_quiescence(&MoveList::new(), &Board::starting_position());
        assert!(picker.is_empty());
        assert!(picker.pick_next().is_none());
    }
}
