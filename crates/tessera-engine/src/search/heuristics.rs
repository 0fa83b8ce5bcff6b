//! Killer move table and history heuristic for quiet move ordering.

use tessera_core::{Color, Move, PieceKind, Square};

use crate::search::negamax::MAX_PLY;

/// Number of killer slots kept per ply.
pub const KILLER_SLOTS: usize = 4;

/// Quiet moves that recently caused a beta cutoff, per ply, most recent first.
pub struct KillerTable {
    slots: [[Move; KILLER_SLOTS]; MAX_PLY],
}

impl KillerTable {
    /// Create an empty killer table.
    pub fn new() -> Self {
        Self {
            slots: [[Move::NULL; KILLER_SLOTS]; MAX_PLY],
        }
    }

    /// Record `mv` as the newest killer at `ply`.
    ///
    /// A move already present moves to the front; otherwise the oldest slot
    /// falls off the end.
    pub fn insert(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY || mv.is_null() {
            return;
        }
        let row = &mut self.slots[ply];
        let end = row.iter().position(|&k| k == mv).unwrap_or(KILLER_SLOTS - 1);
        row.copy_within(0..end, 1);
        row[0] = mv;
    }

    /// Rank of `mv` among the killers at `ply`: 1 for the newest, up to
    /// [`KILLER_SLOTS`], or 0 if it is not a killer.
    pub fn is_killer(&self, ply: usize, mv: Move) -> usize {
        if ply >= MAX_PLY || mv.is_null() {
            return 0;
        }
        self.slots[ply]
            .iter()
            .position(|&k| k == mv)
            .map_or(0, |slot| slot + 1)
    }

    /// Number of distinct killers stored at `ply`.
    pub fn len_at(&self, ply: usize) -> usize {
        self.slots
            .get(ply)
            .map_or(0, |row| row.iter().filter(|k| !k.is_null()).count())
    }

    /// Forget every killer.
    pub fn clear(&mut self) {
        self.slots = [[Move::NULL; KILLER_SLOTS]; MAX_PLY];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Ceiling for history scores. Kept below every killer ordering score.
pub const HISTORY_MAX: i32 = 16_384;

/// History heuristic, indexed by `[side][piece_kind][to_square]`.
///
/// Quiet moves that cause cutoffs gain `depth²`; quiet moves searched before
/// a cutoff lose `depth²`. Scores stay in `0..=HISTORY_MAX`.
pub struct HistoryTable {
    table: [[[i32; Square::COUNT]; PieceKind::COUNT]; Color::COUNT],
}

impl HistoryTable {
    /// Create a zeroed history table.
    pub fn new() -> Self {
        Self {
            table: [[[0; Square::COUNT]; PieceKind::COUNT]; Color::COUNT],
        }
    }

    /// Reward a quiet move that caused a beta cutoff.
    pub fn add_cutoff(&mut self, side: Color, piece: PieceKind, to: Square, depth: i32) {
        let entry = &mut self.table[side.index()][piece.index()][to.index()];
        *entry = (*entry + depth * depth).min(HISTORY_MAX);
    }

    /// Penalise a quiet move that was searched without causing the cutoff.
    pub fn add_not_cutoff(&mut self, side: Color, piece: PieceKind, to: Square, depth: i32) {
        let entry = &mut self.table[side.index()][piece.index()][to.index()];
        *entry = (*entry - depth * depth).max(0);
    }

    /// History score for a quiet move.
    pub fn score(&self, side: Color, piece: PieceKind, to: Square) -> i32 {
        self.table[side.index()][piece.index()][to.index()]
    }

    /// Halve every score. Called once per search.
    pub fn age(&mut self) {
        self.table
            .iter_mut()
            .flatten()
            .flatten()
            .for_each(|entry| *entry /= 2);
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quiet(from: Square, to: Square) -> Move {
        Move::new(from, to)
    }

    #[test]
    fn killer_insert_ranks_most_recent_first() {
        let mut kt = KillerTable::new();
        let a = quiet(Square::E2, Square::E4);
        let b = quiet(Square::D2, Square::D4);

        kt.insert(5, a);
        assert_eq!(kt.is_killer(5, a), 1);
        assert_eq!(kt.is_killer(5, b), 0);

        kt.insert(5, b);
        assert_eq!(kt.is_killer(5, b), 1);
        assert_eq!(kt.is_killer(5, a), 2);
    }

    #[test]
    fn killer_reinsert_moves_to_front_without_duplicating() {
        let mut kt = KillerTable::new();
        let moves = [
            quiet(Square::A2, Square::A3),
            quiet(Square::B2, Square::B3),
            quiet(Square::C2, Square::C3),
        ];
        for mv in moves {
            kt.insert(0, mv);
        }
        kt.insert(0, moves[0]);
        assert_eq!(kt.len_at(0), 3);
        assert_eq!(kt.is_killer(0, moves[0]), 1);
        assert_eq!(kt.is_killer(0, moves[2]), 2);
        assert_eq!(kt.is_killer(0, moves[1]), 3);
    }

    #[test]
    fn killer_oldest_falls_off() {
        let mut kt = KillerTable::new();
        let moves: Vec<Move> = Square::all()
            .skip(8)
            .take(KILLER_SLOTS + 1)
            .map(|sq| quiet(sq, Square::from_index(sq.index() as u8 + 8).unwrap()))
            .collect();
        for &mv in &moves {
            kt.insert(7, mv);
        }
        assert_eq!(kt.len_at(7), KILLER_SLOTS);
        assert_eq!(kt.is_killer(7, moves[0]), 0);
        assert_eq!(kt.is_killer(7, moves[KILLER_SLOTS]), 1);
    }

    #[test]
    fn killer_plies_independent_and_clear() {
        let mut kt = KillerTable::new();
        let mv = quiet(Square::G1, Square::F3);
        kt.insert(3, mv);
        assert_eq!(kt.is_killer(4, mv), 0);
        kt.clear();
        assert_eq!(kt.is_killer(3, mv), 0);
        kt.insert(MAX_PLY, mv);
        assert_eq!(kt.is_killer(MAX_PLY, mv), 0);
    }

    #[test]
    fn history_cutoff_and_not_cutoff() {
        let mut ht = HistoryTable::new();
        ht.add_cutoff(Color::White, PieceKind::Knight, Square::F3, 4);
        assert_eq!(ht.score(Color::White, PieceKind::Knight, Square::F3), 16);
        assert_eq!(ht.score(Color::Black, PieceKind::Knight, Square::F3), 0);

        ht.add_not_cutoff(Color::White, PieceKind::Knight, Square::F3, 3);
        assert_eq!(ht.score(Color::White, PieceKind::Knight, Square::F3), 7);

        ht.add_not_cutoff(Color::White, PieceKind::Knight, Square::F3, 10);
        assert_eq!(ht.score(Color::White, PieceKind::Knight, Square::F3), 0);
    }

    #[test]
    fn history_age_halves() {
        let mut ht = HistoryTable::new();
        ht.add_cutoff(Color::Black, PieceKind::Pawn, Square::E5, 5);
        ht.age();
        assert_eq!(ht.score(Color::Black, PieceKind::Pawn, Square::E5), 12);
    }

    proptest! {
        #[test]
        fn history_stays_within_bounds(
            updates in proptest::collection::vec((any::<bool>(), 0usize..6, 0u8..64, 1i32..64), 1..300)
        ) {
            let mut ht = HistoryTable::new();
            for (cutoff, piece, to, depth) in updates {
                let piece = PieceKind::ALL[piece];
                let to = Square::from_index(to).unwrap();
                if cutoff {
                    ht.add_cutoff(Color::White, piece, to, depth);
                } else {
                    ht.add_not_cutoff(Color::White, piece, to, depth);
                }
                let score = ht.score(Color::White, piece, to);
                prop_assert!((0..=HISTORY_MAX).contains(&score));
            }
        }

        #[test]
        fn killers_never_exceed_slots(
            inserts in proptest::collection::vec((0u8..64, 0u8..64), 1..100)
        ) {
            let mut kt = KillerTable::new();
            let mut last = Move::NULL;
            for (from, to) in inserts {
                let mv = Move::new(Square::from_index(from).unwrap(), Square::from_index(to).unwrap());
                kt.insert(1, mv);
                if !mv.is_null() {
                    last = mv;
                }
                prop_assert!(kt.len_at(1) <= KILLER_SLOTS);
            }
            if !last.is_null() {
                prop_assert_eq!(kt.is_killer(1, last), 1);
            }
        }
    }
}
