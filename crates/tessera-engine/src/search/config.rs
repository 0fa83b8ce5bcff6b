//! Tunable search parameters.

use crate::search::negamax::NODES_BETWEEN_POLLS;

/// Margins and switches for the selective parts of the search.
///
/// Margins are indexed by remaining depth; index 0 is unused by the
/// depth-gated techniques. The switches exist so the selective search can be
/// compared against a plain alpha-beta search of the same tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Transposition table size in megabytes.
    pub hash_mb: usize,
    /// Draw score from the root side's point of view, negated: a positive
    /// value makes the engine avoid draws.
    pub contempt: i32,
    /// Initial half-width of the aspiration window.
    pub aspiration_window: i32,
    /// First depth searched with an aspiration window.
    pub aspiration_min_depth: u8,
    /// Depth reduction of the null-move search, on top of the move itself.
    pub null_reduction: i32,
    /// Futility margins for depths `0..=4`.
    pub futility_margins: [i32; 5],
    /// Reverse futility margins for depths `0..=3`.
    pub reverse_futility_margins: [i32; 4],
    /// Razoring margins for depths `0..=3`.
    pub razoring_margins: [i32; 4],
    /// Searched-move counts after which late moves are pruned, depths `0..=4`.
    pub late_move_counts: [usize; 5],
    /// Moves searched at full depth before reductions start.
    pub lmr_full_depth_moves: usize,
    /// Minimum remaining depth for late move reductions.
    pub lmr_min_depth: i32,
    /// Minimum depth for internal iterative deepening (exclusive).
    pub iid_min_depth: i32,
    /// Delta pruning margin in quiescence search.
    pub delta_margin: i32,
    /// Nodes visited between two polls of the stop conditions.
    pub poll_interval: u32,
    /// Null-move pruning at non-PV nodes.
    pub enable_null_move: bool,
    /// Static null pruning against beta.
    pub enable_reverse_futility: bool,
    /// Quiescence-verified cuts far below alpha.
    pub enable_razoring: bool,
    /// Skipping quiet moves that cannot lift the eval to alpha.
    pub enable_futility: bool,
    /// Skipping quiet moves past a per-depth move count.
    pub enable_late_move_pruning: bool,
    /// Late move reductions.
    pub enable_lmr: bool,
}

impl SearchConfig {
    /// Configuration with every pruning and reduction disabled.
    ///
    /// Mate-distance pruning and transposition cutoffs stay on: neither
    /// changes the value of the search.
    pub fn full_width() -> Self {
        Self {
            enable_null_move: false,
            enable_reverse_futility: false,
            enable_razoring: false,
            enable_futility: false,
            enable_late_move_pruning: false,
            enable_lmr: false,
            ..Self::default()
        }
    }

    pub(crate) fn futility_margin(&self, depth: i32) -> Option<i32> {
        margin(&self.futility_margins, depth).filter(|_| self.enable_futility)
    }

    pub(crate) fn reverse_futility_margin(&self, depth: i32) -> Option<i32> {
        margin(&self.reverse_futility_margins, depth).filter(|_| self.enable_reverse_futility)
    }

    pub(crate) fn razoring_margin(&self, depth: i32) -> Option<i32> {
        margin(&self.razoring_margins, depth).filter(|_| self.enable_razoring)
    }

    pub(crate) fn late_move_count(&self, depth: i32) -> Option<usize> {
        if !self.enable_late_move_pruning || depth < 1 {
            return None;
        }
        self.late_move_counts.get(depth as usize).copied()
    }
}

fn margin(table: &[i32], depth: i32) -> Option<i32> {
    if depth < 1 {
        return None;
    }
    table.get(depth as usize).copied()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hash_mb: 16,
            contempt: 0,
            aspiration_window: 50,
            aspiration_min_depth: 4,
            null_reduction: 3,
            futility_margins: [50, 125, 125, 300, 300],
            reverse_futility_margins: [0, 260, 445, 900],
            razoring_margins: [0, 300, 300, 300],
            late_move_counts: [0, 4, 8, 16, 32],
            lmr_full_depth_moves: 4,
            lmr_min_depth: 3,
            iid_min_depth: 4,
            delta_margin: 50,
            poll_interval: NODES_BETWEEN_POLLS,
            enable_null_move: true,
            enable_reverse_futility: true,
            enable_razoring: true,
            enable_futility: true,
            enable_late_move_pruning: true,
            enable_lmr: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margins_are_depth_gated() {
        let config = SearchConfig::default();
        assert_eq!(config.futility_margin(0), None);
        assert_eq!(config.futility_margin(1), Some(125));
        assert_eq!(config.futility_margin(4), Some(300));
        assert_eq!(config.futility_margin(5), None);
        assert_eq!(config.reverse_futility_margin(2), Some(445));
        assert_eq!(config.reverse_futility_margin(4), None);
        assert_eq!(config.razoring_margin(3), Some(300));
        assert_eq!(config.late_move_count(4), Some(32));
        assert_eq!(config.late_move_count(5), None);
    }

    #[test]
    fn full_width_disables_selectivity() {
        let config = SearchConfig::full_width();
        assert_eq!(config.futility_margin(1), None);
        assert_eq!(config.reverse_futility_margin(1), None);
        assert_eq!(config.razoring_margin(1), None);
        assert_eq!(config.late_move_count(1), None);
        assert!(!config.enable_null_move);
        assert!(!config.enable_lmr);
        assert_eq!(config.aspiration_window, SearchConfig::default().aspiration_window);
    }
}
