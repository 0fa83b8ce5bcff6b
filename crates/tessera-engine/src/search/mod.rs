//! Search algorithms and move ordering.

pub mod config;
pub mod control;
pub mod heuristics;
pub mod negamax;
pub mod ordering;
pub mod quiescence;
pub mod tt;

use tessera_core::{Color, FIFTY_MOVE_LIMIT, Move, MoveList, Position};
use tracing::debug;

use crate::eval::Evaluator;
use config::SearchConfig;
use control::{SearchControl, SearchLimits};
use heuristics::{HistoryTable, KillerTable};
use negamax::{
    Aborted, INF, MAX_PLY, PvTable, SearchContext, fifty_move_score, is_mate_score, mate_distance, mated_in,
    root_search,
};
use tt::TranspositionTable;

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move found at the highest completed depth.
    pub best_move: Move,
    /// Second move in the PV, the expected reply.
    pub ponder_move: Option<Move>,
    /// Full principal variation line.
    pub pv: Vec<Move>,
    /// Score from the side to move's point of view.
    pub score: i32,
    /// Total nodes visited during the search.
    pub nodes: u64,
    /// Depth of the last completed iteration; 0 if the root was decided
    /// without searching.
    pub depth: u8,
}

impl SearchResult {
    fn decided(best_move: Move, score: i32) -> Self {
        Self {
            best_move,
            ponder_move: None,
            pv: if best_move.is_null() { Vec::new() } else { vec![best_move] },
            score,
            nodes: 0,
            depth: 0,
        }
    }
}

/// Iterative-deepening searcher.
///
/// Owns the tables that survive between searches: the transposition table,
/// the history table (aged at the start of every search) and the killer
/// table (cleared at the start of every search).
pub struct Searcher {
    tt: TranspositionTable,
    history: HistoryTable,
    killers: KillerTable,
    config: SearchConfig,
}

impl Searcher {
    /// Create a searcher with a transposition table of `config.hash_mb`.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            tt: TranspositionTable::new(config.hash_mb),
            history: HistoryTable::new(),
            killers: KillerTable::new(),
            config,
        }
    }

    /// The transposition table, for occupancy reports.
    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    /// Forget everything learned by earlier searches.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.history = HistoryTable::new();
        self.killers.clear();
    }

    /// Run an iterative-deepening search of `pos`.
    ///
    /// Calls `on_iter(depth, score, nodes, pv)` after each completed
    /// iteration. An iteration cut short by `control` is discarded: the
    /// result always describes the last completed depth. When no iteration
    /// completes the first legal move is returned with depth 0.
    ///
    /// `pos` is restored to its original state before returning.
    pub fn think<P, E, F>(
        &mut self,
        pos: &mut P,
        evaluator: &E,
        limits: &SearchLimits,
        control: &SearchControl,
        mut on_iter: F,
    ) -> SearchResult
    where
        P: Position,
        E: Evaluator<P>,
        F: FnMut(u8, i32, u64, &[Move]),
    {
        self.tt.new_generation();
        self.history.age();
        self.killers.clear();

        let root_side = pos.side_to_move();
        let mut contempt = [0; Color::COUNT];
        contempt[root_side.index()] = -self.config.contempt;
        contempt[(!root_side).index()] = self.config.contempt;

        let in_check = pos.in_check();
        let Some(first_legal) = first_legal_move(pos, in_check) else {
            let score = if in_check { mated_in(0) } else { contempt[root_side.index()] };
            debug!(score, "no legal moves at the root");
            return SearchResult::decided(Move::NULL, score);
        };

        if pos.fifty_move_distance() >= FIFTY_MOVE_LIMIT {
            let score = fifty_move_score(pos, 0, in_check);
            debug!(score, "fifty-move rule reached at the root");
            return SearchResult::decided(first_legal, score);
        }

        let max_depth = limits.depth.unwrap_or(u8::MAX).clamp(1, (MAX_PLY - 1) as u8);

        let mut ctx = SearchContext {
            nodes: 0,
            seldepth: 0,
            poll_countdown: self.config.poll_interval,
            poll_interval: self.config.poll_interval,
            tt: &self.tt,
            history: &mut self.history,
            killers: &mut self.killers,
            pv: PvTable::new(),
            control,
            config: &self.config,
            evaluator,
            contempt,
        };

        // Results of the last completed iteration.
        let mut completed_move = first_legal;
        let mut completed_score = 0;
        let mut completed_depth: u8 = 0;
        let mut completed_pv: Vec<Move> = vec![first_legal];

        for depth in 1..=max_depth {
            if depth > 1 && control.should_stop_iterating(ctx.nodes) {
                break;
            }

            let score = match aspiration_search(pos, i32::from(depth), completed_score, &mut ctx) {
                Ok(score) => score,
                Err(Aborted) => {
                    debug!(depth, nodes = ctx.nodes, "iteration aborted");
                    break;
                }
            };

            let pv = ctx.pv.root_pv();
            debug_assert!(!pv.is_empty(), "completed iteration {depth} left no root move");
            if let Some(&best) = pv.first() {
                completed_move = best;
                completed_pv = pv.to_vec();
            }
            completed_score = score;
            completed_depth = depth;

            debug!(
                depth,
                score,
                nodes = ctx.nodes,
                seldepth = ctx.seldepth,
                best = %completed_move,
                "iteration complete"
            );
            on_iter(depth, score, ctx.nodes, &completed_pv);

            if mate_distance(score).is_some_and(|plies| plies <= i32::from(depth)) {
                break;
            }
        }

        SearchResult {
            best_move: completed_move,
            ponder_move: completed_pv.get(1).copied(),
            pv: completed_pv,
            score: completed_score,
            nodes: ctx.nodes,
            depth: completed_depth,
        }
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("tt", &self.tt)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

/// The first move in generation order that `make_move` accepts.
fn first_legal_move<P: Position>(pos: &mut P, in_check: bool) -> Option<Move> {
    let mut moves = MoveList::new();
    if in_check {
        pos.generate_legal_evasions(&mut moves);
    } else {
        pos.generate_pseudo_legal_moves(&mut moves);
    }
    moves.as_slice().iter().copied().find(|&mv| {
        let legal = pos.make_move(mv);
        if legal {
            pos.unmake_move(mv);
        }
        legal
    })
}

/// Root search with an aspiration window around `prev_score`.
///
/// Shallow iterations and mate scores get the full window. Otherwise the
/// failing side of the window is widened by doubling its half-width and
/// becomes unbounded once that passes sixteen times the initial width.
fn aspiration_search<P, E>(
    pos: &mut P,
    depth: i32,
    prev_score: i32,
    ctx: &mut SearchContext<'_, E>,
) -> Result<i32, Aborted>
where
    P: Position,
    E: Evaluator<P>,
{
    let config = ctx.config;
    if depth < i32::from(config.aspiration_min_depth) || is_mate_score(prev_score) {
        return root_search(pos, depth, -INF, INF, ctx);
    }

    let give_up = config.aspiration_window.saturating_mul(16);
    let mut alpha_delta = config.aspiration_window;
    let mut beta_delta = config.aspiration_window;
    let mut alpha = (prev_score - alpha_delta).max(-INF);
    let mut beta = (prev_score + beta_delta).min(INF);

    loop {
        let score = root_search(pos, depth, alpha, beta, ctx)?;
        if score <= alpha {
            alpha_delta = alpha_delta.saturating_mul(2);
            alpha = if alpha_delta > give_up { -INF } else { (prev_score - alpha_delta).max(-INF) };
            debug!(depth, score, alpha, beta, "aspiration fail low");
        } else if score >= beta {
            beta_delta = beta_delta.saturating_mul(2);
            beta = if beta_delta > give_up { INF } else { (prev_score + beta_delta).min(INF) };
            debug!(depth, score, alpha, beta, "aspiration fail high");
        } else {
            return Ok(score);
        }
    }
}
