//! Principal variation search.
//!
//! Negamax alpha-beta with a null-window scout for every move after the
//! first, plus the usual selective steps: transposition cutoffs, reverse
//! futility, razoring, null move, internal iterative deepening, futility,
//! late move pruning and late move reductions.
//!
//! Every search function returns `Result<i32, Aborted>`. A frame that made a
//! move always unmakes it before propagating an abort with `?`, and nothing
//! is written to the transposition table on the abort path.

use tessera_core::{Color, FIFTY_MOVE_LIMIT, Move, MoveList, Position};

use crate::eval::{Evaluator, StaticEval};
use crate::search::config::SearchConfig;
use crate::search::control::SearchControl;
use crate::search::heuristics::{HistoryTable, KillerTable};
use crate::search::ordering::{MovePicker, is_non_critical, lmr_reduction};
use crate::search::quiescence::quiescence;
use crate::search::tt::{Bound, TranspositionTable};

/// Score representing an unreachable upper/lower bound.
pub const INF: i32 = 30_000;

/// Base score for checkmate (adjusted by ply for mate distance).
pub const MATE_SCORE: i32 = 29_000;

/// Scores above this threshold indicate a forced mate.
pub const MATE_THRESHOLD: i32 = 28_000;

/// Maximum search depth (in plies) for array sizing and recursion limits.
pub const MAX_PLY: usize = 128;

/// Nodes between two polls of the search control.
pub const NODES_BETWEEN_POLLS: u32 = 10_000;

/// Null-move budget handed to the children of a normal move.
const NULL_MOVE_BUDGET: u8 = 2;

/// Score for delivering mate `ply` plies from the root.
pub const fn mate_in(ply: usize) -> i32 {
    MATE_SCORE - ply as i32
}

/// Score for being mated `ply` plies from the root.
pub const fn mated_in(ply: usize) -> i32 {
    -MATE_SCORE + ply as i32
}

/// Whether `score` announces a forced mate for either side.
pub const fn is_mate_score(score: i32) -> bool {
    score.abs() > MATE_THRESHOLD
}

/// Plies to the mate announced by `score`, if any.
pub const fn mate_distance(score: i32) -> Option<i32> {
    if is_mate_score(score) { Some(MATE_SCORE - score.abs()) } else { None }
}

/// The search was cancelled before it could produce a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("search aborted")]
pub struct Aborted;

/// Whether a node lies on the principal variation.
///
/// PV nodes are searched with an open window; every other node is a
/// null-window scout. Both kinds share the same pruning predicates except
/// where a step is gated on `NonPv` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Pv,
    NonPv,
}

/// Triangular principal variation table.
///
/// Row `ply` holds the best line found from `ply` onwards.
pub struct PvTable {
    moves: Box<[[Move; MAX_PLY]; MAX_PLY]>,
    len: [usize; MAX_PLY],
}

impl PvTable {
    /// Create an empty PV table.
    pub fn new() -> Self {
        Self {
            moves: Box::new([[Move::NULL; MAX_PLY]; MAX_PLY]),
            len: [0; MAX_PLY],
        }
    }

    /// Forget the line at `ply` (on node entry).
    pub fn clear_ply(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.len[ply] = 0;
        }
    }

    /// Make `mv` followed by the child's line the line at `ply`.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let child = ply + 1;
        let tail = if child < MAX_PLY { self.len[child].min(MAX_PLY - child) } else { 0 };

        let (head, rest) = self.moves.split_at_mut(child);
        let row = &mut head[ply];
        row[0] = mv;
        if tail > 0 {
            row[1..=tail].copy_from_slice(&rest[0][..tail]);
        }
        self.len[ply] = 1 + tail;
    }

    /// The line from the root.
    pub fn root_pv(&self) -> &[Move] {
        &self.moves[0][..self.len[0]]
    }
}

impl Default for PvTable {
    fn default() -> Self {
        Self::new()
    }
}

/// State threaded through one `think` call.
pub(crate) struct SearchContext<'a, E> {
    pub nodes: u64,
    pub seldepth: usize,
    pub poll_countdown: u32,
    pub poll_interval: u32,
    pub tt: &'a TranspositionTable,
    pub history: &'a mut HistoryTable,
    pub killers: &'a mut KillerTable,
    pub pv: PvTable,
    pub control: &'a SearchControl,
    pub config: &'a SearchConfig,
    pub evaluator: &'a E,
    /// Draw score by side to move.
    pub contempt: [i32; Color::COUNT],
}

impl<'a, E> SearchContext<'a, E> {
    /// Count a node and poll the control every `poll_interval` nodes.
    pub fn visit(&mut self, ply: usize) -> Result<(), Aborted> {
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        self.poll_countdown = self.poll_countdown.saturating_sub(1);
        if self.poll_countdown == 0 {
            self.poll_countdown = self.poll_interval;
            if self.control.should_stop(self.nodes) {
                return Err(Aborted);
            }
        }
        Ok(())
    }

    pub fn evaluate<P>(&self, pos: &P) -> StaticEval
    where
        E: Evaluator<P>,
    {
        self.evaluator.evaluate(pos)
    }

    pub fn draw_score<P: Position>(&self, pos: &P) -> i32 {
        self.contempt[pos.side_to_move().index()]
    }
}

/// Whether the side to move has at least one legal reply to check.
fn has_legal_evasion<P: Position>(pos: &mut P) -> bool {
    let mut evasions = MoveList::new();
    pos.generate_legal_evasions(&mut evasions);
    evasions.as_slice().iter().any(|&mv| {
        let legal = pos.make_move(mv);
        if legal {
            pos.unmake_move(mv);
        }
        legal
    })
}

/// Score of a node whose fifty-move counter has run out: a draw, unless the
/// side to move is checkmated.
pub(crate) fn fifty_move_score<P: Position>(pos: &mut P, ply: usize, in_check: bool) -> i32 {
    if in_check && !has_legal_evasion(pos) { mated_in(ply) } else { 0 }
}

/// Recursive principal variation search.
///
/// Returns the score of `pos` from the side to move's point of view. At
/// `depth <= 0` the node is handed to quiescence search.
#[allow(clippy::too_many_arguments)]
pub(crate) fn search<P, E>(
    pos: &mut P,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    mut beta: i32,
    null_budget: u8,
    in_check: bool,
    kind: NodeKind,
    ctx: &mut SearchContext<'_, E>,
) -> Result<i32, Aborted>
where
    P: Position,
    E: Evaluator<P>,
{
    debug_assert!(alpha < beta, "empty window ({alpha}, {beta}) at ply {ply}");

    if depth <= 0 {
        return quiescence(pos, ply, alpha, beta, in_check, ctx);
    }

    ctx.visit(ply)?;
    ctx.pv.clear_ply(ply);

    if pos.fifty_move_distance() >= FIFTY_MOVE_LIMIT {
        return Ok(fifty_move_score(pos, ply, in_check));
    }

    if ply >= MAX_PLY - 1 {
        return Ok(ctx.evaluate(&*pos).score);
    }

    alpha = alpha.max(mated_in(ply));
    beta = beta.min(mate_in(ply + 1));
    if alpha >= beta {
        return Ok(alpha);
    }

    let hash = pos.hash_key();
    let mut tt_move = Move::NULL;
    if let Some(entry) = ctx.tt.probe(hash, ply) {
        tt_move = entry.best_move;
        if let Some(score) = entry.cutoff(depth, alpha, beta) {
            return Ok(score);
        }
    }

    let is_pv = kind == NodeKind::Pv;
    let static_eval = (!in_check).then(|| ctx.evaluate(&*pos));
    let config = ctx.config;

    if let Some(eval) = static_eval
        && !is_pv
    {
        if !eval.zugzwang_likely
            && let Some(margin) = config.reverse_futility_margin(depth)
            && eval.score - margin >= beta
        {
            return Ok(eval.score - margin);
        }

        if let Some(margin) = config.razoring_margin(depth)
            && eval.score + margin <= alpha
        {
            let razor_alpha = alpha - margin;
            let score = quiescence(pos, ply, razor_alpha, razor_alpha + 1, false, ctx)?;
            if score <= razor_alpha {
                return Ok(score);
            }
        }

        if config.enable_null_move && null_budget > 0 && !eval.zugzwang_likely && pos.make_null_move() {
            let reduced = depth - 1 - config.null_reduction;
            let result = search(pos, reduced, ply + 1, -beta, -beta + 1, null_budget - 1, false, NodeKind::NonPv, ctx);
            pos.unmake_null_move();
            let score = -result?;
            if score >= beta {
                let score = if is_mate_score(score) { beta } else { score };
                ctx.tt.store(hash, depth, score, Move::NULL, Bound::LowerBound, ply);
                return Ok(score);
            }
        }
    }

    if is_pv && tt_move.is_null() && depth > config.iid_min_depth {
        search(pos, depth - 2, ply, alpha, beta, 0, in_check, NodeKind::Pv, ctx)?;
        if let Some(entry) = ctx.tt.probe(hash, ply) {
            tt_move = entry.best_move;
        }
    }

    let mut moves = MoveList::new();
    if in_check {
        pos.generate_legal_evasions(&mut moves);
    } else {
        pos.generate_pseudo_legal_moves(&mut moves);
    }
    let single_reply = in_check && moves.len() == 1;
    let mut picker = MovePicker::new(&moves, &*pos, tt_move, ctx.killers, ctx.history, ply);

    let mut best_score = -INF;
    let mut best_move = Move::NULL;
    let mut bound = Bound::UpperBound;
    let mut searched = 0usize;
    let mut pruned = 0usize;
    let mut quiets_tried = MoveList::new();

    while let Some((mv, order_score)) = picker.pick_next() {
        if !pos.make_move(mv) {
            continue;
        }
        let gives_check = pos.in_check();
        let extension = i32::from(gives_check || single_reply);
        let new_depth = depth - 1 + extension;
        let non_critical = extension == 0 && is_non_critical(order_score);

        if non_critical && let Some(eval) = static_eval {
            let futile = config.futility_margin(depth).is_some_and(|margin| eval.score + margin <= alpha);
            let late = !is_pv && config.late_move_count(depth).is_some_and(|count| searched >= count);
            if futile || late {
                pos.unmake_move(mv);
                pruned += 1;
                continue;
            }
        }

        let result = if searched == 0 {
            search(pos, new_depth, ply + 1, -beta, -alpha, NULL_MOVE_BUDGET, gives_check, kind, ctx).map(|s| -s)
        } else {
            let late = LateMove {
                depth,
                new_depth,
                searched,
                gives_check,
                reducible: non_critical && !in_check,
            };
            search_late_move(pos, &late, ply, alpha, beta, ctx)
        };
        pos.unmake_move(mv);
        let score = result?;
        searched += 1;

        let quiet = pos.is_quiet(mv);
        if score >= beta {
            ctx.tt.store(hash, depth, score, mv, Bound::LowerBound, ply);
            if quiet {
                record_quiet_cutoff(&*pos, mv, quiets_tried.as_slice(), depth, ply, ctx);
            }
            return Ok(score);
        }
        if quiet {
            quiets_tried.push(mv);
        }

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                best_move = mv;
                bound = Bound::Exact;
                ctx.pv.update(ply, mv);
            }
        }
    }

    if searched == 0 {
        if pruned == 0 {
            return Ok(if in_check { mated_in(ply) } else { ctx.draw_score(&*pos) });
        }
        return Ok(static_eval.map_or(alpha, |eval| eval.score));
    }

    ctx.tt.store(hash, depth, best_score, best_move, bound, ply);
    Ok(best_score)
}

/// Search parameters of a move after the first one.
struct LateMove {
    depth: i32,
    new_depth: i32,
    searched: usize,
    gives_check: bool,
    reducible: bool,
}

/// Scout a late move with a null window, possibly reduced, and re-search
/// when it beats alpha. The move has already been made on `pos`.
fn search_late_move<P, E>(
    pos: &mut P,
    late: &LateMove,
    ply: usize,
    alpha: i32,
    beta: i32,
    ctx: &mut SearchContext<'_, E>,
) -> Result<i32, Aborted>
where
    P: Position,
    E: Evaluator<P>,
{
    let config = ctx.config;
    let reduction = if config.enable_lmr
        && late.reducible
        && late.depth >= config.lmr_min_depth
        && late.searched >= config.lmr_full_depth_moves
    {
        lmr_reduction(late.searched - config.lmr_full_depth_moves)
    } else {
        0
    };

    let mut score = scout(pos, late.new_depth - reduction, ply, alpha, late.gives_check, ctx)?;
    if reduction > 0 && score > alpha {
        score = scout(pos, late.new_depth, ply, alpha, late.gives_check, ctx)?;
    }
    if score > alpha && score < beta {
        score = -search(pos, late.new_depth, ply + 1, -beta, -alpha, NULL_MOVE_BUDGET, late.gives_check, NodeKind::Pv, ctx)?;
    }
    Ok(score)
}

/// Null-window search of the child reached by the move just made.
fn scout<P, E>(
    pos: &mut P,
    depth: i32,
    ply: usize,
    alpha: i32,
    gives_check: bool,
    ctx: &mut SearchContext<'_, E>,
) -> Result<i32, Aborted>
where
    P: Position,
    E: Evaluator<P>,
{
    let score = search(pos, depth, ply + 1, -alpha - 1, -alpha, NULL_MOVE_BUDGET, gives_check, NodeKind::NonPv, ctx)?;
    Ok(-score)
}

/// Killer and history bookkeeping after quiet move `mv` failed high.
///
/// `tried` holds the quiet moves searched before it at this node. Moves
/// that were illegal or pruned never reach it and keep their history.
fn record_quiet_cutoff<P, E>(
    pos: &P,
    mv: Move,
    tried: &[Move],
    depth: i32,
    ply: usize,
    ctx: &mut SearchContext<'_, E>,
) where
    P: Position,
{
    let side = pos.side_to_move();
    ctx.killers.insert(ply, mv);
    if let Some(piece) = pos.moving_piece(mv) {
        ctx.history.add_cutoff(side, piece, mv.dest(), depth);
    }
    for &earlier in tried {
        if let Some(piece) = pos.moving_piece(earlier) {
            ctx.history.add_not_cutoff(side, piece, earlier.dest(), depth);
        }
    }
}

/// Search the root position.
///
/// The same move loop as [`search`] without pruning: moves get the check
/// extension and late move reductions only. The root line is left in
/// `ctx.pv` whenever a move raises alpha, fail-high included, and a quiet
/// fail-high updates killers and history like any other node.
pub(crate) fn root_search<P, E>(
    pos: &mut P,
    depth: i32,
    mut alpha: i32,
    beta: i32,
    ctx: &mut SearchContext<'_, E>,
) -> Result<i32, Aborted>
where
    P: Position,
    E: Evaluator<P>,
{
    debug_assert!(alpha < beta);
    ctx.visit(0)?;
    ctx.pv.clear_ply(0);

    let in_check = pos.in_check();
    let hash = pos.hash_key();
    let tt_move = ctx.tt.probe(hash, 0).map_or(Move::NULL, |entry| entry.best_move);

    let mut moves = MoveList::new();
    if in_check {
        pos.generate_legal_evasions(&mut moves);
    } else {
        pos.generate_pseudo_legal_moves(&mut moves);
    }
    let mut picker = MovePicker::new(&moves, &*pos, tt_move, ctx.killers, ctx.history, 0);

    let mut best_score = -INF;
    let mut best_move = Move::NULL;
    let mut bound = Bound::UpperBound;
    let mut searched = 0usize;
    let mut quiets_tried = MoveList::new();

    while let Some((mv, order_score)) = picker.pick_next() {
        if !pos.make_move(mv) {
            continue;
        }
        let gives_check = pos.in_check();
        let extension = i32::from(gives_check);
        let new_depth = depth - 1 + extension;

        let result = if searched == 0 {
            search(pos, new_depth, 1, -beta, -alpha, NULL_MOVE_BUDGET, gives_check, NodeKind::Pv, ctx).map(|s| -s)
        } else {
            let late = LateMove {
                depth,
                new_depth,
                searched,
                gives_check,
                reducible: extension == 0 && !in_check && is_non_critical(order_score),
            };
            search_late_move(pos, &late, 0, alpha, beta, ctx)
        };
        pos.unmake_move(mv);
        let score = result?;
        searched += 1;

        let quiet = pos.is_quiet(mv);
        if score > best_score {
            best_score = score;
            if score > alpha {
                best_move = mv;
                ctx.pv.update(0, mv);
                if score >= beta {
                    ctx.tt.store(hash, depth, score, mv, Bound::LowerBound, 0);
                    if quiet {
                        record_quiet_cutoff(&*pos, mv, quiets_tried.as_slice(), depth, 0, ctx);
                    }
                    return Ok(score);
                }
                alpha = score;
                bound = Bound::Exact;
            }
        }
        if quiet {
            quiets_tried.push(mv);
        }
    }

    if searched == 0 {
        return Ok(if in_check { mated_in(0) } else { ctx.draw_score(&*pos) });
    }

    ctx.tt.store(hash, depth, best_score, best_move, bound, 0);
    Ok(best_score)
}
