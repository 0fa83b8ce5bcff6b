//! Quiescence search: resolve captures before trusting a static score.

use tessera_core::{Move, MoveList, Position};

use crate::eval::Evaluator;
use crate::search::negamax::{Aborted, MAX_PLY, SearchContext, mated_in};
use crate::search::ordering::MovePicker;

/// Search only captures and promotions (all evasions when in check) until
/// the position is quiet.
///
/// Out of check the side to move may stand pat on the static evaluation.
/// Captures are tried in descending exchange order; the loop stops at the
/// first losing capture or the first one that cannot lift the score to
/// alpha even with the delta margin. Fail-soft: the returned score may lie
/// outside `(alpha, beta)`.
pub(crate) fn quiescence<P, E>(
    pos: &mut P,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    in_check: bool,
    ctx: &mut SearchContext<'_, E>,
) -> Result<i32, Aborted>
where
    P: Position,
    E: Evaluator<P>,
{
    debug_assert!(alpha < beta, "empty window ({alpha}, {beta}) at ply {ply}");
    ctx.visit(ply)?;
    ctx.pv.clear_ply(ply);

    if ply >= MAX_PLY - 1 {
        return Ok(ctx.evaluate(&*pos).score);
    }

    let mut moves = MoveList::new();
    let mut best;
    let mut picker;
    let mut delta_base = None;

    if in_check {
        best = mated_in(ply);
        if best >= beta {
            return Ok(best);
        }
        alpha = alpha.max(best);
        pos.generate_legal_evasions(&mut moves);
        picker = MovePicker::new(&moves, &*pos, Move::NULL, ctx.killers, ctx.history, ply);
    } else {
        let stand_pat = ctx.evaluate(&*pos).score;
        if stand_pat >= beta {
            return Ok(stand_pat);
        }
        best = stand_pat;
        alpha = alpha.max(stand_pat);
        delta_base = Some(stand_pat + ctx.config.delta_margin);
        pos.generate_pseudo_legal_captures(&mut moves);
        picker = MovePicker::new_quiescence(&moves, &*pos);
    }

    while let Some((mv, order_score)) = picker.pick_next() {
        if let Some(delta) = delta_base
            && (order_score < 0 || delta + order_score < alpha)
        {
            break;
        }
        if !pos.make_move(mv) {
            continue;
        }
        let gives_check = pos.in_check();
        let result = quiescence(pos, ply + 1, -beta, -alpha, gives_check, ctx);
        pos.unmake_move(mv);
        let score = -result?;

        if score > best {
            best = score;
            if score > alpha {
                if score >= beta {
                    return Ok(score);
                }
                alpha = score;
            }
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use tessera_core::{Board, Color};

    use super::*;
    use crate::eval::Hce;
    use crate::search::config::SearchConfig;
    use crate::search::control::SearchControl;
    use crate::search::heuristics::{HistoryTable, KillerTable};
    use crate::search::negamax::{INF, NODES_BETWEEN_POLLS, PvTable};
    use crate::search::tt::TranspositionTable;

    fn qsearch(fen: &str, alpha: i32, beta: i32) -> i32 {
        let mut board: Board = fen.parse().unwrap();
        let tt = TranspositionTable::new(1);
        let mut history = HistoryTable::new();
        let mut killers = KillerTable::new();
        let control = SearchControl::new_infinite(Arc::new(AtomicBool::new(false)));
        let config = SearchConfig::default();
        let mut ctx = SearchContext {
            nodes: 0,
            seldepth: 0,
            poll_countdown: NODES_BETWEEN_POLLS,
            poll_interval: NODES_BETWEEN_POLLS,
            tt: &tt,
            history: &mut history,
            killers: &mut killers,
            pv: PvTable::new(),
            control: &control,
            config: &config,
            evaluator: &Hce,
            contempt: [0; Color::COUNT],
        };
        let in_check = board.in_check();
        let score = quiescence(&mut board, 0, alpha, beta, in_check, &mut ctx).unwrap();
        assert_eq!(board.to_string(), fen.parse::<Board>().unwrap().to_string());
        score
    }

    fn static_eval(fen: &str) -> i32 {
        Hce.evaluate(&fen.parse::<Board>().unwrap()).score
    }

    #[test]
    fn quiet_position_returns_static_eval() {
        let fen = "4k3/pppp4/8/8/8/8/PPPP4/4K3 w - - 0 1";
        assert_eq!(qsearch(fen, -INF, INF), static_eval(fen));
        // Fail-soft: the stand pat is returned even outside the window.
        let eval = static_eval(fen);
        assert_eq!(qsearch(fen, eval + 10, eval + 20), eval);
    }

    #[test]
    fn stand_pat_cuts_above_beta() {
        let fen = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1";
        assert_eq!(qsearch(fen, -INF, 0), static_eval(fen));
    }

    #[test]
    fn winning_capture_is_taken() {
        // Rxd8+ Kxd8 trades the rook for the queen and leaves bare kings.
        let fen = "3qk3/8/8/8/8/8/8/3RK3 w - - 0 1";
        assert!(static_eval(fen) < -300);
        assert_eq!(qsearch(fen, -INF, INF), 0);
    }

    #[test]
    fn losing_capture_is_not_tried() {
        // Qxa7 loses the queen to the rook; standing pat is better.
        let fen = "r3k3/p7/8/8/8/8/8/Q3K3 w - - 0 1";
        assert_eq!(qsearch(fen, -INF, INF), static_eval(fen));
    }

    #[test]
    fn checkmated_in_quiescence() {
        let fen = "7k/6Q1/5K2/8/8/8/8/8 b - - 0 1";
        assert_eq!(qsearch(fen, -INF, INF), mated_in(0));
    }
}
