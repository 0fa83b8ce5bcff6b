use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tessera_core::{Board, Position, STARTING_FEN};
use tessera_engine::{Hce, SearchConfig, SearchLimits, Searcher, mate_distance};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tessera", version, about = "Alpha-beta game tree search")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search a position and print the best move.
    Think {
        /// Position to search, in FEN.
        #[arg(long, default_value = STARTING_FEN)]
        fen: String,
        /// Moves to play from the FEN before searching, in long algebraic form.
        #[arg(long, num_args = 1..)]
        moves: Vec<String>,
        /// Deepest iteration to run.
        #[arg(long)]
        depth: Option<u8>,
        /// Time budget in milliseconds.
        #[arg(long)]
        movetime: Option<u64>,
        /// Node budget.
        #[arg(long)]
        nodes: Option<u64>,
        /// Transposition table size in megabytes.
        #[arg(long, default_value_t = 16)]
        hash: usize,
        /// Draw aversion in centipawns.
        #[arg(long, default_value_t = 0)]
        contempt: i32,
        /// Disable every pruning and reduction.
        #[arg(long)]
        full_width: bool,
    },
}

fn format_score(score: i32) -> String {
    match mate_distance(score) {
        Some(plies) if score > 0 => format!("mate {}", (plies + 1) / 2),
        Some(plies) => format!("mate -{}", plies / 2),
        None => format!("cp {score}"),
    }
}

/// Play `moves` on `board` in order, rejecting the first illegal one.
fn play_moves(board: &mut Board, moves: &[String]) -> Result<()> {
    for (i, text) in moves.iter().enumerate() {
        let mv = board
            .parse_move(text)
            .with_context(|| format!("move {} of --moves", i + 1))?;
        if !board.make_move(mv) {
            bail!("move {} of --moves ({mv}) was rejected", i + 1);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Think {
            fen,
            moves,
            depth,
            movetime,
            nodes,
            hash,
            contempt,
            full_width,
        } => {
            if depth.is_none() && movetime.is_none() && nodes.is_none() {
                bail!("give at least one of --depth, --movetime or --nodes");
            }
            let mut board: Board = fen.parse().with_context(|| format!("invalid FEN `{fen}`"))?;
            play_moves(&mut board, &moves)?;

            let base = if full_width { SearchConfig::full_width() } else { SearchConfig::default() };
            let config = SearchConfig {
                hash_mb: hash,
                contempt,
                ..base
            };
            let limits = SearchLimits {
                depth,
                movetime: movetime.map(Duration::from_millis),
                nodes,
            };
            let control = limits.control(Arc::new(AtomicBool::new(false)));
            let mut searcher = Searcher::new(config);
            info!(fen = %board, ?limits, "thinking");

            let result = searcher.think(&mut board, &Hce, &limits, &control, |depth, score, nodes, pv| {
                let elapsed = control.elapsed().as_millis();
                let line: Vec<String> = pv.iter().map(|mv| mv.to_uci()).collect();
                println!(
                    "info depth {depth} score {} nodes {nodes} time {elapsed} pv {}",
                    format_score(score),
                    line.join(" ")
                );
            });

            info!(
                nodes = result.nodes,
                depth = result.depth,
                hashfull = searcher.tt().hashfull(),
                "search finished"
            );
            if result.best_move.is_null() {
                println!("bestmove (none)");
            } else {
                match result.ponder_move {
                    Some(ponder) => println!("bestmove {} ponder {ponder}", result.best_move),
                    None => println!("bestmove {}", result.best_move),
                }
            }
        }
    }
    Ok(())
}
