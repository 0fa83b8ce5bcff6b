//! Search and evaluation for tessera.

pub mod eval;
pub mod search;

pub use eval::{Evaluator, Hce, StaticEval};
pub use search::config::SearchConfig;
pub use search::control::{SearchControl, SearchLimits};
pub use search::negamax::{Aborted, INF, MATE_SCORE, MATE_THRESHOLD, MAX_PLY, mate_distance};
pub use search::tt::TranspositionTable;
pub use search::{SearchResult, Searcher};
