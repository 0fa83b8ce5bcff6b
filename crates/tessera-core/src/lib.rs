//! Core game types for tessera: moves, squares, the position contract and a
//! chess board that implements it.

mod board;
mod chess_move;
mod color;
mod error;
mod fen;
mod move_list;
mod piece_kind;
mod position;
mod square;

pub mod see;

pub use board::Board;
pub use chess_move::{Move, PromotionPiece};
pub use color::Color;
pub use error::{FenError, MoveError};
pub use fen::STARTING_FEN;
pub use move_list::{MAX_MOVES, MoveList};
pub use piece_kind::PieceKind;
pub use position::{FIFTY_MOVE_LIMIT, PHASE_ENDGAME, PHASE_OPENING, Position};
pub use square::Square;
