//! Move representation, bit-packed into a u16.
//!
//! A move is identified by its source square, destination square and
//! optional promotion piece. Ordering priorities assigned during search live
//! beside the move (see the engine's move picker), never inside it, so
//! equality and hashing only ever see these three fields.

use std::fmt;

use crate::piece_kind::PieceKind;
use crate::square::Square;

const SRC_MASK: u16 = 0x003F;
const DST_MASK: u16 = 0x0FC0;
const PROMO_MASK: u16 = 0x7000;
const DST_SHIFT: u32 = 6;
const PROMO_SHIFT: u32 = 12;

/// The piece a pawn promotes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PromotionPiece {
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
}

impl PromotionPiece {
    /// All promotion pieces, weakest first.
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Knight,
        PromotionPiece::Bishop,
        PromotionPiece::Rook,
        PromotionPiece::Queen,
    ];

    /// Convert to the corresponding [`PieceKind`].
    pub const fn to_piece_kind(self) -> PieceKind {
        match self {
            PromotionPiece::Knight => PieceKind::Knight,
            PromotionPiece::Bishop => PieceKind::Bishop,
            PromotionPiece::Rook => PieceKind::Rook,
            PromotionPiece::Queen => PieceKind::Queen,
        }
    }

    /// Convert from a [`PieceKind`]; pawns and kings are not promotion targets.
    pub const fn from_piece_kind(kind: PieceKind) -> Option<PromotionPiece> {
        match kind {
            PieceKind::Knight => Some(PromotionPiece::Knight),
            PieceKind::Bishop => Some(PromotionPiece::Bishop),
            PieceKind::Rook => Some(PromotionPiece::Rook),
            PieceKind::Queen => Some(PromotionPiece::Queen),
            PieceKind::Pawn | PieceKind::King => None,
        }
    }

    /// Return the UCI character for this promotion.
    pub const fn uci_char(self) -> char {
        match self {
            PromotionPiece::Knight => 'n',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Rook => 'r',
            PromotionPiece::Queen => 'q',
        }
    }

    const fn from_bits(bits: u16) -> Option<PromotionPiece> {
        match bits {
            1 => Some(PromotionPiece::Knight),
            2 => Some(PromotionPiece::Bishop),
            3 => Some(PromotionPiece::Rook),
            4 => Some(PromotionPiece::Queen),
            _ => None,
        }
    }
}

/// A move encoded in 16 bits.
///
/// ```text
/// bits  0-5:  source square      (0-63)
/// bits  6-11: destination square (0-63)
/// bits 12-14: promotion piece    (0 = none, Knight=1, Bishop=2, Rook=3, Queen=4)
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u16);

impl Move {
    /// Null move sentinel (A1→A1). Never a legal move.
    pub const NULL: Move = Move(0);

    /// Create a non-promoting move.
    pub const fn new(source: Square, dest: Square) -> Move {
        Move((source.index() as u16) | ((dest.index() as u16) << DST_SHIFT))
    }

    /// Create a promotion move.
    pub const fn new_promotion(source: Square, dest: Square, promo: PromotionPiece) -> Move {
        Move(
            (source.index() as u16)
                | ((dest.index() as u16) << DST_SHIFT)
                | ((promo as u16) << PROMO_SHIFT),
        )
    }

    /// Rebuild a move from its packed representation.
    pub const fn from_raw(raw: u16) -> Move {
        Move(raw & (SRC_MASK | DST_MASK | PROMO_MASK))
    }

    /// The packed 16-bit representation.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Extract the source square.
    pub const fn source(self) -> Square {
        Square::from_index_masked(self.0 & SRC_MASK)
    }

    /// Extract the destination square.
    pub const fn dest(self) -> Square {
        Square::from_index_masked((self.0 & DST_MASK) >> DST_SHIFT)
    }

    /// Extract the promotion piece, if any.
    pub const fn promotion(self) -> Option<PromotionPiece> {
        PromotionPiece::from_bits((self.0 & PROMO_MASK) >> PROMO_SHIFT)
    }

    /// Return `true` if this move promotes a pawn.
    pub const fn is_promotion(self) -> bool {
        self.0 & PROMO_MASK != 0
    }

    /// Return `true` if this is the null move sentinel.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Parse a long-algebraic move (`e2e4`, `e7e8q`).
    pub fn from_uci(text: &str) -> Option<Move> {
        if !(4..=5).contains(&text.len()) || !text.is_ascii() {
            return None;
        }
        let source = Square::from_algebraic(&text[0..2])?;
        let dest = Square::from_algebraic(&text[2..4])?;
        match text.as_bytes().get(4) {
            None => Some(Move::new(source, dest)),
            Some(b'n') => Some(Move::new_promotion(source, dest, PromotionPiece::Knight)),
            Some(b'b') => Some(Move::new_promotion(source, dest, PromotionPiece::Bishop)),
            Some(b'r') => Some(Move::new_promotion(source, dest, PromotionPiece::Rook)),
            Some(b'q') => Some(Move::new_promotion(source, dest, PromotionPiece::Queen)),
            Some(_) => None,
        }
    }

    /// Return the UCI string representation.
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}{}", self.source(), self.dest())?;
        if let Some(promo) = self.promotion() {
            write!(f, "{}", promo.uci_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self})")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{Move, PromotionPiece};
    use crate::piece_kind::PieceKind;
    use crate::square::Square;

    #[test]
    fn size_of_move() {
        assert_eq!(std::mem::size_of::<Move>(), 2);
    }

    #[test]
    fn normal_move_fields() {
        let mv = Move::new(Square::E2, Square::E4);
        assert_eq!(mv.source(), Square::E2);
        assert_eq!(mv.dest(), Square::E4);
        assert_eq!(mv.promotion(), None);
        assert!(!mv.is_null());
    }

    #[test]
    fn promotion_all_pieces() {
        for promo in PromotionPiece::ALL {
            let mv = Move::new_promotion(Square::E7, Square::E8, promo);
            assert_eq!(mv.source(), Square::E7);
            assert_eq!(mv.dest(), Square::E8);
            assert_eq!(mv.promotion(), Some(promo));
            assert!(mv.is_promotion());
        }
    }

    #[test]
    fn raw_roundtrip_preserves_identity() {
        let mv = Move::new_promotion(Square::A7, Square::B8, PromotionPiece::Knight);
        assert_eq!(Move::from_raw(mv.raw()), mv);
    }

    #[test]
    fn null_move_is_a1a1() {
        assert!(Move::NULL.is_null());
        assert_eq!(Move::NULL.source(), Square::A1);
        assert_eq!(Move::NULL.dest(), Square::A1);
        assert_eq!(Move::NULL.to_string(), "0000");
    }

    #[test]
    fn uci_text() {
        assert_eq!(Move::new(Square::E2, Square::E4).to_uci(), "e2e4");
        let promo = Move::new_promotion(Square::E7, Square::E8, PromotionPiece::Queen);
        assert_eq!(promo.to_uci(), "e7e8q");
        assert_eq!(Move::from_uci("e7e8q"), Some(promo));
        assert_eq!(Move::from_uci("e2e4"), Some(Move::new(Square::E2, Square::E4)));
        assert_eq!(Move::from_uci("e2e4k"), None);
        assert_eq!(Move::from_uci("z2e4"), None);
    }

    #[test]
    fn equality_ignores_nothing_but_identity() {
        let mv1 = Move::new(Square::E2, Square::E4);
        let mv2 = Move::new(Square::E2, Square::E4);
        let mv3 = Move::new_promotion(Square::E2, Square::E4, PromotionPiece::Queen);

        assert_eq!(mv1, mv2);
        assert_ne!(mv1, mv3);

        let mut set = HashSet::new();
        set.insert(mv1);
        set.insert(mv2);
        set.insert(mv3);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn promotion_piece_conversions() {
        for promo in PromotionPiece::ALL {
            assert_eq!(PromotionPiece::from_piece_kind(promo.to_piece_kind()), Some(promo));
        }
        assert_eq!(PromotionPiece::from_piece_kind(PieceKind::King), None);
    }
}
