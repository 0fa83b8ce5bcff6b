//! Fixed-capacity, stack-allocated move list.

use crate::chess_move::Move;

/// Maximum number of moves a single position can produce.
pub const MAX_MOVES: usize = 256;

/// A list of moves produced fresh for one search node.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: u16,
}

impl MoveList {
    /// Create an empty move list.
    pub fn new() -> MoveList {
        MoveList {
            moves: [Move::NULL; MAX_MOVES],
            len: 0,
        }
    }

    /// Push a move onto the list.
    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!((self.len as usize) < MAX_MOVES);
        self.moves[self.len as usize] = mv;
        self.len += 1;
    }

    /// Remove all moves.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Return the number of moves in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Return `true` if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return a slice of the moves.
    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len as usize]
    }

    /// Return `true` if `mv` is in the list.
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;
    #[inline]
    fn index(&self, index: usize) -> &Move {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::MoveList;
    use crate::{Move, Square};

    #[test]
    fn push_and_clear() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        list.push(Move::new(Square::E2, Square::E4));
        list.push(Move::new(Square::D2, Square::D4));
        assert_eq!(list.len(), 2);
        assert_eq!(list[1], Move::new(Square::D2, Square::D4));
        assert!(list.contains(Move::new(Square::E2, Square::E4)));
        list.clear();
        assert!(list.is_empty());
        assert!(!list.contains(Move::new(Square::E2, Square::E4)));
    }
}
