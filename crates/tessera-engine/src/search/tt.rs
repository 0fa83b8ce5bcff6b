//! Lockless transposition table with XOR-checked slots.
//!
//! Each slot is two `AtomicU64` words. The second word carries a check value
//! derived from the first, so a slot torn by a concurrent writer fails
//! verification and reads as a miss instead of as wrong data.
//!
//! ## Bit layout
//!
//! ```text
//! word0:
//!   bits 63-32: key         (upper 32 bits of the position hash)
//!   bits 31-27: generation  (5 bits, wraps at 32)
//!   bit  26:    reserved
//!   bits 25-24: bound       (2 bits)
//!   bits 23-16: depth       (8 bits)
//!   bits 15-0:  move        (packed `Move`)
//!
//! word1:
//!   bits 63-32: check       = key ^ (word0 & 0xFFFF_FFFF)
//!   bits 31-0:  score       (i32, node-relative for mate scores)
//! ```

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use tessera_core::Move;

use crate::search::negamax::MATE_THRESHOLD;

const GENERATION_MASK: u8 = 0x1F;

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<TranspositionTable>();
    }
    let _ = check;
};

/// What a stored score says about the true value of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// Empty slot.
    None = 0,
    /// The score is the exact value.
    Exact = 1,
    /// The node failed high; the true value is at least the score.
    LowerBound = 2,
    /// The node failed low; the true value is at most the score.
    UpperBound = 3,
}

impl Bound {
    const fn from_bits(bits: u64) -> Self {
        match bits & 0x03 {
            1 => Bound::Exact,
            2 => Bound::LowerBound,
            3 => Bound::UpperBound,
            _ => Bound::None,
        }
    }
}

/// A verified entry returned by [`TranspositionTable::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    /// Best or refutation move, `Move::NULL` if none was found.
    pub best_move: Move,
    /// Remaining depth the entry was searched to.
    pub depth: i32,
    /// Bound kind of `score`.
    pub bound: Bound,
    /// Score, already converted back to be relative to the probing ply.
    pub score: i32,
}

impl TtEntry {
    /// The stored score if it settles a node searched to `depth` with the
    /// window `(alpha, beta)`.
    pub fn cutoff(&self, depth: i32, alpha: i32, beta: i32) -> Option<i32> {
        if self.depth < depth {
            return None;
        }
        let usable = match self.bound {
            Bound::Exact => true,
            Bound::LowerBound => self.score >= beta,
            Bound::UpperBound => self.score <= alpha,
            Bound::None => false,
        };
        usable.then_some(self.score)
    }
}

/// Convert a search score into its stored form.
///
/// Mate scores count plies from the root. Stored entries count from the node
/// instead, so they stay valid when reached along another path.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score > MATE_THRESHOLD {
        score + ply
    } else if score < -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`].
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score > MATE_THRESHOLD {
        score - ply
    } else if score < -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

struct Slot {
    word0: AtomicU64,
    word1: AtomicU64,
}

impl Slot {
    const fn empty() -> Self {
        Self {
            word0: AtomicU64::new(0),
            word1: AtomicU64::new(0),
        }
    }

    fn pack(hash: u64, generation: u8, bound: Bound, depth: u8, mv: Move, score: i32) -> (u64, u64) {
        let key = hash >> 32;
        let w0 = (key << 32)
            | (((generation & GENERATION_MASK) as u64) << 27)
            | ((bound as u64) << 24)
            | ((depth as u64) << 16)
            | mv.raw() as u64;
        let check = key ^ (w0 & 0xFFFF_FFFF);
        let w1 = (check << 32) | (score as u32 as u64);
        (w0, w1)
    }

    /// Both words, or `None` if the check value does not match.
    fn load_verified(&self) -> Option<(u64, u64)> {
        let w0 = self.word0.load(Ordering::Relaxed);
        let w1 = self.word1.load(Ordering::Relaxed);
        ((w0 >> 32) ^ (w0 & 0xFFFF_FFFF) == w1 >> 32).then_some((w0, w1))
    }

    fn write(&self, w0: u64, w1: u64) {
        self.word0.store(w0, Ordering::Relaxed);
        self.word1.store(w1, Ordering::Relaxed);
    }
}

fn generation_of(w0: u64) -> u8 {
    ((w0 >> 27) as u8) & GENERATION_MASK
}

fn depth_of(w0: u64) -> u8 {
    (w0 >> 16) as u8
}

/// Lockless transposition table. Every method takes `&self`.
pub struct TranspositionTable {
    slots: Box<[Slot]>,
    mask: u64,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Create a table of at most `mb` megabytes, rounded down to a power of
    /// two slots (at least one).
    pub fn new(mb: usize) -> Self {
        let bytes = mb.saturating_mul(1024 * 1024);
        let fit = (bytes / std::mem::size_of::<Slot>()).max(1);
        let count = if fit.is_power_of_two() { fit } else { fit.next_power_of_two() >> 1 };
        tracing::trace!(mb, slots = count, "allocating transposition table");

        Self {
            slots: (0..count).map(|_| Slot::empty()).collect(),
            mask: (count - 1) as u64,
            generation: AtomicU8::new(0),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Empty every slot and reset the generation.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.write(0, 0);
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Start a new search generation. Entries from older generations are
    /// replaced unconditionally.
    pub fn new_generation(&self) {
        let next = self.generation.load(Ordering::Relaxed).wrapping_add(1) & GENERATION_MASK;
        self.generation.store(next, Ordering::Relaxed);
    }

    fn slot(&self, hash: u64) -> &Slot {
        &self.slots[(hash & self.mask) as usize]
    }

    /// Look up `hash`. Mate scores are rebased to `ply`.
    ///
    /// Empty slots, key mismatches and torn slots are all misses.
    pub fn probe(&self, hash: u64, ply: usize) -> Option<TtEntry> {
        let (w0, w1) = self.slot(hash).load_verified()?;
        if w0 >> 32 != hash >> 32 {
            return None;
        }
        let bound = Bound::from_bits(w0 >> 24);
        if bound == Bound::None {
            return None;
        }
        Some(TtEntry {
            best_move: Move::from_raw(w0 as u16),
            depth: depth_of(w0) as i32,
            bound,
            score: score_from_tt(w1 as u32 as i32, ply),
        })
    }

    /// Store the result of searching `hash` to `depth` at `ply`.
    ///
    /// A slot is overwritten when it is empty, from an older generation, no
    /// deeper than the new entry, or when the new bound is exact. Storing
    /// without a move keeps the move already recorded for the same position.
    pub fn store(&self, hash: u64, depth: i32, score: i32, best_move: Move, bound: Bound, ply: usize) {
        let slot = self.slot(hash);
        let generation = self.generation.load(Ordering::Relaxed);
        let depth = depth.clamp(0, u8::MAX as i32) as u8;

        let old = slot.load_verified().map(|(w0, _)| w0);
        let mut mv = best_move;
        if let Some(w0) = old {
            let replace = Bound::from_bits(w0 >> 24) == Bound::None
                || generation_of(w0) != generation
                || depth >= depth_of(w0)
                || bound == Bound::Exact;
            if !replace {
                return;
            }
            if mv.is_null() && w0 >> 32 == hash >> 32 {
                mv = Move::from_raw(w0 as u16);
            }
        }

        let (w0, w1) = Slot::pack(hash, generation, bound, depth, mv, score_to_tt(score, ply));
        slot.write(w0, w1);
    }

    /// Per-mille occupancy by current-generation entries, sampled over the
    /// first thousand slots.
    pub fn hashfull(&self) -> u32 {
        let generation = self.generation.load(Ordering::Relaxed);
        let sample = self.slots.len().min(1000);
        let used = self.slots[..sample]
            .iter()
            .filter_map(Slot::load_verified)
            .filter(|&(w0, _)| Bound::from_bits(w0 >> 24) != Bound::None && generation_of(w0) == generation)
            .count();
        (used * 1000 / sample) as u32
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("slots", &self.slots.len())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}
