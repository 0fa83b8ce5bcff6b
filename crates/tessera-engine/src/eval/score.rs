//! Middlegame/endgame score pair.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use tessera_core::PHASE_ENDGAME;

/// A score with separate middlegame and endgame components, blended by the
/// game phase at the end of evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub mg: i32,
    pub eg: i32,
}

/// Shorthand constructor used by the evaluation tables.
#[allow(non_snake_case)]
pub const fn S(mg: i32, eg: i32) -> Score {
    Score { mg, eg }
}

impl Score {
    pub const ZERO: Score = S(0, 0);

    /// Interpolate between the components. `phase` runs from 0 (opening)
    /// to [`PHASE_ENDGAME`].
    pub fn taper(self, phase: i32) -> i32 {
        let phase = phase.clamp(0, PHASE_ENDGAME);
        (self.mg * (PHASE_ENDGAME - phase) + self.eg * phase) / PHASE_ENDGAME
    }
}

impl Add for Score {
    type Output = Score;
    fn add(self, rhs: Score) -> Score {
        S(self.mg + rhs.mg, self.eg + rhs.eg)
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Score) {
        *self = *self + rhs;
    }
}

impl Sub for Score {
    type Output = Score;
    fn sub(self, rhs: Score) -> Score {
        S(self.mg - rhs.mg, self.eg - rhs.eg)
    }
}

impl SubAssign for Score {
    fn sub_assign(&mut self, rhs: Score) {
        *self = *self - rhs;
    }
}

impl Neg for Score {
    type Output = Score;
    fn neg(self) -> Score {
        S(-self.mg, -self.eg)
    }
}

impl Mul<i32> for Score {
    type Output = Score;
    fn mul(self, rhs: i32) -> Score {
        S(self.mg * rhs, self.eg * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let mut score = S(10, -20) + S(5, 5) * 2;
        assert_eq!(score, S(20, -10));
        score -= S(20, -10);
        assert_eq!(score, Score::ZERO);
        assert_eq!(-S(3, -4), S(-3, 4));
    }

    #[test]
    fn taper_endpoints_and_midpoint() {
        let score = S(100, 300);
        assert_eq!(score.taper(0), 100);
        assert_eq!(score.taper(PHASE_ENDGAME), 300);
        assert_eq!(score.taper(PHASE_ENDGAME / 2), 200);
        assert_eq!(score.taper(PHASE_ENDGAME * 2), 300);
    }
}
