//! Combo, fever, score and speed rules
//!
//! Applied once per landed drop; a miss never reaches this module.

use super::state::RunState;
use crate::consts::*;

/// What a landing did to the run counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub perfect: bool,
    /// Combo after the landing
    pub combo: u32,
    /// Fever after the landing
    pub fever: bool,
    /// Top layer should regrow
    pub regrow: bool,
    /// Points awarded (1, or 2 in fever)
    pub points: u32,
    /// Score after the landing
    pub score: u32,
}

impl RunState {
    /// Apply combo/fever/score rules for one landing
    pub fn record_landing(&mut self, perfect: bool) -> ScoreUpdate {
        let mut regrow = false;
        if perfect {
            self.combo += 1;
            regrow = self.combo.is_multiple_of(REGROW_EVERY);
            if self.combo >= FEVER_COMBO {
                self.fever = true;
            }
        } else {
            self.combo = 0;
            self.fever = false;
        }

        let points = if self.fever { 2 } else { 1 };
        self.score += points;

        ScoreUpdate {
            perfect,
            combo: self.combo,
            fever: self.fever,
            regrow,
            points,
            score: self.score,
        }
    }

    /// Speed up after a placement when the difficulty ramps
    pub fn accelerate(&mut self) {
        if self.difficulty.ramps_speed() {
            self.speed = (self.speed + SPEED_INC).min(MAX_SPEED);
        }
    }
}
