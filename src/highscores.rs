//! Per-difficulty best scores and the one-time tutorial flag
//!
//! Each difficulty keeps a single best score under its own key. A score is
//! written only when it beats what is already stored.

use crate::config::Difficulty;
use crate::persistence::KeyValueStore;

/// Best-score keys are this prefix plus the difficulty name
pub const BEST_KEY_PREFIX: &str = "brickfall_best_";
/// Set once the tutorial has been shown
pub const TUTORIAL_KEY: &str = "brickfall_tutorial_seen";

/// Storage key for a difficulty's best score
pub fn best_key(difficulty: Difficulty) -> String {
    format!("{}{}", BEST_KEY_PREFIX, difficulty.as_str())
}

/// Cached view of the stored records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BestScores {
    standard: u32,
    speedy: u32,
    tutorial_seen: bool,
}

impl BestScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every record; anything absent or unreadable counts as 0 / unseen
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let scores = Self {
            standard: Self::read(store, Difficulty::Standard),
            speedy: Self::read(store, Difficulty::Speedy),
            tutorial_seen: store.get(TUTORIAL_KEY).is_some_and(|v| v == "true"),
        };
        log::info!(
            "Loaded best scores: standard {}, speedy {}",
            scores.standard,
            scores.speedy
        );
        scores
    }

    fn read(store: &dyn KeyValueStore, difficulty: Difficulty) -> u32 {
        let Some(raw) = store.get(&best_key(difficulty)) else {
            return 0;
        };
        raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unreadable best score {:?} for {}", raw, difficulty.as_str());
            0
        })
    }

    fn slot(&mut self, difficulty: Difficulty) -> &mut u32 {
        match difficulty {
            Difficulty::Standard => &mut self.standard,
            Difficulty::Speedy => &mut self.speedy,
        }
    }

    /// Cached best for a difficulty
    pub fn best(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Standard => self.standard,
            Difficulty::Speedy => self.speedy,
        }
    }

    /// Re-read one difficulty's record (on difficulty change)
    pub fn refresh(&mut self, store: &dyn KeyValueStore, difficulty: Difficulty) -> u32 {
        let best = Self::read(store, difficulty);
        *self.slot(difficulty) = best;
        best
    }

    /// Store `score` if it beats the stored best. Returns true on a new record.
    pub fn record(&mut self, store: &mut dyn KeyValueStore, difficulty: Difficulty, score: u32) -> bool {
        let stored = self.refresh(store, difficulty);
        if score <= stored {
            return false;
        }

        *self.slot(difficulty) = score;
        match store.set(&best_key(difficulty), &score.to_string()) {
            Ok(()) => log::info!("New {} best: {}", difficulty.as_str(), score),
            Err(e) => log::warn!("Failed to save best score: {}", e),
        }
        true
    }

    pub fn tutorial_seen(&self) -> bool {
        self.tutorial_seen
    }

    pub fn mark_tutorial_seen(&mut self, store: &mut dyn KeyValueStore) {
        self.tutorial_seen = true;
        if let Err(e) = store.set(TUTORIAL_KEY, "true") {
            log::warn!("Failed to save tutorial flag: {}", e);
        }
    }
}
