//! Run configuration chosen in the menu
//!
//! Immutable for the duration of a run.

use serde::{Deserialize, Serialize};

use crate::consts::{SPEEDY_START_SPEED, STANDARD_SPEED};

/// Difficulty mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Fixed oscillation speed
    #[default]
    Standard,
    /// Speed ramps up after every placement
    Speedy,
}

impl Difficulty {
    pub const ALL: [Difficulty; 2] = [Difficulty::Standard, Difficulty::Speedy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Standard => "STANDARD",
            Difficulty::Speedy => "SPEEDY",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(Difficulty::Standard),
            "speedy" => Some(Difficulty::Speedy),
            _ => None,
        }
    }

    /// Oscillation speed at run start
    pub fn initial_speed(&self) -> f32 {
        match self {
            Difficulty::Standard => STANDARD_SPEED,
            Difficulty::Speedy => SPEEDY_START_SPEED,
        }
    }

    /// Whether speed increases after each placement
    pub fn ramps_speed(&self) -> bool {
        matches!(self, Difficulty::Speedy)
    }
}

/// Visual palette selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThemeType {
    #[default]
    Midnight,
    Sunset,
    Glacier,
}

impl ThemeType {
    pub const ALL: [ThemeType; 3] = [ThemeType::Midnight, ThemeType::Sunset, ThemeType::Glacier];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeType::Midnight => "MIDNIGHT",
            ThemeType::Sunset => "SUNSET",
            ThemeType::Glacier => "GLACIER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "midnight" => Some(ThemeType::Midnight),
            "sunset" => Some(ThemeType::Sunset),
            "glacier" => Some(ThemeType::Glacier),
            _ => None,
        }
    }

    /// Accent color used by the HUD and game-over screen
    pub fn accent_hex(&self) -> u32 {
        match self {
            ThemeType::Midnight => 0x4f46e5,
            ThemeType::Sunset => 0xea580c,
            ThemeType::Glacier => 0x0891b2,
        }
    }
}

/// Difficulty + theme for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub theme: ThemeType,
}

impl GameConfig {
    pub fn new(difficulty: Difficulty, theme: ThemeType) -> Self {
        Self { difficulty, theme }
    }
}
