//! Background/fog color and brick hue progression
//!
//! The selected palette only seeds the background at run start. After that the
//! background blends toward a score bucket (cave → sunset → space), lagging
//! behind bucket changes instead of snapping.

use glam::Vec3;

use crate::config::ThemeType;
use crate::{hex_to_rgb, hsl_to_rgb};

/// Background color + brick base hue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: u32,
    pub hue: f32,
}

/// Score < 20
pub const CAVE: Palette = Palette {
    background: 0x1a1512,
    hue: 0.08,
};
/// 20 <= score < 50
pub const DUSK: Palette = Palette {
    background: 0x2e0a1a,
    hue: 0.04,
};
/// Score >= 50
pub const SPACE: Palette = Palette {
    background: 0x020205,
    hue: 0.62,
};

/// Progression bucket thresholds
pub const DUSK_SCORE: u32 = 20;
pub const SPACE_SCORE: u32 = 50;

/// Background pulses toward this while in fever
pub const FEVER_PULSE: u32 = 0x330033;

const BRICK_SATURATION: f32 = 0.75;
const BRICK_LIGHTNESS: f32 = 0.5;
const SCORE_HUE_SHIFT: f32 = 0.008;
const INDEX_HUE_SHIFT: f32 = 0.015;

/// Palette a run starts from
pub fn selection_palette(theme: ThemeType) -> Palette {
    match theme {
        ThemeType::Midnight => Palette {
            background: 0x020205,
            hue: 0.62,
        },
        ThemeType::Sunset => Palette {
            background: 0x1a0a2e,
            hue: 0.04,
        },
        ThemeType::Glacier => Palette {
            background: 0xeef5f5,
            hue: 0.5,
        },
    }
}

/// Palette for a score bucket
pub fn progression_palette(score: u32) -> Palette {
    if score < DUSK_SCORE {
        CAVE
    } else if score < SPACE_SCORE {
        DUSK
    } else {
        SPACE
    }
}

/// Tracks the continuously blended background and the brick base hue
#[derive(Debug, Clone)]
pub struct ThemeManager {
    current_color: Vec3,
    base_hue: f32,
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeManager {
    pub fn new() -> Self {
        let palette = selection_palette(ThemeType::Midnight);
        Self {
            current_color: hex_to_rgb(palette.background),
            base_hue: palette.hue,
        }
    }

    /// Current blended background (also the fog color)
    pub fn current_color(&self) -> Vec3 {
        self.current_color
    }

    pub fn base_hue(&self) -> f32 {
        self.base_hue
    }

    /// Switch palette and snap the background to it
    pub fn set_selection(&mut self, theme: ThemeType) {
        let palette = selection_palette(theme);
        self.current_color = hex_to_rgb(palette.background);
        self.base_hue = palette.hue;
    }

    /// Blend the background toward the score bucket's color
    pub fn update(&mut self, score: u32, dt: f32) {
        let target = progression_palette(score);
        let t = (1.0 * dt).clamp(0.0, 1.0);
        self.current_color = self.current_color.lerp(hex_to_rgb(target.background), t);
        self.base_hue = target.hue;
    }

    /// Brick color for a layer at `index` placed while the score was `score`
    pub fn brick_color(&self, score: u32, index: usize) -> Vec3 {
        let hue = (self.base_hue + score as f32 * SCORE_HUE_SHIFT + index as f32 * INDEX_HUE_SHIFT)
            .rem_euclid(1.0);
        hsl_to_rgb(hue, BRICK_SATURATION, BRICK_LIGHTNESS)
    }

    /// Background for this frame, with the fever pulse blended in when active
    pub fn background(&self, fever: bool, clock: f32) -> Vec3 {
        if !fever {
            return self.current_color;
        }
        let p = ((clock * 10.0).sin() + 1.0) / 2.0;
        self.current_color.lerp(hex_to_rgb(FEVER_PULSE), p * 0.5)
    }
}
