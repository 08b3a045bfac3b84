//! Brickfall - An arcade block-stacking game
//!
//! Core modules:
//! - `sim`: Pure simulation (stack, drop resolution, scoring, kinematics)
//! - `engine`: Run lifecycle, events and scene resources on top of `sim`
//! - `theme`: Background/brick color progression
//! - `renderer`: Scene abstraction and the WebGPU pipeline
//! - `audio`: Procedural sound cues
//! - `persistence`: Key-value storage (LocalStorage on web, JSON file on native)
//! - `app`: Menu/HUD/game-over/tutorial shell model

pub mod app;
pub mod audio;
pub mod config;
pub mod engine;
pub mod highscores;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod theme;

pub use config::{Difficulty, GameConfig, ThemeType};
pub use engine::{EngineEvent, GameEngine};
pub use highscores::BestScores;
pub use settings::{QualityPreset, Settings};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the engine will integrate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Height of every block
    pub const BOX_HEIGHT: f32 = 2.0;
    /// Footprint of the base layer, also the regrow cap
    pub const ORIGINAL_SIZE: f32 = 20.0;
    /// Oscillation turns around at +/- this distance from the origin
    pub const BOUNCE_LIMIT: f32 = 26.0;

    /// Offsets below this snap to a perfect landing
    pub const PERFECT_THRESHOLD: f32 = 0.25;
    /// Combo count that enters fever
    pub const FEVER_COMBO: u32 = 10;
    /// Every Nth consecutive perfect regrows the top layer
    pub const REGROW_EVERY: u32 = 5;
    /// Footprint gained on each axis by a regrow
    pub const REGROW_AMOUNT: f32 = 1.2;

    /// Oscillation speed for STANDARD (fixed)
    pub const STANDARD_SPEED: f32 = 25.0;
    /// Oscillation speed SPEEDY starts from
    pub const SPEEDY_START_SPEED: f32 = 20.0;
    /// SPEEDY speed gain per placement
    pub const SPEED_INC: f32 = 0.5;
    /// SPEEDY speed cap
    pub const MAX_SPEED: f32 = 100.0;

    /// Squash/stretch timer decay rate (per second)
    pub const BOUNCE_DECAY: f32 = 3.0;

    /// Debris gravity (units/s²)
    pub const DEBRIS_GRAVITY: f32 = 20.0;
    /// Debris life lost per second
    pub const DEBRIS_FADE: f32 = 1.2;
    /// Max horizontal debris drift (either direction)
    pub const DEBRIS_DRIFT: f32 = 2.5;
    /// Max debris spin (radians/s)
    pub const DEBRIS_SPIN: f32 = 5.0;

    /// Orthographic half-height
    pub const VIEW_DISTANCE: f32 = 50.0;
    /// Camera hovers this far above the top layer
    pub const CAMERA_OFFSET_Y: f32 = 10.0;
    /// Camera easing rate (per second)
    pub const CAMERA_EASE: f32 = 2.0;
    /// Fixed horizontal camera placement (x and z)
    pub const CAMERA_XZ: f32 = 15.0;
    /// Directional light hovers this far above the top layer
    pub const LIGHT_OFFSET_Y: f32 = 40.0;
    /// Fog starts at this view distance
    pub const FOG_NEAR: f32 = 25.0;
    /// Fog is opaque at this view distance
    pub const FOG_FAR: f32 = 50.0;

    /// Default ambient particle count
    pub const PARTICLE_COUNT: usize = 400;
    /// Half-size of the particle wrap cube
    pub const PARTICLE_BOUND: f32 = 40.0;
}

/// Convert a `0xRRGGBB` literal to an RGB vector in [0, 1]
#[inline]
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Convert HSL (all components in [0, 1]) to RGB
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    if s <= 0.0 {
        return Vec3::splat(l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_channel(p, q, h + 1.0 / 3.0),
        hue_channel(p, q, h),
        hue_channel(p, q, h - 1.0 / 3.0),
    )
}

/// Decode an sRGB-encoded colour to linear light for the GPU
///
/// Palette values are written as display colours; the surface is sRGB and
/// re-encodes on write.
pub fn srgb_to_linear(color: Vec3) -> Vec3 {
    Vec3::new(
        srgb_channel_to_linear(color.x),
        srgb_channel_to_linear(color.y),
        srgb_channel_to_linear(color.z),
    )
}

#[inline]
fn srgb_channel_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn hue_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
