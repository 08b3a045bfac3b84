//! Stack, moving block, debris and run state
//!
//! Plain data with no rendering dependencies. The engine pairs each of these
//! with the scene resources that draw it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::consts::*;

/// Horizontal axis the moving block oscillates along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    X,
    Z,
}

impl Axis {
    /// The other horizontal axis
    pub fn flip(self) -> Self {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    /// Component of `v` along this axis
    #[inline]
    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Z => v.z,
        }
    }

    #[inline]
    pub fn set_component(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Z => v.z = value,
        }
    }
}

/// Horizontal rectangle centered at (x, z) with width `w` (x) and depth `d` (z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub x: f32,
    pub z: f32,
    pub w: f32,
    pub d: f32,
}

impl Footprint {
    pub const fn new(x: f32, z: f32, w: f32, d: f32) -> Self {
        Self { x, z, w, d }
    }

    /// Base layer footprint
    pub const fn base() -> Self {
        Self::new(0.0, 0.0, ORIGINAL_SIZE, ORIGINAL_SIZE)
    }

    /// Center coordinate along `axis`
    #[inline]
    pub fn center(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Z => self.z,
        }
    }

    /// Size along `axis`
    #[inline]
    pub fn extent(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.w,
            Axis::Z => self.d,
        }
    }

    /// Grow both sides by `amount`, never past `max`
    pub fn regrow(&mut self, amount: f32, max: f32) {
        self.w = (self.w + amount).min(max);
        self.d = (self.d + amount).min(max);
    }

    /// Box size for a block of this footprint
    pub fn size(&self) -> Vec3 {
        Vec3::new(self.w, BOX_HEIGHT, self.d)
    }
}

/// A placed block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackLayer {
    pub footprint: Footprint,
    /// Layer index × `BOX_HEIGHT`
    pub y: f32,
    pub color: Vec3,
    /// Squash/stretch timer, counts down from 1.0
    pub bounce: f32,
}

impl StackLayer {
    pub fn new(footprint: Footprint, index: usize, color: Vec3) -> Self {
        Self {
            footprint,
            y: index as f32 * BOX_HEIGHT,
            color,
            bounce: 1.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.footprint.x, self.y, self.footprint.z)
    }

    /// Scale for the current squash/stretch phase
    pub fn bounce_scale(&self) -> Vec3 {
        if self.bounce <= 0.0 {
            return Vec3::ONE;
        }
        let b = (self.bounce * 10.0).sin() * self.bounce * 0.12;
        Vec3::new(1.0 + b, 1.0 - b, 1.0 + b)
    }
}

/// The block awaiting placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingBlock {
    pub position: Vec3,
    pub w: f32,
    pub d: f32,
    pub color: Vec3,
}

impl MovingBlock {
    /// Spawn above `top`, at the oscillation limit opposite to `direction`
    pub fn spawn(top: &StackLayer, axis: Axis, direction: f32, color: Vec3) -> Self {
        let start = if direction > 0.0 {
            -BOUNCE_LIMIT
        } else {
            BOUNCE_LIMIT
        };
        let mut position = top.position() + Vec3::Y * BOX_HEIGHT;
        axis.set_component(&mut position, start);
        Self {
            position,
            w: top.footprint.w,
            d: top.footprint.d,
            color,
        }
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(self.w, BOX_HEIGHT, self.d)
    }
}

/// Sliced-off fragment of an imperfect landing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debris {
    pub position: Vec3,
    pub size: Vec3,
    pub velocity: Vec3,
    /// Spin rate about x (radians/s)
    pub spin: f32,
    /// Accumulated rotation about x
    pub rotation: f32,
    /// 1.0 → 0.0, drives opacity
    pub life: f32,
    pub color: Vec3,
}

impl Debris {
    pub fn new(position: Vec3, size: Vec3, drift: Vec3, spin: f32, color: Vec3) -> Self {
        Self {
            position,
            size,
            velocity: Vec3::new(drift.x, 0.0, drift.z),
            spin,
            rotation: 0.0,
            life: 1.0,
            color,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.life.clamp(0.0, 1.0)
    }
}

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Constructed, no run yet
    #[default]
    Idle,
    /// Accepting placement input
    Playing,
    /// Run ended; only a new run leaves this phase
    GameOver,
}

/// Per-run counters and oscillation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub difficulty: Difficulty,
    pub score: u32,
    /// Consecutive perfect landings
    pub combo: u32,
    pub fever: bool,
    pub axis: Axis,
    /// +1.0 or -1.0
    pub direction: f32,
    pub speed: f32,
}

impl RunState {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            score: 0,
            combo: 0,
            fever: false,
            axis: Axis::X,
            direction: 1.0,
            speed: difficulty.initial_speed(),
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(Difficulty::Standard)
    }
}
