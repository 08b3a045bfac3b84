//! Orthographic follow camera and key light
//!
//! The camera sits at a fixed diagonal (x = z = 15) and only its height moves,
//! easing toward the top of the stack.

use glam::{Mat4, Vec3};

use super::tick::ease_toward;
use crate::consts::*;

const NEAR: f32 = -100.0;
const FAR: f32 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Look-at point on the vertical axis
    pub target: Vec3,
    /// Viewport width / height
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            aspect: 1.0,
        };
        camera.set_aspect(aspect);
        camera.reset();
        camera
    }

    /// Back to the starting height above the base layer
    pub fn reset(&mut self) {
        self.position = Vec3::new(CAMERA_XZ, CAMERA_OFFSET_Y, CAMERA_XZ);
        self.target = Vec3::ZERO;
    }

    /// Ease the camera height toward `top_y + CAMERA_OFFSET_Y`; the view
    /// always aims straight at the stack top
    pub fn follow(&mut self, top_y: f32, dt: f32) {
        self.position.y = ease_toward(self.position.y, top_y + CAMERA_OFFSET_Y, CAMERA_EASE, dt);
        self.target = Vec3::new(0.0, top_y, 0.0);
    }

    /// Ignores degenerate aspect ratios (zero-sized viewport)
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.set_aspect(width as f32 / height as f32);
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        let d = VIEW_DISTANCE;
        Mat4::orthographic_rh(-d * self.aspect, d * self.aspect, -d, d, NEAR, FAR)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// Directional light kept above the stack top
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        let mut light = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
        };
        light.follow(0.0);
        light
    }
}

impl DirectionalLight {
    pub fn follow(&mut self, top_y: f32) {
        self.position = Vec3::new(CAMERA_XZ, top_y + LIGHT_OFFSET_Y, CAMERA_XZ * 0.5);
        self.target = Vec3::new(0.0, top_y, 0.0);
    }

    /// Unit vector pointing from the lit surface toward the light
    pub fn direction(&self) -> Vec3 {
        (self.position - self.target).normalize_or_zero()
    }
}
