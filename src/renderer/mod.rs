//! Rendering module
//!
//! The engine draws through the [`Scene`] trait: boxes (layers, the moving
//! block, debris) and one point cloud (ambient particles). Every add returns an
//! owned, non-cloneable handle that must be given back to release the object,
//! so a resource can only be freed once.
//!
//! Two scenes exist: [`WgpuScene`] for the browser (instanced boxes with fog)
//! and [`HeadlessScene`], which only records state, for tests and native runs.

pub mod headless;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use headless::{HeadlessScene, SceneStore};
pub use pipeline::WgpuScene;

use glam::{Mat4, Vec3};

use crate::consts::{FOG_FAR, FOG_NEAR};
use crate::sim::ParticleStyle;

/// Owned reference to a box in a scene
#[derive(Debug, PartialEq, Eq)]
pub struct MeshHandle(u32);

/// Owned reference to a point cloud in a scene
#[derive(Debug, PartialEq, Eq)]
pub struct PointsHandle(u32);

/// Everything needed to draw one box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDesc {
    /// Center
    pub position: Vec3,
    /// Unscaled extents
    pub size: Vec3,
    /// Squash/stretch multiplier
    pub scale: Vec3,
    /// Rotation about x (radians)
    pub rotation_x: f32,
    pub color: Vec3,
    pub opacity: f32,
    /// 0 = fully lit, 1 = flat color
    pub emissive: f32,
}

impl BoxDesc {
    /// Opaque, unrotated box
    pub fn solid(position: Vec3, size: Vec3, color: Vec3) -> Self {
        Self {
            position,
            size,
            scale: Vec3::ONE,
            rotation_x: 0.0,
            color,
            opacity: 1.0,
            emissive: 0.1,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    /// Unit cube → world transform
    pub fn model(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation_x)
            * Mat4::from_scale(self.size * self.scale)
    }
}

/// Per-frame camera, light and atmosphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub view_proj: Mat4,
    pub camera_pos: Vec3,
    /// Toward the light, normalized
    pub light_dir: Vec3,
    /// Clear color, also used as the fog color
    pub background: Vec3,
    pub fog_near: f32,
    pub fog_far: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            camera_pos: Vec3::ZERO,
            light_dir: Vec3::Y,
            background: Vec3::ZERO,
            fog_near: FOG_NEAR,
            fog_far: FOG_FAR,
        }
    }
}

/// Drawing surface the engine populates
pub trait Scene {
    fn add_box(&mut self, desc: &BoxDesc) -> MeshHandle;
    fn update_box(&mut self, handle: &MeshHandle, desc: &BoxDesc);
    fn remove_box(&mut self, handle: MeshHandle);

    fn add_points(&mut self, style: ParticleStyle, positions: &[Vec3]) -> PointsHandle;
    fn update_points(&mut self, handle: &PointsHandle, positions: &[Vec3]);
    fn remove_points(&mut self, handle: PointsHandle);

    fn set_frame(&mut self, frame: &FrameParams);
    fn resize(&mut self, width: u32, height: u32);
}
