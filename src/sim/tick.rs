//! Per-frame kinematics
//!
//! Each function advances one kind of object by `dt` seconds. The engine calls
//! them every frame, whether or not a run is in progress.

use glam::Vec3;

use super::state::{Axis, Debris, MovingBlock, StackLayer};
use crate::consts::*;

/// Move the block along `axis`, reversing at the oscillation limits.
/// Returns the (possibly flipped) direction.
pub fn advance_moving(block: &mut MovingBlock, axis: Axis, speed: f32, direction: f32, dt: f32) -> f32 {
    let mut pos = axis.component(block.position) + speed * direction * dt;
    let mut direction = direction;
    if pos.abs() >= BOUNCE_LIMIT {
        direction = -direction;
        pos = pos.signum() * BOUNCE_LIMIT;
    }
    axis.set_component(&mut block.position, pos);
    direction
}

/// Count the squash/stretch timer down
pub fn advance_bounce(layer: &mut StackLayer, dt: f32) {
    if layer.bounce > 0.0 {
        layer.bounce = (layer.bounce - dt * BOUNCE_DECAY).max(0.0);
    }
}

/// Integrate one debris fragment. Returns false once it has faded out.
pub fn advance_debris(debris: &mut Debris, dt: f32) -> bool {
    debris.velocity.y -= DEBRIS_GRAVITY * dt;
    debris.position += debris.velocity * dt;
    debris.rotation += debris.spin * dt;
    debris.life -= DEBRIS_FADE * dt;
    debris.life > 0.0
}

/// Exponential approach of `current` toward `target` at `rate` per second
#[inline]
pub fn ease_toward(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * (rate * dt).min(1.0)
}

/// Wrap a coordinate into `[center - bound, center + bound]`, jumping to the opposite face
#[inline]
pub fn wrap_coord(value: f32, center: f32, bound: f32) -> f32 {
    if value < center - bound {
        center + bound
    } else if value > center + bound {
        center - bound
    } else {
        value
    }
}

/// Wrap every component of `p` into a cube centered at `center`
pub fn wrap_point(p: Vec3, center: Vec3, bound: f32) -> Vec3 {
    Vec3::new(
        wrap_coord(p.x, center.x, bound),
        wrap_coord(p.y, center.y, bound),
        wrap_coord(p.z, center.z, bound),
    )
}
