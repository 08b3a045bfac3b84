//! Drop resolution
//!
//! Compares the moving block against the top layer on the active axis only and
//! decides between a miss, a perfect landing and a sliced landing.

use glam::Vec3;

use super::state::{Axis, Footprint};
use crate::consts::PERFECT_THRESHOLD;

/// Result of a landed (non-miss) drop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    /// Footprint of the new layer
    pub footprint: Footprint,
    /// Offset after snapping (0 for a perfect landing)
    pub offset: f32,
    /// Kept size along the active axis (> 0)
    pub overlap: f32,
    pub perfect: bool,
    /// Sliced-off part, absent for a perfect landing
    pub slice: Option<Footprint>,
}

/// Outcome of one drop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    /// No overlap left; `overlap` is <= 0
    Miss { overlap: f32 },
    Landed(Landing),
}

impl DropOutcome {
    pub fn is_miss(&self) -> bool {
        matches!(self, DropOutcome::Miss { .. })
    }
}

/// Resolve a drop of a block at `moving` onto `top` along `axis`
pub fn resolve_drop(top: &Footprint, moving: Vec3, axis: Axis) -> DropOutcome {
    let offset = axis.component(moving) - top.center(axis);
    let extent = top.extent(axis);
    let overlap = extent - offset.abs();

    if overlap <= 0.0 {
        return DropOutcome::Miss { overlap };
    }

    if offset.abs() < PERFECT_THRESHOLD {
        return DropOutcome::Landed(Landing {
            footprint: *top,
            offset: 0.0,
            overlap: extent,
            perfect: true,
            slice: None,
        });
    }

    let cut = offset.abs();
    // Debris sits flush against the kept part, on the side the block overshot
    let slice_center = top.center(axis) + offset.signum() * (extent / 2.0 + cut / 2.0);

    let (footprint, slice) = match axis {
        Axis::X => (
            Footprint::new(top.x + offset / 2.0, top.z, overlap, top.d),
            Footprint::new(slice_center, moving.z, cut, top.d),
        ),
        Axis::Z => (
            Footprint::new(top.x, top.z + offset / 2.0, top.w, overlap),
            Footprint::new(moving.x, slice_center, top.w, cut),
        ),
    };

    DropOutcome::Landed(Landing {
        footprint,
        offset,
        overlap,
        perfect: false,
        slice: Some(slice),
    })
}
