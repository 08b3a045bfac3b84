//! Mesh and instance generation

use glam::{Mat4, Vec3};

use super::BoxDesc;
use super::vertex::{BoxInstance, Vertex};
use crate::sim::ParticleStyle;
use crate::srgb_to_linear;

/// Face normals with two in-plane axes ordered so (u × v) == normal
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
];

/// Unit cube centered on the origin: 4 vertices and 2 CCW triangles per face
pub fn unit_cube() -> (Vec<Vertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in FACES {
        let n = Vec3::from(normal);
        let u = Vec3::from(u);
        let v = Vec3::from(v);
        let center = n * 0.5;
        let base = vertices.len() as u16;

        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let p = center + u * su + v * sv;
            vertices.push(Vertex::new(p.to_array(), normal));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

pub fn box_instance(desc: &BoxDesc) -> BoxInstance {
    BoxInstance {
        model: desc.model().to_cols_array_2d(),
        color: srgb_to_linear(desc.color).extend(desc.opacity).to_array(),
        emissive: desc.emissive,
    }
}

/// Particles drawn as tiny unlit cubes
pub fn particle_instances(style: &ParticleStyle, positions: &[Vec3]) -> Vec<BoxInstance> {
    let scale = Vec3::splat(style.size);
    let color = srgb_to_linear(style.color)
        .extend(style.opacity)
        .to_array();
    positions
        .iter()
        .map(|p| BoxInstance {
            model: Mat4::from_scale_rotation_translation(scale, glam::Quat::IDENTITY, *p)
                .to_cols_array_2d(),
            color,
            emissive: 1.0,
        })
        .collect()
}
