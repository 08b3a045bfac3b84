//! Ambient background particles
//!
//! A cloud of points drifting with a theme-specific velocity profile, wrapped
//! around a cube that follows the top of the stack.

use glam::Vec3;
use rand::Rng;

use super::tick::wrap_point;
use crate::config::ThemeType;
use crate::consts::PARTICLE_BOUND;
use crate::hex_to_rgb;

/// How the particles look
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStyle {
    pub color: Vec3,
    pub size: f32,
    pub opacity: f32,
}

impl ParticleStyle {
    pub fn for_theme(theme: ThemeType) -> Self {
        match theme {
            ThemeType::Midnight => Self {
                color: Vec3::ONE,
                size: 0.1,
                opacity: 0.3,
            },
            ThemeType::Sunset => Self {
                color: hex_to_rgb(0xffaa44),
                size: 0.12,
                opacity: 0.5,
            },
            ThemeType::Glacier => Self {
                color: hex_to_rgb(0xccffff),
                size: 0.15,
                opacity: 0.4,
            },
        }
    }
}

fn jitter<R: Rng>(rng: &mut R, scale: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * scale
}

/// Random velocity for one particle: embers rise, snow falls, dust floats
fn theme_velocity<R: Rng>(theme: ThemeType, rng: &mut R) -> Vec3 {
    match theme {
        ThemeType::Sunset => Vec3::new(
            jitter(rng, 2.0),
            2.0 + rng.random::<f32>() * 5.0,
            jitter(rng, 2.0),
        ),
        ThemeType::Glacier => Vec3::new(
            jitter(rng, 3.0),
            -2.0 - rng.random::<f32>() * 4.0,
            jitter(rng, 3.0),
        ),
        ThemeType::Midnight => Vec3::new(jitter(rng, 0.5), jitter(rng, 0.5), jitter(rng, 0.5)),
    }
}

/// The particle cloud for one run
#[derive(Debug, Clone)]
pub struct ParticleField {
    pub theme: ThemeType,
    pub style: ParticleStyle,
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
}

impl ParticleField {
    /// Scatter `count` particles in the wrap cube around the origin
    pub fn new<R: Rng>(theme: ThemeType, count: usize, rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        for _ in 0..count {
            positions.push(Vec3::new(
                jitter(rng, PARTICLE_BOUND * 2.0),
                jitter(rng, PARTICLE_BOUND * 2.0),
                jitter(rng, PARTICLE_BOUND * 2.0),
            ));
            velocities.push(theme_velocity(theme, rng));
        }
        Self {
            theme,
            style: ParticleStyle::for_theme(theme),
            positions,
            velocities,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Drift every particle and wrap it around a cube centered at height `top_y`
    pub fn advance(&mut self, dt: f32, top_y: f32) {
        let center = Vec3::new(0.0, top_y, 0.0);
        for (pos, vel) in self.positions.iter_mut().zip(&self.velocities) {
            *pos = wrap_point(*pos + *vel * dt, center, PARTICLE_BOUND);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_velocity_profiles() {
        let mut rng = Pcg32::seed_from_u64(7);
        let sunset = ParticleField::new(ThemeType::Sunset, 200, &mut rng);
        assert!(sunset.velocities.iter().all(|v| v.y >= 2.0 && v.y < 7.0));
        assert!(sunset.velocities.iter().all(|v| v.x.abs() <= 1.0 && v.z.abs() <= 1.0));

        let glacier = ParticleField::new(ThemeType::Glacier, 200, &mut rng);
        assert!(glacier.velocities.iter().all(|v| v.y <= -2.0 && v.y > -6.0));

        let midnight = ParticleField::new(ThemeType::Midnight, 200, &mut rng);
        assert!(midnight.velocities.iter().all(|v| v.abs().max_element() <= 0.25));
    }

    #[test]
    fn test_particles_stay_in_cube() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut field = ParticleField::new(ThemeType::Sunset, 100, &mut rng);
        assert_eq!(field.len(), 100);
        assert!(field
            .positions
            .iter()
            .all(|p| p.abs().max_element() <= PARTICLE_BOUND));

        // Stack top moves far up; particles re-center around it
        for _ in 0..50 {
            field.advance(0.1, 200.0);
        }
        assert!(field
            .positions
            .iter()
            .all(|p| (p.y - 200.0).abs() <= PARTICLE_BOUND + 1.0));
    }

    #[test]
    fn test_empty_field() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut field = ParticleField::new(ThemeType::Midnight, 0, &mut rng);
        assert!(field.is_empty());
        field.advance(0.1, 10.0);
    }
}
