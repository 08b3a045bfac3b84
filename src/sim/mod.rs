//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches rendering,
//! audio or storage:
//! - Time arrives as an explicit `dt`
//! - Randomness comes from a caller-provided RNG
//! - Data types are plain values the engine pairs with scene resources

pub mod camera;
pub mod particles;
pub mod placement;
pub mod scoring;
pub mod state;
pub mod tick;

pub use camera::{Camera, DirectionalLight};
pub use particles::{ParticleField, ParticleStyle};
pub use placement::{DropOutcome, Landing, resolve_drop};
pub use scoring::ScoreUpdate;
pub use state::{Axis, Debris, EnginePhase, Footprint, MovingBlock, RunState, StackLayer};
pub use tick::{advance_bounce, advance_debris, advance_moving, ease_toward, wrap_point};
