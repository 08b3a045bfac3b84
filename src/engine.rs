//! Game engine
//!
//! Owns one run: the stack, the moving block, debris, ambient particles, the
//! camera and the theme. Every simulated object is paired with the scene
//! handle that draws it, and the handle is returned to the scene when the
//! object goes away.
//!
//! The host drives the engine:
//! - `tick(dt)` once per display frame
//! - `handle_input()` on a tap/click/key
//! - `start_game`, `stop`, `resize`, `dispose` from the shell
//!
//! Outcomes are reported through an [`EventSink`], synchronously, after the
//! state change they describe.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio::AudioHandle;
use crate::config::GameConfig;
use crate::consts::*;
use crate::renderer::{BoxDesc, FrameParams, MeshHandle, PointsHandle, Scene};
use crate::sim::{
    Axis, Camera, Debris, DirectionalLight, DropOutcome, EnginePhase, Footprint, MovingBlock,
    ParticleField, RunState, StackLayer, advance_bounce, advance_debris, advance_moving,
    resolve_drop,
};
use crate::theme::ThemeManager;

/// Something the UI shell reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// After every placement, and once at run start with 0
    Score { score: u32, fever: bool },
    /// After a perfect landing
    Perfect { combo: u32, fever: bool },
    /// Run ended on a miss
    GameOver { score: u32 },
}

/// Receives engine events
pub trait EventSink {
    fn on_event(&mut self, event: EngineEvent);
}

impl<F: FnMut(EngineEvent)> EventSink for F {
    fn on_event(&mut self, event: EngineEvent) {
        self(event)
    }
}

/// A simulated object and the scene resource drawing it
#[derive(Debug)]
struct Placed<T> {
    item: T,
    mesh: MeshHandle,
}

#[derive(Debug)]
struct Ambient {
    field: ParticleField,
    points: PointsHandle,
}

fn layer_desc(layer: &StackLayer) -> BoxDesc {
    BoxDesc {
        scale: layer.bounce_scale(),
        ..BoxDesc::solid(layer.position(), layer.footprint.size(), layer.color)
    }
}

fn moving_desc(block: &MovingBlock) -> BoxDesc {
    BoxDesc::solid(block.position, block.size(), block.color)
}

fn debris_desc(debris: &Debris) -> BoxDesc {
    BoxDesc {
        rotation_x: debris.rotation,
        opacity: debris.opacity(),
        ..BoxDesc::solid(debris.position, debris.size, debris.color)
    }
}

pub struct GameEngine<S: Scene> {
    scene: S,
    audio: AudioHandle,
    sink: Box<dyn EventSink>,
    rng: Pcg32,

    config: GameConfig,
    phase: EnginePhase,
    run: RunState,
    /// Set from an accepted input until the next block has spawned
    transitioning: bool,
    /// Frame loop started by the first `start_game`
    looping: bool,
    disposed: bool,
    /// Seconds of ticked time, drives the fever pulse
    clock: f32,
    particle_count: usize,

    stack: Vec<Placed<StackLayer>>,
    moving: Option<Placed<MovingBlock>>,
    debris: Vec<Placed<Debris>>,
    ambient: Option<Ambient>,

    theme: ThemeManager,
    camera: Camera,
    light: DirectionalLight,
}

impl<S: Scene> GameEngine<S> {
    pub fn new(scene: S, audio: AudioHandle, sink: impl EventSink + 'static, seed: u64) -> Self {
        Self {
            scene,
            audio,
            sink: Box::new(sink),
            rng: Pcg32::seed_from_u64(seed),
            config: GameConfig::default(),
            phase: EnginePhase::Idle,
            run: RunState::default(),
            transitioning: false,
            looping: false,
            disposed: false,
            clock: 0.0,
            particle_count: PARTICLE_COUNT,
            stack: Vec::new(),
            moving: None,
            debris: Vec::new(),
            ambient: None,
            theme: ThemeManager::new(),
            camera: Camera::default(),
            light: DirectionalLight::default(),
        }
    }

    /// Ambient particle count for the next run
    pub fn set_particle_count(&mut self, count: usize) {
        self.particle_count = count;
    }

    fn emit(&mut self, event: EngineEvent) {
        self.sink.on_event(event);
    }

    fn ensure_live(&self, op: &str) -> bool {
        if self.disposed {
            log::warn!("{} called on a disposed engine", op);
        }
        !self.disposed
    }

    // === Lifecycle ===

    /// Abandon any current run and begin a new one
    pub fn start_game(&mut self, config: GameConfig) {
        if !self.ensure_live("start_game") {
            return;
        }

        self.config = config;
        self.phase = EnginePhase::Playing;
        self.run = RunState::new(config.difficulty);
        self.transitioning = false;

        self.release_all();
        self.theme.set_selection(config.theme);
        self.spawn_ambient();

        self.add_layer(Footprint::base());
        self.spawn_next();

        log::info!(
            "Run started: {} / {}",
            config.difficulty.as_str(),
            config.theme.as_str()
        );
        self.emit(EngineEvent::Score {
            score: 0,
            fever: false,
        });
        self.looping = true;
    }

    /// Drop the moving block
    pub fn handle_input(&mut self) {
        if !self.ensure_live("handle_input") {
            return;
        }
        if self.phase != EnginePhase::Playing || self.transitioning {
            return;
        }
        let Some(moving) = &self.moving else {
            return;
        };
        let Some(top) = self.stack.last() else {
            return;
        };
        self.transitioning = true;

        let drop_pos = moving.item.position;
        let top_color = top.item.color;
        let landing = match resolve_drop(&top.item.footprint, drop_pos, self.run.axis) {
            DropOutcome::Miss { overlap } => {
                log::debug!("Miss (overlap {:.2})", overlap);
                self.stop(false);
                return;
            }
            DropOutcome::Landed(landing) => landing,
        };

        if let Some(slice) = landing.slice {
            self.spawn_debris(slice, drop_pos.y, top_color);
        }
        if let Some(block) = self.moving.take() {
            self.scene.remove_box(block.mesh);
        }
        self.add_layer(landing.footprint);

        let update = self.run.record_landing(landing.perfect);
        log::debug!(
            "Landed: offset {:.2}, overlap {:.2}, perfect {}, combo {}",
            landing.offset,
            landing.overlap,
            landing.perfect,
            update.combo
        );
        if update.perfect {
            self.audio.borrow_mut().play_perfect(update.combo);
            if update.regrow {
                self.regrow_top();
            }
            self.emit(EngineEvent::Perfect {
                combo: update.combo,
                fever: update.fever,
            });
        } else {
            self.audio.borrow_mut().play_land();
        }
        self.emit(EngineEvent::Score {
            score: update.score,
            fever: update.fever,
        });

        self.run.accelerate();
        self.run.axis = self.run.axis.flip();
        self.spawn_next();
    }

    /// End the run. `forced` suppresses the game-over event (shell abandoning
    /// the run). No-op unless a run is in progress.
    pub fn stop(&mut self, forced: bool) {
        if !self.ensure_live("stop") {
            return;
        }
        if self.phase != EnginePhase::Playing {
            return;
        }

        self.phase = EnginePhase::GameOver;
        self.run.fever = false;
        self.audio.borrow_mut().play_game_over();
        if let Some(block) = self.moving.take() {
            self.scene.remove_box(block.mesh);
        }

        log::info!(
            "Run over: score {} ({})",
            self.run.score,
            if forced { "abandoned" } else { "missed" }
        );
        if !forced {
            self.emit(EngineEvent::GameOver {
                score: self.run.score,
            });
        }
    }

    /// Rescale the projection; never touches run state
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.ensure_live("resize") {
            return;
        }
        self.camera.resize(width, height);
        self.scene.resize(width, height);
    }

    /// Release every scene resource and stop the loop. Later calls are ignored.
    pub fn dispose(&mut self) {
        if !self.ensure_live("dispose") {
            return;
        }
        self.release_all();
        self.looping = false;
        self.disposed = true;
        log::info!("Engine disposed");
    }

    // === Frame update ===

    /// Advance all animation by `dt` seconds (clamped to `MAX_FRAME_DT`)
    pub fn tick(&mut self, dt: f32) {
        if self.disposed || !self.looping {
            return;
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.clock += dt;

        if self.phase == EnginePhase::Playing
            && let Some(block) = &mut self.moving
        {
            self.run.direction =
                advance_moving(&mut block.item, self.run.axis, self.run.speed, self.run.direction, dt);
            self.scene.update_box(&block.mesh, &moving_desc(&block.item));
        }

        for layer in &mut self.stack {
            if layer.item.bounce > 0.0 {
                advance_bounce(&mut layer.item, dt);
                self.scene.update_box(&layer.mesh, &layer_desc(&layer.item));
            }
        }

        let mut i = 0;
        while i < self.debris.len() {
            let piece = &mut self.debris[i];
            if advance_debris(&mut piece.item, dt) {
                self.scene.update_box(&piece.mesh, &debris_desc(&piece.item));
                i += 1;
            } else {
                let gone = self.debris.remove(i);
                self.scene.remove_box(gone.mesh);
            }
        }

        let top_y = self.top_y();
        self.theme.update(self.run.score, dt);
        if let Some(ambient) = &mut self.ambient {
            ambient.field.advance(dt, top_y);
            self.scene.update_points(&ambient.points, &ambient.field.positions);
        }

        self.camera.follow(top_y, dt);
        self.light.follow(top_y);
        self.scene.set_frame(&FrameParams {
            view_proj: self.camera.view_proj(),
            camera_pos: self.camera.position,
            light_dir: self.light.direction(),
            background: self.theme.background(self.run.fever, self.clock),
            fog_near: FOG_NEAR,
            fog_far: FOG_FAR,
        });
    }

    // === Internals ===

    fn top_y(&self) -> f32 {
        self.stack.last().map_or(0.0, |layer| layer.item.y)
    }

    fn add_layer(&mut self, footprint: Footprint) {
        let index = self.stack.len();
        let color = self.theme.brick_color(self.run.score, index);
        let layer = StackLayer::new(footprint, index, color);
        let mesh = self.scene.add_box(&layer_desc(&layer));
        self.stack.push(Placed { item: layer, mesh });
    }

    fn regrow_top(&mut self) {
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        top.item.footprint.regrow(REGROW_AMOUNT, ORIGINAL_SIZE);
        self.scene.update_box(&top.mesh, &layer_desc(&top.item));
        log::debug!(
            "Regrow to {:.1} x {:.1}",
            top.item.footprint.w,
            top.item.footprint.d
        );
    }

    /// Spawn the next moving block on a random side; clears the transition lock
    fn spawn_next(&mut self) {
        let Some(top) = self.stack.last() else {
            return;
        };
        self.run.direction = if self.rng.random::<bool>() { 1.0 } else { -1.0 };
        let color = self.theme.brick_color(self.run.score, self.stack.len());
        let block = MovingBlock::spawn(&top.item, self.run.axis, self.run.direction, color);
        let mesh = self.scene.add_box(&moving_desc(&block));
        self.moving = Some(Placed { item: block, mesh });
        self.transitioning = false;
    }

    fn spawn_debris(&mut self, slice: Footprint, y: f32, color: Vec3) {
        let drift = Vec3::new(
            (self.rng.random::<f32>() - 0.5) * DEBRIS_DRIFT * 2.0,
            0.0,
            (self.rng.random::<f32>() - 0.5) * DEBRIS_DRIFT * 2.0,
        );
        let spin = self.rng.random::<f32>() * DEBRIS_SPIN;
        let position = Vec3::new(slice.x, y, slice.z);
        let piece = Debris::new(position, slice.size(), drift, spin, color);
        let mesh = self.scene.add_box(&debris_desc(&piece));
        self.debris.push(Placed { item: piece, mesh });
    }

    fn spawn_ambient(&mut self) {
        if self.particle_count == 0 {
            return;
        }
        let field = ParticleField::new(self.config.theme, self.particle_count, &mut self.rng);
        let points = self.scene.add_points(field.style, &field.positions);
        self.ambient = Some(Ambient { field, points });
    }

    /// Hand every scene resource back
    fn release_all(&mut self) {
        for layer in self.stack.drain(..) {
            self.scene.remove_box(layer.mesh);
        }
        for piece in self.debris.drain(..) {
            self.scene.remove_box(piece.mesh);
        }
        if let Some(block) = self.moving.take() {
            self.scene.remove_box(block.mesh);
        }
        if let Some(ambient) = self.ambient.take() {
            self.scene.remove_points(ambient.points);
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn score(&self) -> u32 {
        self.run.score
    }

    pub fn combo(&self) -> u32 {
        self.run.combo
    }

    pub fn fever(&self) -> bool {
        self.run.fever
    }

    pub fn speed(&self) -> f32 {
        self.run.speed
    }

    pub fn axis(&self) -> Axis {
        self.run.axis
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn stack(&self) -> impl Iterator<Item = &StackLayer> {
        self.stack.iter().map(|layer| &layer.item)
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn top_layer(&self) -> Option<&StackLayer> {
        self.stack.last().map(|layer| &layer.item)
    }

    pub fn moving_block(&self) -> Option<&MovingBlock> {
        self.moving.as_ref().map(|block| &block.item)
    }

    pub fn debris(&self) -> impl Iterator<Item = &Debris> {
        self.debris.iter().map(|piece| &piece.item)
    }

    /// Signed distance of the moving block from the top layer on the active axis
    pub fn drop_offset(&self) -> Option<f32> {
        let block = self.moving.as_ref()?;
        let top = self.stack.last()?;
        let axis = self.run.axis;
        Some(axis.component(block.item.position) - top.item.footprint.center(axis))
    }

    /// Move the block to `offset` from the top layer on the active axis
    #[cfg(test)]
    pub(crate) fn set_drop_offset(&mut self, offset: f32) {
        let axis = self.run.axis;
        if let (Some(block), Some(top)) = (self.moving.as_mut(), self.stack.last()) {
            axis.set_component(&mut block.item.position, top.item.footprint.center(axis) + offset);
        }
    }

    pub fn particles(&self) -> Option<&ParticleField> {
        self.ambient.as_ref().map(|ambient| &ambient.field)
    }

    pub fn theme(&self) -> &ThemeManager {
        &self.theme
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioManager, AudioOutput, SoundCue};
    use crate::config::{Difficulty, ThemeType};
    use crate::renderer::HeadlessScene;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Events = Rc<RefCell<Vec<EngineEvent>>>;
    type Cues = Rc<RefCell<Vec<SoundCue>>>;

    struct CueRecorder(Cues);

    impl AudioOutput for CueRecorder {
        fn play(&mut self, cue: SoundCue) {
            self.0.borrow_mut().push(cue);
        }
    }

    struct Harness {
        engine: GameEngine<HeadlessScene>,
        events: Events,
        cues: Cues,
    }

    impl Harness {
        fn new(seed: u64) -> Self {
            let events: Events = Rc::default();
            let cues: Cues = Rc::default();
            let mut audio = AudioManager::new();
            audio.init_with(Box::new(CueRecorder(cues.clone())));
            let sink = {
                let events = events.clone();
                move |event: EngineEvent| events.borrow_mut().push(event)
            };
            let mut engine = GameEngine::new(HeadlessScene::new(800, 600), audio.handle(), sink, seed);
            engine.set_particle_count(50);
            Self {
                engine,
                events,
                cues,
            }
        }

        fn start(&mut self, difficulty: Difficulty) {
            self.engine.start_game(GameConfig::new(difficulty, ThemeType::Midnight));
        }

        /// Put the moving block `offset` away from the top layer and drop it
        fn drop_at(&mut self, offset: f32) {
            self.engine.set_drop_offset(offset);
            self.engine.handle_input();
        }

        fn take_events(&self) -> Vec<EngineEvent> {
            self.events.borrow_mut().drain(..).collect()
        }

        fn live_boxes(&self) -> usize {
            self.engine.scene().boxes().len()
        }
    }

    #[test]
    fn test_idle_engine_ignores_everything() {
        let mut h = Harness::new(1);
        h.engine.handle_input();
        h.engine.stop(false);
        h.engine.tick(0.016);
        assert_eq!(h.engine.phase(), EnginePhase::Idle);
        assert!(h.take_events().is_empty());
        assert_eq!(h.live_boxes(), 0);
    }

    #[test]
    fn test_start_seeds_base_and_moving_block() {
        let mut h = Harness::new(2);
        h.start(Difficulty::Standard);

        assert_eq!(h.engine.phase(), EnginePhase::Playing);
        assert_eq!(h.engine.stack_len(), 1);
        let base = h.engine.top_layer().unwrap();
        assert_eq!(base.footprint, Footprint::base());
        assert_eq!(base.y, 0.0);

        let block = h.engine.moving_block().unwrap();
        assert_eq!(block.position.y, BOX_HEIGHT);
        assert_eq!(block.position.x.abs(), BOUNCE_LIMIT);
        assert_eq!((block.w, block.d), (ORIGINAL_SIZE, ORIGINAL_SIZE));

        assert_eq!(h.engine.axis(), Axis::X);
        assert_eq!(h.engine.speed(), STANDARD_SPEED);
        assert_eq!(h.take_events(), vec![EngineEvent::Score { score: 0, fever: false }]);
        // Base + moving block
        assert_eq!(h.live_boxes(), 2);
        assert_eq!(h.engine.scene().points().len(), 1);
    }

    #[test]
    fn test_scenario_first_perfect() {
        let mut h = Harness::new(3);
        h.start(Difficulty::Standard);
        h.take_events();

        h.drop_at(0.0);
        assert_eq!(h.engine.combo(), 1);
        assert_eq!(h.engine.score(), 1);
        assert!(!h.engine.fever());
        assert_eq!(
            h.take_events(),
            vec![
                EngineEvent::Perfect { combo: 1, fever: false },
                EngineEvent::Score { score: 1, fever: false },
            ]
        );
        assert_eq!(*h.cues.borrow(), vec![SoundCue::Perfect { combo: 1 }]);
        assert_eq!(h.engine.stack_len(), 2);
        assert_eq!(h.engine.debris().count(), 0);
    }

    #[test]
    fn test_scenario_fever_on_tenth_perfect() {
        let mut h = Harness::new(4);
        h.start(Difficulty::Standard);

        for n in 1..=9 {
            h.drop_at(0.1);
            assert!(!h.engine.fever(), "fever too early at {n}");
        }
        assert_eq!(h.engine.score(), 9);

        h.drop_at(-0.1);
        assert!(h.engine.fever());
        assert_eq!(h.engine.combo(), 10);
        let score_before = h.engine.score();

        h.drop_at(0.0);
        assert_eq!(h.engine.score(), score_before + 2);

        // An imperfect landing ends fever immediately
        h.take_events();
        h.drop_at(3.0);
        assert!(!h.engine.fever());
        assert_eq!(h.engine.combo(), 0);
        assert_eq!(
            h.take_events(),
            vec![EngineEvent::Score { score: score_before + 3, fever: false }]
        );
    }

    #[test]
    fn test_scenario_total_miss_ends_run() {
        let mut h = Harness::new(5);
        h.start(Difficulty::Standard);
        h.drop_at(0.0);
        h.drop_at(0.0);
        h.take_events();

        h.drop_at(ORIGINAL_SIZE);
        assert_eq!(h.engine.phase(), EnginePhase::GameOver);
        assert_eq!(h.take_events(), vec![EngineEvent::GameOver { score: 2 }]);
        assert!(h.engine.moving_block().is_none());
        assert_eq!(h.engine.stack_len(), 3);
        assert_eq!(h.cues.borrow().last(), Some(&SoundCue::GameOver));

        // No further placements
        h.engine.handle_input();
        h.engine.stop(false);
        assert!(h.take_events().is_empty());
        assert_eq!(h.engine.stack_len(), 3);

        // A new run resets everything
        h.start(Difficulty::Standard);
        assert_eq!(h.engine.phase(), EnginePhase::Playing);
        assert_eq!(h.engine.score(), 0);
        assert_eq!(h.engine.stack_len(), 1);
    }

    #[test]
    fn test_scenario_speedy_accelerates() {
        let mut h = Harness::new(6);
        h.start(Difficulty::Speedy);
        assert_eq!(h.engine.speed(), SPEEDY_START_SPEED);

        let mut last = h.engine.speed();
        for _ in 0..20 {
            h.drop_at(0.0);
            assert!(h.engine.speed() > last);
            last = h.engine.speed();
            // Animation between placements never slows it down
            h.engine.tick(0.05);
            assert_eq!(h.engine.speed(), last);
        }
        assert_eq!(last, SPEEDY_START_SPEED + 20.0 * SPEED_INC);
    }

    #[test]
    fn test_imperfect_landing_slices_and_spawns_debris() {
        let mut h = Harness::new(7);
        h.start(Difficulty::Standard);
        h.drop_at(4.0);

        let top = h.engine.top_layer().unwrap();
        assert_eq!(top.footprint, Footprint::new(2.0, 0.0, 16.0, 20.0));
        assert_eq!(top.y, BOX_HEIGHT);

        let debris: Vec<_> = h.engine.debris().collect();
        assert_eq!(debris.len(), 1);
        assert_eq!(debris[0].position, Vec3::new(12.0, BOX_HEIGHT, 0.0));
        assert_eq!(debris[0].size, Vec3::new(4.0, BOX_HEIGHT, 20.0));
        assert_eq!(debris[0].velocity.y, 0.0);
        assert_eq!(*h.cues.borrow(), vec![SoundCue::Land]);

        // Next block inherits the narrowed footprint on the other axis
        assert_eq!(h.engine.axis(), Axis::Z);
        let block = h.engine.moving_block().unwrap();
        assert_eq!((block.w, block.d), (16.0, 20.0));
        assert_eq!(block.position.x, 2.0);
        assert_eq!(block.position.z.abs(), BOUNCE_LIMIT);
    }

    #[test]
    fn test_debris_fades_and_is_released() {
        let mut h = Harness::new(8);
        h.start(Difficulty::Standard);
        h.drop_at(5.0);
        // Base, new layer, moving block, debris
        assert_eq!(h.live_boxes(), 4);

        for _ in 0..20 {
            h.engine.tick(0.1);
        }
        assert_eq!(h.engine.debris().count(), 0);
        assert_eq!(h.live_boxes(), 3);
    }

    #[test]
    fn test_regrow_on_fifth_perfect() {
        let mut h = Harness::new(9);
        h.start(Difficulty::Standard);
        h.drop_at(6.0);
        h.drop_at(-4.0);
        let narrowed = h.engine.top_layer().unwrap().footprint;
        assert_eq!((narrowed.w, narrowed.d), (14.0, 16.0));

        for _ in 0..4 {
            h.drop_at(0.0);
        }
        assert_eq!(h.engine.top_layer().unwrap().footprint.w, 14.0);

        h.drop_at(0.0);
        let grown = h.engine.top_layer().unwrap().footprint;
        assert!((grown.w - 15.2).abs() < 1e-5);
        assert!((grown.d - 17.2).abs() < 1e-5);
    }

    #[test]
    fn test_axis_alternates_per_placement_only() {
        let mut h = Harness::new(10);
        h.start(Difficulty::Standard);
        let mut axes = vec![h.engine.axis()];
        for _ in 0..4 {
            h.drop_at(0.0);
            axes.push(h.engine.axis());
        }
        assert_eq!(axes, vec![Axis::X, Axis::Z, Axis::X, Axis::Z, Axis::X]);

        h.drop_at(ORIGINAL_SIZE + 1.0);
        assert_eq!(h.engine.axis(), Axis::X);
    }

    #[test]
    fn test_transition_lock_blocks_reentry() {
        let mut h = Harness::new(11);
        h.start(Difficulty::Standard);
        h.engine.transitioning = true;
        h.engine.handle_input();
        assert_eq!(h.engine.stack_len(), 1);
        assert_eq!(h.engine.score(), 0);

        h.engine.transitioning = false;
        h.drop_at(0.0);
        assert_eq!(h.engine.stack_len(), 2);
        // Cleared again once the next block is in play
        assert!(!h.engine.is_transitioning());
    }

    #[test]
    fn test_forced_stop_is_silent() {
        let mut h = Harness::new(12);
        h.start(Difficulty::Standard);
        h.take_events();

        h.engine.stop(true);
        assert_eq!(h.engine.phase(), EnginePhase::GameOver);
        assert!(h.take_events().is_empty());
        assert!(h.engine.moving_block().is_none());
        assert_eq!(h.cues.borrow().last(), Some(&SoundCue::GameOver));
    }

    #[test]
    fn test_restart_releases_previous_run() {
        let mut h = Harness::new(13);
        h.start(Difficulty::Standard);
        for _ in 0..5 {
            h.drop_at(2.0);
        }
        h.start(Difficulty::Speedy);
        assert_eq!(h.live_boxes(), 2);
        assert_eq!(h.engine.scene().points().len(), 1);
        assert_eq!(h.engine.speed(), SPEEDY_START_SPEED);
    }

    #[test]
    fn test_moving_block_bounces_between_limits() {
        let mut h = Harness::new(14);
        h.start(Difficulty::Standard);
        for _ in 0..200 {
            h.engine.tick(0.1);
            let x = h.engine.moving_block().unwrap().position.x;
            assert!(x.abs() <= BOUNCE_LIMIT);
        }
    }

    #[test]
    fn test_tick_clamps_large_dt() {
        let mut h = Harness::new(15);
        h.start(Difficulty::Standard);
        let start = h.engine.moving_block().unwrap().position.x;
        h.engine.tick(5.0);
        let moved = (h.engine.moving_block().unwrap().position.x - start).abs();
        assert!((moved - STANDARD_SPEED * MAX_FRAME_DT).abs() < 1e-4);

        // Garbage time deltas do nothing
        let x = h.engine.moving_block().unwrap().position.x;
        h.engine.tick(f32::NAN);
        h.engine.tick(-1.0);
        assert_eq!(h.engine.moving_block().unwrap().position.x, x);
    }

    #[test]
    fn test_visuals_keep_animating_after_game_over() {
        let mut h = Harness::new(16);
        h.start(Difficulty::Standard);
        h.drop_at(5.0);
        h.drop_at(ORIGINAL_SIZE);
        assert_eq!(h.engine.phase(), EnginePhase::GameOver);

        let before = h.engine.debris().next().unwrap().position;
        h.engine.tick(0.05);
        assert_ne!(h.engine.debris().next().unwrap().position, before);
    }

    #[test]
    fn test_camera_follows_stack() {
        let mut h = Harness::new(17);
        h.start(Difficulty::Standard);
        for _ in 0..10 {
            h.drop_at(0.0);
        }
        let top_y = h.engine.top_layer().unwrap().y;
        h.engine.tick(0.05);
        let y = h.engine.camera().position.y;
        assert!(y > CAMERA_OFFSET_Y && y < top_y + CAMERA_OFFSET_Y);
        assert_eq!(h.engine.camera().target, Vec3::new(0.0, top_y, 0.0));
        for _ in 0..200 {
            h.engine.tick(0.1);
        }
        assert!((h.engine.camera().position.y - (top_y + CAMERA_OFFSET_Y)).abs() < 1e-2);
        assert_eq!(h.engine.scene().frame().camera_pos, h.engine.camera().position);
    }

    #[test]
    fn test_resize_keeps_run_state() {
        let mut h = Harness::new(18);
        h.start(Difficulty::Standard);
        h.drop_at(1.0);
        let top = h.engine.top_layer().unwrap().clone();

        h.engine.resize(1280, 720);
        assert_eq!(h.engine.scene().size(), (1280, 720));
        assert!((h.engine.camera().aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(h.engine.top_layer(), Some(&top));
        assert_eq!(h.engine.phase(), EnginePhase::Playing);
    }

    #[test]
    fn test_dispose_releases_everything() {
        let mut h = Harness::new(19);
        h.start(Difficulty::Standard);
        h.drop_at(3.0);
        h.drop_at(-2.0);
        assert!(h.live_boxes() > 0);

        h.engine.dispose();
        assert_eq!(h.live_boxes(), 0);
        assert!(h.engine.scene().points().is_empty());
        assert!(h.engine.is_disposed());

        // Ignored, not a crash
        h.take_events();
        h.engine.start_game(GameConfig::default());
        h.engine.handle_input();
        h.engine.tick(0.1);
        h.engine.dispose();
        assert_eq!(h.live_boxes(), 0);
        assert!(h.take_events().is_empty());
    }

    #[test]
    fn test_zero_particles_adds_no_cloud() {
        let mut h = Harness::new(20);
        h.engine.set_particle_count(0);
        h.start(Difficulty::Standard);
        assert!(h.engine.particles().is_none());
        assert!(h.engine.scene().points().is_empty());
        h.engine.tick(0.1);
    }

    #[test]
    fn test_fever_pulses_background() {
        let mut h = Harness::new(21);
        h.start(Difficulty::Standard);
        for _ in 0..10 {
            h.drop_at(0.0);
        }
        assert!(h.engine.fever());
        h.engine.tick(0.05);
        let frame_bg = h.engine.scene().frame().background;
        let expected = h.engine.theme().background(true, h.engine.clock);
        assert!((frame_bg - expected).length() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_run() {
        let play = |seed| {
            let mut h = Harness::new(seed);
            h.start(Difficulty::Speedy);
            let mut sides = Vec::new();
            for _ in 0..6 {
                sides.push(h.engine.moving_block().unwrap().position);
                h.drop_at(1.5);
                h.engine.tick(0.03);
            }
            sides
        };
        assert_eq!(play(99), play(99));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_drop_outcomes_are_exclusive(offsets in proptest::collection::vec(-24.0f32..24.0, 1..15)) {
            let mut h = Harness::new(7);
            h.start(Difficulty::Standard);
            for offset in offsets {
                if h.engine.phase() != EnginePhase::Playing {
                    break;
                }
                let axis = h.engine.axis();
                let extent = h.engine.top_layer().unwrap().footprint.extent(axis);
                let layers = h.engine.stack_len();
                let score = h.engine.score();
                h.drop_at(offset);

                if extent - offset.abs() <= 0.0 {
                    prop_assert_eq!(h.engine.phase(), EnginePhase::GameOver);
                    prop_assert_eq!(h.engine.stack_len(), layers);
                    prop_assert_eq!(h.engine.score(), score);
                } else {
                    prop_assert_eq!(h.engine.phase(), EnginePhase::Playing);
                    prop_assert_eq!(h.engine.stack_len(), layers + 1);
                    let top = h.engine.top_layer().unwrap().footprint;
                    prop_assert!(top.w > 0.0 && top.d > 0.0);
                    prop_assert!(top.w <= ORIGINAL_SIZE && top.d <= ORIGINAL_SIZE);
                    let moving = h.engine.moving_block().unwrap();
                    prop_assert!(moving.w <= top.w && moving.d <= top.d);
                }
            }
        }
    }
}
