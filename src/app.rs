//! UI shell model
//!
//! Screen flow, HUD values, perfect-landing popups and the first-run tutorial.
//! Holds no rendering code: the web front end mirrors this state into the DOM
//! each frame and the native demo just logs it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::audio::AudioHandle;
use crate::config::{Difficulty, GameConfig, ThemeType};
use crate::engine::{EngineEvent, GameEngine};
use crate::highscores::BestScores;
use crate::persistence::KeyValueStore;
use crate::renderer::Scene;
use crate::settings::{QualityPreset, Settings};

/// Seconds a popup stays on screen
pub const POPUP_LIFETIME: f32 = 0.8;

/// Which top-level screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Menu,
    Playing,
    GameOver,
}

/// Values shown by the in-game HUD and the game-over screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hud {
    pub score: u32,
    pub best: u32,
    pub fever: bool,
}

/// Text for a perfect-landing popup
pub fn popup_text(combo: u32, fever: bool) -> String {
    if fever {
        format!("FEVER x{}!", combo)
    } else if combo > 1 {
        format!("PERFECT x{}", combo)
    } else {
        "PERFECT!".to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub id: u64,
    pub text: String,
    /// Seconds since it appeared
    pub age: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialStep {
    pub title: &'static str,
    pub body: &'static str,
    pub accent: u32,
}

pub const TUTORIAL_STEPS: [TutorialStep; 4] = [
    TutorialStep {
        title: "WELCOME CLIMBER",
        body: "Brickfall is a game of precision and timing. Stack blocks as high as you can without missing.",
        accent: 0x9333ea,
    },
    TutorialStep {
        title: "HOW TO PLAY",
        body: "Tap, click or press space to drop the moving block. Try to line it up with the one below!",
        accent: 0xf97316,
    },
    TutorialStep {
        title: "PERFECT STACK",
        body: "Perfect landings build your combo. Get 10 in a row to enter FEVER MODE for double points and stack regrowth!",
        accent: 0xff00ff,
    },
    TutorialStep {
        title: "GAME MODES",
        body: "Standard mode has a fixed speed. Speedy mode gets faster with every block! Choose your challenge in the menu.",
        accent: 0x06b6d4,
    },
];

/// Position in the tutorial overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tutorial {
    step: usize,
}

impl Tutorial {
    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn current(&self) -> &'static TutorialStep {
        &TUTORIAL_STEPS[self.step]
    }

    pub fn is_last(&self) -> bool {
        self.step + 1 == TUTORIAL_STEPS.len()
    }

    /// Label of the primary button
    pub fn button_label(&self) -> &'static str {
        if self.is_last() { "GOT IT!" } else { "NEXT" }
    }

    /// Move to the next step. Returns false when the tutorial is finished.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.step += 1;
        true
    }
}

/// Events are queued by the engine and applied by the shell after each call
/// into it, so the engine never re-enters the shell.
type EventQueue = Rc<RefCell<VecDeque<EngineEvent>>>;

pub struct App<S: Scene> {
    engine: GameEngine<S>,
    events: EventQueue,
    audio: AudioHandle,
    store: Box<dyn KeyValueStore>,

    screen: Screen,
    config: GameConfig,
    settings: Settings,
    best: BestScores,
    hud: Hud,
    popups: Vec<Popup>,
    next_popup: u64,
    tutorial: Option<Tutorial>,
}

impl<S: Scene> App<S> {
    pub fn new(scene: S, audio: AudioHandle, store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let events: EventQueue = Rc::default();
        let sink = {
            let events = events.clone();
            move |event: EngineEvent| events.borrow_mut().push_back(event)
        };
        let engine = GameEngine::new(scene, audio.clone(), sink, seed);

        let settings = Settings::load(store.as_ref());
        audio.borrow_mut().set_muted(settings.muted);
        let best = BestScores::load(store.as_ref());
        let config = GameConfig::default();
        let tutorial = (!best.tutorial_seen()).then(Tutorial::default);

        Self {
            engine,
            events,
            audio,
            store,
            screen: Screen::Menu,
            config,
            settings,
            hud: Hud {
                best: best.best(config.difficulty),
                ..Hud::default()
            },
            best,
            popups: Vec::new(),
            next_popup: 0,
            tutorial,
        }
    }

    // === Menu ===

    pub fn select_difficulty(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
        self.hud.best = self.best.refresh(self.store.as_ref(), difficulty);
    }

    pub fn select_theme(&mut self, theme: ThemeType) {
        self.config.theme = theme;
    }

    pub fn set_quality(&mut self, quality: QualityPreset) {
        self.settings.quality = quality;
        self.settings.save(self.store.as_mut());
    }

    pub fn set_particles(&mut self, enabled: bool) {
        self.settings.particles = enabled;
        self.settings.save(self.store.as_mut());
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
        self.audio.borrow_mut().set_muted(muted);
        self.settings.save(self.store.as_mut());
    }

    /// Start (or retry) a run with the selected config
    pub fn start(&mut self) {
        self.audio.borrow_mut().init();
        self.hud.score = 0;
        self.hud.fever = false;
        self.popups.clear();
        self.screen = Screen::Playing;

        self.engine.set_particle_count(self.settings.particle_count());
        self.engine.start_game(self.config);
        self.drain_events();
    }

    // === In game ===

    /// Tap, click or key press
    pub fn tap(&mut self) {
        if self.screen != Screen::Playing {
            return;
        }
        self.engine.handle_input();
        self.drain_events();
    }

    /// Back button during play: abandon the run without a game-over screen
    pub fn back_to_menu(&mut self) {
        if self.screen == Screen::Playing {
            self.engine.stop(true);
            self.drain_events();
        }
        self.screen = Screen::Menu;
    }

    /// Advance the engine and popup timers by one display frame
    pub fn frame(&mut self, dt: f32) {
        self.engine.tick(dt);
        self.drain_events();
        for popup in &mut self.popups {
            popup.age += dt.max(0.0);
        }
        self.popups.retain(|popup| popup.age < POPUP_LIFETIME);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.engine.resize(width, height);
    }

    fn drain_events(&mut self) {
        loop {
            let Some(event) = self.events.borrow_mut().pop_front() else {
                break;
            };
            self.apply(event);
        }
    }

    fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Score { score, fever } => {
                self.hud.score = score;
                self.hud.fever = fever;
            }
            EngineEvent::Perfect { combo, fever } => {
                let id = self.next_popup;
                self.next_popup += 1;
                self.popups.push(Popup {
                    id,
                    text: popup_text(combo, fever),
                    age: 0.0,
                });
            }
            EngineEvent::GameOver { score } => {
                let difficulty = self.config.difficulty;
                self.hud.score = score;
                self.hud.fever = false;
                self.best.record(self.store.as_mut(), difficulty, score);
                self.hud.best = self.best.best(difficulty);
                self.screen = Screen::GameOver;
            }
        }
    }

    // === Tutorial ===

    /// Re-open the tutorial from the menu
    pub fn show_tutorial(&mut self) {
        self.tutorial = Some(Tutorial::default());
    }

    /// Primary tutorial button: next step, or close after the last one
    pub fn tutorial_next(&mut self) {
        if let Some(tutorial) = &mut self.tutorial
            && !tutorial.advance()
        {
            self.close_tutorial();
        }
    }

    pub fn skip_tutorial(&mut self) {
        self.close_tutorial();
    }

    fn close_tutorial(&mut self) {
        if self.tutorial.take().is_some() && !self.best.tutorial_seen() {
            self.best.mark_tutorial_seen(self.store.as_mut());
        }
    }

    // === Accessors ===

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hud(&self) -> Hud {
        self.hud
    }

    pub fn popups(&self) -> &[Popup] {
        &self.popups
    }

    pub fn tutorial(&self) -> Option<&Tutorial> {
        self.tutorial.as_ref()
    }

    pub fn engine(&self) -> &GameEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GameEngine<S> {
        &mut self.engine
    }

    /// Release the engine's scene resources; the app is inert afterwards
    pub fn dispose(&mut self) {
        self.engine.dispose();
        self.events.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioManager;
    use crate::consts::ORIGINAL_SIZE;
    use crate::highscores::{TUTORIAL_KEY, best_key};
    use crate::persistence::MemoryStore;
    use crate::renderer::HeadlessScene;
    use crate::sim::EnginePhase;

    /// Store whose contents stay readable after it is handed to the app
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), crate::persistence::PersistenceError> {
            self.0.borrow_mut().set(key, value)
        }
    }

    fn app_with(store: &SharedStore) -> App<HeadlessScene> {
        App::new(
            HeadlessScene::new(800, 600),
            AudioManager::new().handle(),
            Box::new(store.clone()),
            42,
        )
    }

    /// Line the moving block up with the top layer (plus `offset`) and tap
    fn tap_at(app: &mut App<HeadlessScene>, offset: f32) {
        app.engine_mut().set_drop_offset(offset);
        app.tap();
    }

    #[test]
    fn test_popup_text_rules() {
        assert_eq!(popup_text(1, false), "PERFECT!");
        assert_eq!(popup_text(4, false), "PERFECT x4");
        assert_eq!(popup_text(12, true), "FEVER x12!");
    }

    #[test]
    fn test_tutorial_steps() {
        let mut tutorial = Tutorial::default();
        let mut titles = vec![tutorial.current().title];
        while tutorial.advance() {
            titles.push(tutorial.current().title);
        }
        assert_eq!(
            titles,
            vec!["WELCOME CLIMBER", "HOW TO PLAY", "PERFECT STACK", "GAME MODES"]
        );
        assert_eq!(tutorial.button_label(), "GOT IT!");
        assert_eq!(Tutorial::default().button_label(), "NEXT");
        assert_eq!(TUTORIAL_STEPS[2].accent, 0xff00ff);
    }

    #[test]
    fn test_first_launch_shows_tutorial_once() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        assert_eq!(app.screen(), Screen::Menu);
        assert!(app.tutorial().is_some());

        for _ in 0..3 {
            app.tutorial_next();
        }
        assert_eq!(app.tutorial().unwrap().step_index(), 3);
        app.tutorial_next();
        assert!(app.tutorial().is_none());
        assert_eq!(store.get(TUTORIAL_KEY).as_deref(), Some("true"));

        let app = app_with(&store);
        assert!(app.tutorial().is_none());
    }

    #[test]
    fn test_skip_tutorial_sets_flag() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        app.skip_tutorial();
        assert!(app.tutorial().is_none());
        assert!(store.get(TUTORIAL_KEY).is_some());
    }

    #[test]
    fn test_tap_ignored_outside_play() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        app.tap();
        assert_eq!(app.engine().phase(), EnginePhase::Idle);
        assert_eq!(app.screen(), Screen::Menu);
    }

    #[test]
    fn test_run_updates_hud_and_popups() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        app.start();
        assert_eq!(app.screen(), Screen::Playing);
        assert_eq!(app.hud().score, 0);

        tap_at(&mut app, 0.0);
        tap_at(&mut app, 0.0);
        assert_eq!(app.hud().score, 2);
        let texts: Vec<_> = app.popups().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["PERFECT!", "PERFECT x2"]);

        app.frame(0.5);
        assert_eq!(app.popups().len(), 2);
        app.frame(0.5);
        assert!(app.popups().is_empty());
    }

    #[test]
    fn test_game_over_records_best_only_when_exceeded() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        app.start();
        for _ in 0..3 {
            tap_at(&mut app, 1.0);
        }
        tap_at(&mut app, ORIGINAL_SIZE);
        assert_eq!(app.screen(), Screen::GameOver);
        assert_eq!(app.hud(), Hud { score: 3, best: 3, fever: false });
        assert_eq!(store.get(&best_key(Difficulty::Standard)).as_deref(), Some("3"));

        // Retry and score lower
        app.start();
        tap_at(&mut app, 1.0);
        tap_at(&mut app, ORIGINAL_SIZE);
        assert_eq!(app.hud(), Hud { score: 1, best: 3, fever: false });
        assert_eq!(store.get(&best_key(Difficulty::Standard)).as_deref(), Some("3"));
    }

    #[test]
    fn test_best_follows_difficulty() {
        let store = SharedStore::default();
        store.clone().set(&best_key(Difficulty::Speedy), "17").unwrap();
        let mut app = app_with(&store);
        assert_eq!(app.hud().best, 0);
        app.select_difficulty(Difficulty::Speedy);
        assert_eq!(app.hud().best, 17);
        app.select_difficulty(Difficulty::Standard);
        assert_eq!(app.hud().best, 0);
    }

    #[test]
    fn test_back_button_abandons_run_silently() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        app.start();
        tap_at(&mut app, 0.0);
        app.back_to_menu();
        assert_eq!(app.screen(), Screen::Menu);
        assert_eq!(app.engine().phase(), EnginePhase::GameOver);
        // Abandoned runs never count toward the best
        assert!(store.get(&best_key(Difficulty::Standard)).is_none());
    }

    #[test]
    fn test_game_over_then_menu() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        app.select_theme(ThemeType::Glacier);
        app.start();
        assert_eq!(app.engine().config().theme, ThemeType::Glacier);
        tap_at(&mut app, ORIGINAL_SIZE);
        assert_eq!(app.screen(), Screen::GameOver);
        app.back_to_menu();
        assert_eq!(app.screen(), Screen::Menu);
    }

    #[test]
    fn test_settings_persist_and_drive_particles() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        app.set_quality(QualityPreset::Low);
        app.set_muted(true);
        app.start();
        assert_eq!(app.engine().particles().map(|p| p.len()), Some(100));

        app.set_particles(false);
        app.start();
        assert!(app.engine().particles().is_none());

        let app = app_with(&store);
        assert_eq!(app.settings().quality, QualityPreset::Low);
        assert!(app.settings().muted);
        assert!(!app.settings().particles);
    }

    #[test]
    fn test_events_arrive_in_order() {
        let store = SharedStore::default();
        let mut app = app_with(&store);
        app.start();
        app.events.borrow_mut().push_back(EngineEvent::Perfect { combo: 11, fever: true });
        app.events.borrow_mut().push_back(EngineEvent::Score { score: 40, fever: true });
        app.frame(0.0);
        assert_eq!(app.hud().score, 40);
        assert!(app.hud().fever);
        assert_eq!(app.popups().last().unwrap().text, "FEVER x11!");
    }
}
