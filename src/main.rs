//! Brickfall entry point
//!
//! On the web: canvas + WebGPU scene, DOM overlay for menus and HUD, and the
//! requestAnimationFrame loop. Natively: a headless autoplay demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use brickfall::app::{App, Screen};
    use brickfall::audio::AudioManager;
    use brickfall::persistence::default_store;
    use brickfall::renderer::{Scene, WgpuScene};
    use brickfall::{Difficulty, ThemeType};

    /// Everything the browser callbacks share
    struct Game {
        app: App<WgpuScene>,
        canvas: HtmlCanvasElement,
        last_time: f64,
    }

    impl Game {
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            self.last_time = time;
            self.app.frame(dt.min(0.1));
        }

        fn render(&mut self) {
            let scene = self.app.engine_mut().scene_mut();
            match scene.render() {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let (w, h) = scene.size;
                    scene.resize(w, h);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Match the backing store to the CSS size
        fn fit_canvas(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let dpr = window.device_pixel_ratio();
            let width = (self.canvas.client_width() as f64 * dpr) as u32;
            let height = (self.canvas.client_height() as f64 * dpr) as u32;
            if width == 0 || height == 0 {
                return;
            }
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.app.resize(width, height);
        }

        /// Mirror the shell model into the DOM overlay
        fn update_dom(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let screen = self.app.screen();
            let hud = self.app.hud();
            let config = self.app.config();

            set_visible(&document, "menu", screen == Screen::Menu);
            set_visible(&document, "hud", screen == Screen::Playing);
            set_visible(&document, "game-over", screen == Screen::GameOver);

            set_text(&document, "hud-score", &hud.score.to_string());
            set_text(&document, "hud-best", &format!("Best: {}", hud.best));
            set_visible(&document, "fever-banner", screen == Screen::Playing && hud.fever);

            if screen == Screen::GameOver {
                set_text(&document, "final-score", &hud.score.to_string());
                set_text(&document, "final-best", &hud.best.to_string());
                set_text(
                    &document,
                    "final-mode",
                    &format!("Game Mode: {}", config.difficulty.as_str()),
                );
            }

            // Accent follows the selected theme
            if let Some(root) = document.document_element() {
                let accent = format!("--accent: #{:06x}", config.theme.accent_hex());
                let _ = root.set_attribute("style", &accent);
            }

            for d in Difficulty::ALL {
                set_selected(&document, &difficulty_id(d), d == config.difficulty);
            }
            for t in ThemeType::ALL {
                set_selected(&document, &theme_id(t), t == config.theme);
            }
            set_selected(&document, "mute-btn", self.app.settings().muted);

            if let Some(el) = document.get_element_by_id("popups") {
                let html: String = self
                    .app
                    .popups()
                    .iter()
                    .map(|p| format!("<div class=\"popup\" data-id=\"{}\">{}</div>", p.id, p.text))
                    .collect();
                if el.inner_html() != html {
                    el.set_inner_html(&html);
                }
            }

            set_visible(&document, "tutorial", self.app.tutorial().is_some());
            if let Some(tutorial) = self.app.tutorial() {
                let step = tutorial.current();
                set_text(&document, "tutorial-title", step.title);
                set_text(&document, "tutorial-body", step.body);
                set_text(&document, "tutorial-next", tutorial.button_label());
                set_text(
                    &document,
                    "tutorial-progress",
                    &format!("{} / {}", tutorial.step_index() + 1, brickfall::app::TUTORIAL_STEPS.len()),
                );
                if let Some(el) = document.get_element_by_id("tutorial") {
                    let _ = el.set_attribute("style", &format!("--step-accent: #{:06x}", step.accent));
                }
            }
        }
    }

    fn difficulty_id(d: Difficulty) -> String {
        format!("difficulty-{}", d.as_str().to_lowercase())
    }

    fn theme_id(t: ThemeType) -> String {
        format!("theme-{}", t.as_str().to_lowercase())
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    fn set_selected(document: &Document, id: &str, selected: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("selected", selected);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Brickfall starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let dpr = window.device_pixel_ratio();
        let width = ((canvas.client_width() as f64 * dpr) as u32).max(1);
        let height = ((canvas.client_height() as f64 * dpr) as u32).max(1);
        canvas.set_width(width);
        canvas.set_height(height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let scene = WgpuScene::new(surface, &adapter, width, height).await;
        let seed = js_sys::Date::now() as u64;
        let mut app = App::new(scene, AudioManager::new().handle(), default_store(), seed);
        app.resize(width, height);
        log::info!("Engine ready with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            app,
            canvas: canvas.clone(),
            last_time: 0.0,
        }));

        setup_input_handlers(&canvas, game.clone());
        setup_menu(&document, game.clone());
        setup_resize(game.clone());

        request_animation_frame(game);

        log::info!("Brickfall running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().app.tap();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().app.tap();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().expect("no window");
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" => {
                        event.prevent_default();
                        g.app.tap();
                    }
                    "Escape" => g.app.back_to_menu(),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(
        document: &Document,
        id: &str,
        game: &Rc<RefCell<Game>>,
        action: impl Fn(&mut Game) + 'static,
    ) {
        let Some(el) = document.get_element_by_id(id) else {
            log::warn!("Missing #{} in page", id);
            return;
        };
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            action(&mut game.borrow_mut());
        });
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_menu(document: &Document, game: Rc<RefCell<Game>>) {
        on_click(document, "start-btn", &game, |g| g.app.start());
        on_click(document, "retry-btn", &game, |g| g.app.start());
        on_click(document, "menu-btn", &game, |g| g.app.back_to_menu());
        on_click(document, "back-btn", &game, |g| g.app.back_to_menu());
        on_click(document, "help-btn", &game, |g| g.app.show_tutorial());
        on_click(document, "tutorial-next", &game, |g| g.app.tutorial_next());
        on_click(document, "tutorial-skip", &game, |g| g.app.skip_tutorial());
        on_click(document, "mute-btn", &game, |g| {
            let muted = !g.app.settings().muted;
            g.app.set_muted(muted);
        });

        for d in Difficulty::ALL {
            on_click(document, &difficulty_id(d), &game, move |g| {
                g.app.select_difficulty(d)
            });
        }
        for t in ThemeType::ALL {
            on_click(document, &theme_id(t), &game, move |g| g.app.select_theme(t));
        }
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().fit_canvas();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.render();
            g.update_dom();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Brickfall (native) starting...");
    log::info!("Native mode runs a headless autoplay demo - run with `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(autoplay::clock_seed);
    let difficulty = args
        .next()
        .and_then(|s| brickfall::Difficulty::from_str(&s))
        .unwrap_or_default();

    let report = autoplay::run(seed, difficulty);
    println!(
        "\n{} run (seed {}): score {}, best {}, {} layers in {:.1}s",
        difficulty.as_str(),
        seed,
        report.score,
        report.best,
        report.layers,
        report.seconds
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use brickfall::app::{App, Screen};
    use brickfall::audio::AudioManager;
    use brickfall::persistence::default_store;
    use brickfall::renderer::HeadlessScene;
    use brickfall::Difficulty;

    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up on runs the bot can't lose
    const MAX_FRAMES: u32 = 60 * 180;
    /// Chance the bot deliberately drops off-center
    const LATE_CHANCE: f32 = 0.2;

    pub struct Report {
        pub score: u32,
        pub best: u32,
        pub layers: usize,
        pub seconds: f32,
    }

    pub fn clock_seed() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Play one run with a timing bot against a headless scene
    pub fn run(seed: u64, difficulty: Difficulty) -> Report {
        let mut app = App::new(
            HeadlessScene::new(1280, 720),
            AudioManager::new().handle(),
            default_store(),
            seed,
        );
        let mut bot = Pcg32::seed_from_u64(seed.rotate_left(17));

        app.select_difficulty(difficulty);
        app.start();

        let mut frames = 0;
        let mut aim_for = None;
        while app.screen() == Screen::Playing && frames < MAX_FRAMES {
            app.frame(FRAME_DT);
            frames += 1;

            let engine = app.engine();
            let Some(offset) = engine.drop_offset() else {
                continue;
            };
            let layers = engine.stack_len();
            let (layer, aim) = *aim_for.get_or_insert_with(|| (layers, pick_aim(&mut bot)));
            if layer != layers {
                aim_for = Some((layers, pick_aim(&mut bot)));
                continue;
            }

            // Half a frame of travel either side of the aim point
            let window = engine.speed() * FRAME_DT * 0.5 + 0.01;
            if (offset - aim).abs() <= window {
                app.tap();
                let hud = app.hud();
                log::info!(
                    "Layer {:3}: offset {:+6.2} -> score {:4}{}",
                    layers,
                    offset,
                    hud.score,
                    if hud.fever { " FEVER" } else { "" }
                );
            }
        }

        if app.screen() == Screen::Playing {
            log::info!("Frame limit reached, abandoning run");
            app.back_to_menu();
        }

        let report = Report {
            score: app.hud().score,
            best: app.hud().best,
            layers: app.engine().stack_len(),
            seconds: frames as f32 * FRAME_DT,
        };
        app.dispose();
        report
    }

    /// Dead center most of the time, occasionally a few units off
    fn pick_aim(rng: &mut Pcg32) -> f32 {
        if rng.random::<f32>() < LATE_CHANCE {
            let miss = rng.random_range(1.0..8.0);
            if rng.random::<bool>() { miss } else { -miss }
        } else {
            0.0
        }
    }
}
