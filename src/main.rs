//! Evade Infinity entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use evade_infinity::audio::AudioManager;
    use evade_infinity::persistence::{LocalStorage, MemoryStorage, Storage};
    use evade_infinity::renderer::{Effects, RenderState, build_scene};
    use evade_infinity::session::Session;
    use evade_infinity::sim::{GameEvent, GamePhase, TickInput};
    use evade_infinity::{ParticleLevel, format_long_time, format_time};

    /// Max gap between taps that counts as a double tap
    const DOUBLE_TAP_MS: f64 = 300.0;

    type GameSession = Session<Box<dyn Storage>, AudioManager>;

    /// Held movement keys
    #[derive(Default)]
    struct HeldKeys {
        up: bool,
        down: bool,
        left: bool,
        right: bool,
    }

    impl HeldKeys {
        fn set(&mut self, key: &str, down: bool) -> bool {
            let slot = match key {
                "ArrowUp" | "w" | "W" => &mut self.up,
                "ArrowDown" | "s" | "S" => &mut self.down,
                "ArrowLeft" | "a" | "A" => &mut self.left,
                "ArrowRight" | "d" | "D" => &mut self.right,
                _ => return false,
            };
            *slot = down;
            true
        }

        fn direction(&self) -> Vec2 {
            let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
            Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
        }
    }

    /// Game instance holding all state
    struct Game {
        session: GameSession,
        effects: Effects,
        render_state: Option<RenderState>,
        input: TickInput,
        keys: HeldKeys,
        last_tap: f64,
        last_phase: GamePhase,
    }

    impl Game {
        fn new(seed: u64, bounds: Vec2) -> Self {
            let storage: Box<dyn Storage> = match LocalStorage::open() {
                Ok(storage) => Box::new(storage),
                Err(e) => {
                    log::warn!("LocalStorage unavailable ({}), progress will not be saved", e);
                    Box::new(MemoryStorage::new())
                }
            };
            let session = Session::new(seed, bounds, storage, AudioManager::new(&Default::default()));
            let effects = Effects::new(seed, bounds, &session.settings());
            Self {
                session,
                effects,
                render_state: None,
                input: TickInput::default(),
                keys: HeldKeys::default(),
                last_tap: f64::NEG_INFINITY,
                last_phase: GamePhase::Idle,
            }
        }

        fn start(&mut self, now: f64) {
            self.session.audio().resume();
            self.input = TickInput::default();
            self.session.start(now);
            log::info!("Run {} started", self.session.state.run_id);
        }

        /// Step the simulation and cosmetic effects for one frame
        fn update(&mut self, now: f64) -> Vec<GameEvent> {
            self.input.move_dir = self.keys.direction();
            let events = self.session.frame(&self.input, now);

            // Clear one-shot inputs after processing
            self.input.pointer = None;
            self.input.pause = false;
            self.input.slow = false;
            self.input.evade = false;

            for event in &events {
                self.effects.on_event(event, &self.session.state);
            }
            self.effects.update(self.session.state.bounds);

            let phase = self.session.state.phase;
            if phase != self.last_phase {
                log::debug!("Phase {:?} -> {:?}", self.last_phase, phase);
                self.last_phase = phase;
            }
            events
        }

        /// Render the current frame
        fn render(&mut self, now: f64) {
            let offset = self.effects.shake_offset();
            let settings = self.session.settings();
            let vertices = build_scene(&self.session.state, &self.effects, &settings, now, offset);

            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&vertices) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        render_state.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn resize(&mut self, canvas: &HtmlCanvasElement, dpr: f64) {
            let client_w = canvas.client_width().max(1);
            let client_h = canvas.client_height().max(1);
            let width = (client_w as f64 * dpr) as u32;
            let height = (client_h as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);

            let logical = (client_w as f32, client_h as f32);
            self.session.state.resize(logical.0, logical.1);
            self.effects
                .apply_settings(&self.session.settings(), Vec2::new(logical.0, logical.1));
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height, logical);
            }
        }

        fn tap(&mut self, pos: Vec2, now: f64) {
            self.input.pointer = Some(pos);
            if now - self.last_tap < DOUBLE_TAP_MS {
                self.input.slow = true;
            }
            self.last_tap = now;
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document, events: &[GameEvent]) {
            let hud = self.session.hud();
            let phase = self.session.state.phase;

            show(document, "title-screen", phase == GamePhase::Idle);
            show(
                document,
                "game-screen",
                matches!(phase, GamePhase::Countdown | GamePhase::Playing | GamePhase::Paused),
            );
            show(document, "pause-overlay", phase == GamePhase::Paused);

            set_text(document, "current-time", &hud.time);
            set_text(document, "game-best-time", &hud.best);
            set_text(document, "title-best-time", &hud.best);
            set_text(document, "countdown", hud.countdown.as_deref().unwrap_or(""));
            show(document, "countdown", hud.countdown.is_some());

            if hud.combo > 1 {
                set_text(document, "combo-display", &format!("{} COMBO", hud.combo));
                show(document, "combo-display", true);
            } else {
                show(document, "combo-display", false);
            }
            set_text(document, "powerup-indicator", &hud.powerups.join(" "));

            for (id, skill) in [("skill-slow", &hud.slow), ("skill-evade", &hud.evade)] {
                set_text(document, &format!("{}-cd", id), &skill.label);
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.class_list().toggle_with_force("disabled", skill.disabled);
                }
            }

            if let Some(el) = document.get_element_by_id("game-screen") {
                let _ = el
                    .class_list()
                    .toggle_with_force("danger", hud.danger > 0.5 && phase == GamePhase::Playing);
            }

            for event in events {
                match event {
                    GameEvent::NearMiss { score, .. } => {
                        set_text(document, "near-miss", &format!("NEAR MISS +{}", score));
                        show(document, "near-miss", true);
                    }
                    GameEvent::EventWarning(kind) => {
                        set_text(document, "event-warning", kind.warning());
                        show(document, "event-warning", true);
                    }
                    GameEvent::EventStarted(_) => show(document, "event-warning", false),
                    GameEvent::RunStarted => show(document, "gameover-screen", false),
                    GameEvent::ShowResults(_) => self.show_results(document),
                    _ => {}
                }
            }
        }

        fn show_results(&self, document: &Document) {
            let Some(results) = self.session.results() else {
                return;
            };
            set_text(document, "result-time", &format_time(results.summary.elapsed_ms));
            set_text(document, "result-best", &format_time(results.best_time));
            set_text(document, "stat-nearmiss", &results.summary.near_misses.to_string());
            set_text(document, "stat-items", &results.summary.items.to_string());
            show(document, "new-record", results.is_new_record);
            show(document, "gameover-screen", true);
            show(document, "game-screen", false);
        }

        /// Fill the ranking screen from the saved top times
        fn update_ranking(&self, document: &Document) {
            let persistence = self.session.persistence();
            let stats = persistence.stats();
            let list = persistence
                .top_scores()
                .entries
                .iter()
                .enumerate()
                .map(|(i, t)| format!("<li><span>{}</span><span>{}</span></li>", i + 1, format_time(*t)))
                .collect::<String>();
            if let Some(el) = document.get_element_by_id("ranking-list") {
                if list.is_empty() {
                    el.set_inner_html("<li>No records yet</li>");
                } else {
                    el.set_inner_html(&list);
                }
            }
            set_text(document, "total-playtime", &format_long_time(stats.total_play_time));
            set_text(document, "total-plays", &stats.total_deaths.to_string());
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    fn now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Evade Infinity starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        show(&document, "loading", false);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        let logical = (client_w as f32, client_h as f32);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, Vec2::new(logical.0, logical.1))));
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        match RenderState::new(surface, &adapter, width, height, logical).await {
                            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
                            Err(e) => log::error!("Renderer unavailable: {}", e),
                        }
                    }
                    Err(e) => log::error!("No GPU adapter: {}", e),
                }
            }
            Err(e) => log::error!("Failed to create surface: {}", e),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_settings(game.clone());
        setup_auto_pause(game.clone());
        setup_resize(canvas, game.clone());

        request_animation_frame(game);

        log::info!("Evade Infinity running!");
    }

    fn listen(
        target: &web_sys::EventTarget,
        event: &str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        if target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::warn!("Failed to attach {} listener", event);
        }
        closure.forget();
    }

    fn touch_pos(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Vec2> {
        let touch = event.touches().get(0)?;
        let rect = canvas.get_bounding_client_rect();
        Some(Vec2::new(
            touch.client_x() as f32 - rect.left() as f32,
            touch.client_y() as f32 - rect.top() as f32,
        ))
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse move steers the player
        {
            let game = game.clone();
            listen(canvas, "mousemove", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                game.borrow_mut().input.pointer =
                    Some(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
            });
        }

        // Touch start (double tap triggers slow)
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            listen(canvas, "touchstart", move |event| {
                event.prevent_default();
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                if let Some(pos) = touch_pos(&canvas_clone, event) {
                    game.borrow_mut().tap(pos, now());
                }
            });
        }

        // Touch move
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            listen(canvas, "touchmove", move |event| {
                event.prevent_default();
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                if let Some(pos) = touch_pos(&canvas_clone, event) {
                    game.borrow_mut().input.pointer = Some(pos);
                }
            });
        }

        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            listen(&window, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let mut g = game.borrow_mut();
                let key = event.key();
                if g.keys.set(&key, true) {
                    event.prevent_default();
                    return;
                }
                match key.as_str() {
                    "Escape" => g.input.pause = true,
                    " " => {
                        event.prevent_default();
                        g.input.slow = true;
                    }
                    "Shift" => g.input.evade = true,
                    _ => {}
                }
            });
        }
        {
            listen(&window, "keyup", move |event| {
                if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                    game.borrow_mut().keys.set(&event.key(), false);
                }
            });
        }
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(web_sys::Event) + 'static) {
        match document.get_element_by_id(id) {
            Some(el) => listen(&el, "click", handler),
            None => log::debug!("No #{} element", id),
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        for id in ["start-btn", "retry-btn"] {
            let game = game.clone();
            on_click(&document, id, move |_| game.borrow_mut().start(now()));
        }

        for id in ["title-btn", "pause-title-btn"] {
            let game = game.clone();
            on_click(&document, id, move |_| {
                game.borrow_mut().session.return_to_idle();
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    show(&document, "gameover-screen", false);
                }
            });
        }

        {
            let game = game.clone();
            on_click(&document, "resume-btn", move |_| {
                game.borrow_mut().session.resume(now());
            });
        }

        for (open, screen) in [
            ("howto-btn", "howto-screen"),
            ("ranking-btn", "ranking-screen"),
            ("settings-btn", "settings-screen"),
        ] {
            let game = game.clone();
            on_click(&document, open, move |_| {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    if screen == "ranking-screen" {
                        game.borrow().update_ranking(&document);
                    }
                    show(&document, screen, true);
                }
            });
        }

        for (back, screen) in [
            ("howto-back-btn", "howto-screen"),
            ("ranking-back-btn", "ranking-screen"),
            ("settings-back-btn", "settings-screen"),
        ] {
            on_click(&document, back, move |_| {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    show(&document, screen, false);
                }
            });
        }
    }

    /// Read the settings form into the session
    fn read_settings(document: &Document, game: &mut Game) {
        let mut settings = game.session.settings();
        let value = |id: &str| {
            document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        };
        if let Some(input) = value("bgm-volume") {
            settings.bgm_volume = input.value().parse().unwrap_or(settings.bgm_volume);
        }
        if let Some(input) = value("se-volume") {
            settings.se_volume = input.value().parse().unwrap_or(settings.se_volume);
        }
        if let Some(input) = value("shake-toggle") {
            settings.screen_shake = input.checked();
        }
        if let Some(select) = document
            .get_element_by_id("particle-level")
            .and_then(|el| el.dyn_into::<web_sys::HtmlSelectElement>().ok())
        {
            settings.particle_level =
                ParticleLevel::from_str(&select.value()).unwrap_or(settings.particle_level);
        }

        set_text(document, "bgm-value", &settings.bgm_volume.to_string());
        set_text(document, "se-value", &settings.se_volume.to_string());
        game.session.save_settings(settings);
        let bounds = game.session.state.bounds;
        let settings = game.session.settings();
        game.effects.apply_settings(&settings, bounds);
    }

    fn setup_settings(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Reflect saved settings into the form
        let settings = game.borrow().session.settings();
        if let Some(input) = document
            .get_element_by_id("bgm-volume")
            .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            input.set_value(&settings.bgm_volume.to_string());
        }
        if let Some(input) = document
            .get_element_by_id("se-volume")
            .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            input.set_value(&settings.se_volume.to_string());
        }
        if let Some(input) = document
            .get_element_by_id("shake-toggle")
            .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            input.set_checked(settings.screen_shake);
        }
        if let Some(select) = document
            .get_element_by_id("particle-level")
            .and_then(|el| el.dyn_into::<web_sys::HtmlSelectElement>().ok())
        {
            select.set_value(settings.particle_level.as_str());
        }
        set_text(&document, "bgm-value", &settings.bgm_volume.to_string());
        set_text(&document, "se-value", &settings.se_volume.to_string());

        for (id, event) in [
            ("bgm-volume", "input"),
            ("se-volume", "input"),
            ("shake-toggle", "change"),
            ("particle-level", "change"),
        ] {
            let Some(el) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            listen(&el, event, move |_| {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    read_settings(&document, &mut game.borrow_mut());
                }
            });
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            listen(&document, "visibilitychange", move |_| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden
                    && game.borrow_mut().session.pause(now())
                {
                    log::info!("Auto-paused (tab hidden)");
                }
            });
        }

        // Window blur (click outside)
        listen(&window, "blur", move |_| {
            if game.borrow_mut().session.pause(now()) {
                log::info!("Auto-paused (window blur)");
            }
        });
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        listen(&window, "resize", move |_| {
            let dpr = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
            game.borrow_mut().resize(&canvas, dpr);
        });
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
            let events = g.update(time);
            g.render(time);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document, &events);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless demo: a seeded run steered away from the nearest obstacle
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use evade_infinity::audio::AudioManager;
    use evade_infinity::persistence::MemoryStorage;
    use evade_infinity::session::Session;
    use evade_infinity::sim::{GamePhase, TickInput};
    use evade_infinity::{Settings, format_long_time, format_time};
    use glam::Vec2;

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const MAX_RUN_MS: f64 = 180_000.0;

    env_logger::init();
    log::info!("Evade Infinity (native) starting...");
    log::info!("Native mode runs a headless demo - build for wasm32 to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let bounds = Vec2::new(800.0, 600.0);
    let mut session = Session::new(
        seed,
        bounds,
        MemoryStorage::new(),
        AudioManager::new(&Settings::default()),
    );

    let mut now = 0.0;
    session.start(now);
    while session.results().is_none() && now < MAX_RUN_MS {
        now += FRAME_MS;
        let state = &session.state;
        let mut input = TickInput::default();
        if state.phase == GamePhase::Playing {
            let pos = state.player.pos;
            let threat = state
                .obstacles
                .obstacles
                .iter()
                .map(|o| o.pos)
                .min_by(|a, b| a.distance_squared(pos).total_cmp(&b.distance_squared(pos)));
            input.pointer = Some(match threat {
                Some(t) if t.distance(pos) < 120.0 => {
                    (pos + (pos - t).normalize_or_zero() * 60.0).clamp(Vec2::ZERO, bounds)
                }
                _ => bounds / 2.0,
            });
            input.evade = threat.is_some_and(|t| t.distance(pos) < 40.0);
        }
        session.frame(&input, now);
    }

    match session.results() {
        Some(results) => {
            println!("Seed {}: survived {}", seed, format_time(results.summary.elapsed_ms));
            println!(
                "  near misses {}  items {}  max combo {}  score {}",
                results.summary.near_misses,
                results.summary.items,
                results.summary.max_combo,
                results.summary.score
            );
        }
        None => println!("Seed {}: still alive after {}", seed, format_time(MAX_RUN_MS)),
    }
    let stats = session.persistence().stats();
    println!("  total play time {}", format_long_time(stats.total_play_time));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
