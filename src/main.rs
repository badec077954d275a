//! Cat Descent entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::{Vec2, Vec3};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use cat_descent::Settings;
    use cat_descent::assets::AssetError;
    use cat_descent::audio::AudioManager;
    use cat_descent::platform::{Hud, SceneGraph, dispatch_events, sync_scene};
    use cat_descent::sim::{
        DragEvent, EntityId, EntityKind, FixedStep, GamePhase, GameScene, Mesh, ModelKind, TickInput, Transform,
        WorldPlanes, run_frame,
    };

    // Bridge to the page's renderer and model loader
    #[wasm_bindgen(inline_js = "
        function renderer() {
            return window.catDescent || null;
        }

        export function scene_add(id, kind, transform) {
            const r = renderer();
            if (r && r.add) r.add(id, kind, JSON.parse(transform));
        }

        export function scene_remove(id) {
            const r = renderer();
            if (r && r.remove) r.remove(id);
        }

        export function scene_sync(frame) {
            const r = renderer();
            if (r && r.sync) r.sync(JSON.parse(frame));
        }

        export function load_model(path) {
            const r = renderer();
            if (r && r.loadModel) return r.loadModel(path);
            return Promise.reject(new Error('no model loader registered'));
        }
    ")]
    extern "C" {
        fn scene_add(id: u32, kind: &str, transform: &str);
        fn scene_remove(id: u32);
        fn scene_sync(frame: &str);
        #[wasm_bindgen(catch)]
        fn load_model(path: &str) -> Result<js_sys::Promise, JsValue>;
    }

    /// Scene graph living on the JS side. Transform updates are batched
    /// into one message per frame.
    #[derive(Default)]
    struct JsSceneGraph {
        frame: Frame,
    }

    #[derive(Default, serde::Serialize)]
    struct Frame {
        player: Option<Transform>,
        camera: Option<(Vec3, Vec3)>,
        planes: Option<WorldPlanes>,
        entities: Vec<(u32, Transform)>,
    }

    impl JsSceneGraph {
        fn flush(&mut self) {
            let frame = std::mem::take(&mut self.frame);
            match serde_json::to_string(&frame) {
                Ok(json) => scene_sync(&json),
                Err(e) => log::warn!("Failed to encode frame: {e}"),
            }
        }
    }

    impl SceneGraph for JsSceneGraph {
        fn add(&mut self, id: EntityId, kind: EntityKind, transform: &Transform) {
            let Ok(json) = serde_json::to_string(transform) else {
                return;
            };
            scene_add(id.0, &format!("{kind:?}"), &json);
        }

        fn remove(&mut self, id: EntityId) {
            scene_remove(id.0);
        }

        fn set_transform(&mut self, id: EntityId, transform: &Transform) {
            self.frame.entities.push((id.0, *transform));
        }

        fn set_player(&mut self, transform: &Transform) {
            self.frame.player = Some(*transform);
        }

        fn set_camera(&mut self, position: Vec3, target: Vec3) {
            self.frame.camera = Some((position, target));
        }

        fn set_planes(&mut self, planes: WorldPlanes) {
            self.frame.planes = Some(planes);
        }
    }

    /// HUD backed by DOM elements
    struct DomHud {
        document: web_sys::Document,
    }

    impl DomHud {
        fn set_text(&self, selector: &str, text: &str) {
            if let Some(el) = self.document.query_selector(selector).ok().flatten() {
                el.set_text_content(Some(text));
            }
        }

        fn set_visible(&self, id: &str, visible: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
            }
        }
    }

    impl Hud for DomHud {
        fn set_health(&mut self, percent: f32) {
            if let Some(el) = self.document.get_element_by_id("health-fill") {
                let _ = el.set_attribute("style", &format!("width: {percent:.1}%"));
            }
            self.set_text("#hud-health .hud-value", &format!("{percent:.0}"));
        }

        fn update_round_counter(&mut self, round: u32) {
            self.set_text("#hud-round .hud-value", &round.to_string());
        }

        fn update_score(&mut self, score: u32) {
            self.set_text("#hud-score .hud-value", &score.to_string());
        }

        fn show_start_menu(&mut self) {
            self.set_visible("start-menu", true);
            self.set_visible("game-over", false);
            self.set_visible("hud", false);
        }

        fn show_game_over(&mut self, score: u32, round: u32) {
            self.set_text("#final-score", &score.to_string());
            self.set_text("#final-round", &round.to_string());
            self.set_visible("game-over", true);
        }

        fn hide_menus(&mut self) {
            self.set_visible("start-menu", false);
            self.set_visible("game-over", false);
            self.set_visible("hud", true);
        }
    }

    /// Game instance holding all state
    struct Game {
        scene: GameScene,
        settings: Settings,
        clock: FixedStep,
        input: TickInput,
        dragging: bool,
        last_time: f64,
        renderer: JsSceneGraph,
        hud: DomHud,
        audio: AudioManager,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, document: web_sys::Document) -> Self {
            let settings = Settings::default();
            let mut scene = GameScene::new(seed, cat_descent::Tuning::default());
            scene.apply_settings(&settings);
            let mut audio = AudioManager::new();
            audio.apply_settings(&settings);

            Self {
                scene,
                settings,
                clock: FixedStep::default(),
                input: TickInput::default(),
                dragging: false,
                last_time: 0.0,
                renderer: JsSceneGraph::default(),
                hud: DomHud { document },
                audio,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run simulation ticks, then hand results to the collaborators
        fn update(&mut self, dt: f32, time: f64) {
            run_frame(&mut self.scene, &mut self.clock, &mut self.input, dt);

            let events = self.scene.drain_events();
            dispatch_events(&events, &mut self.renderer, &mut self.hud, &mut self.audio);
            sync_scene(&self.scene.snapshot(), &mut self.renderer);
            self.renderer.flush();

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
            if self.settings.show_fps {
                self.hud.set_text("#hud-fps .hud-value", &self.fps.to_string());
            }
        }

        fn start(&mut self) {
            self.audio.resume();
            self.input = TickInput::default();
            self.dragging = false;
            self.clock = FixedStep::default();
            self.scene.start();
        }

        fn set_key(&mut self, key: &str, down: bool) -> bool {
            let keys = &mut self.input.keys;
            match key {
                "ArrowUp" | "w" | "W" => keys.forward = down,
                "ArrowDown" | "s" | "S" => keys.back = down,
                "ArrowLeft" | "a" | "A" => keys.left = down,
                "ArrowRight" | "d" | "D" => keys.right = down,
                _ => return false,
            }
            true
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Cat Descent starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, document.clone())));
        log::info!("Game initialized with seed: {}", seed);

        load_models(game.clone());
        setup_input_handlers(&canvas, game.clone());
        setup_menu_buttons(game.clone());
        game.borrow_mut().hud.show_start_menu();

        // Start game loop
        request_animation_frame(game);

        log::info!("Cat Descent running!");
    }

    /// Ask the page for every model; entities pick them up once resolved
    fn load_models(game: Rc<RefCell<Game>>) {
        for kind in ModelKind::ALL {
            if !game.borrow_mut().scene.models_mut().request(kind) {
                continue;
            }
            let game = game.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch_mesh(kind.path()).await;
                game.borrow_mut().scene.models_mut().resolve(kind, result);
            });
        }
    }

    async fn fetch_mesh(path: &str) -> Result<Mesh, AssetError> {
        let load_error = |e: JsValue| AssetError::Load {
            path: path.to_string(),
            reason: format!("{e:?}"),
        };
        let promise = load_model(path).map_err(load_error)?;
        let value = JsFuture::from(promise).await.map_err(load_error)?;

        let field = |name: &str| js_sys::Reflect::get(&value, &JsValue::from_str(name)).map_err(load_error);
        let positions = js_sys::Float32Array::new(&field("positions")?).to_vec();
        let normals = js_sys::Float32Array::new(&field("normals")?).to_vec();
        let indices = js_sys::Uint32Array::new(&field("indices")?).to_vec();
        cat_descent::assets::mesh_from_buffers(path, &positions, &normals, &indices)
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Keyboard: held keys, Escape aborts to the menu
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                if key == "Escape" {
                    g.scene.abort_to_menu();
                    g.input = TickInput::default();
                } else if g.set_key(&key, true) {
                    event.prevent_default();
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().set_key(&event.key(), false);
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Losing focus releases everything held
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.audio.set_focused(false);
                g.input.keys = Default::default();
                if g.dragging {
                    g.dragging = false;
                    g.input.drag.push(DragEvent::End);
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().audio.set_focused(true);
            });
            let _ = window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse drag orbits the camera
        let pointer = |event: &MouseEvent| Vec2::new(event.client_x() as f32, event.client_y() as f32);
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.dragging = true;
                g.input.drag.push(DragEvent::Start(pointer(&event)));
            });
            let _ = canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.dragging {
                    g.input.drag.push(DragEvent::Move(pointer(&event)));
                }
            });
            let _ = canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        for name in ["mouseup", "mouseleave"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.dragging {
                    g.dragging = false;
                    g.input.drag.push(DragEvent::End);
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_menu_buttons(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        for id in ["start-btn", "restart-btn"] {
            let Some(btn) = document.get_element_by_id(id) else {
                log::warn!("Missing #{id}");
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.scene.phase() != GamePhase::Playing {
                    g.start();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                cat_descent::consts::SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
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
mod headless {
    use cat_descent::Tuning;
    use cat_descent::assets::ModelLibrary;
    use cat_descent::audio::NullAudio;
    use cat_descent::consts::SIM_DT;
    use cat_descent::platform::{LogHud, NullScene, dispatch_events, sync_scene};
    use cat_descent::sim::{DirectionKeys, FixedStep, GamePhase, GameScene, Streamable, TickInput, run_frame};

    /// Give up after this much simulated time
    const TIME_LIMIT_SECS: f32 = 300.0;

    /// Steer toward the nearest halo below the cat. Camera yaw stays at
    /// zero, so forward is -Z and right is +X.
    fn autopilot(scene: &GameScene) -> DirectionKeys {
        let player = scene.player().position();
        let target = scene
            .halos()
            .live()
            .iter()
            .map(|h| h.position())
            .filter(|p| p.y < player.y)
            .max_by(|a, b| a.y.total_cmp(&b.y));

        let Some(target) = target else {
            return DirectionKeys::default();
        };
        const DEADZONE: f32 = 0.3;
        let (dx, dz) = (target.x - player.x, target.z - player.z);
        DirectionKeys {
            forward: dz < -DEADZONE,
            back: dz > DEADZONE,
            left: dx < -DEADZONE,
            right: dx > DEADZONE,
        }
    }

    pub fn run(seed: u64, tuning: Tuning) {
        let mut scene = GameScene::with_models(seed, tuning, ModelLibrary::with_builtin_meshes());
        let (mut renderer, mut hud, mut audio) = (NullScene, LogHud, NullAudio);
        let mut clock = FixedStep::default();
        let mut input = TickInput::default();

        scene.start();
        let mut elapsed = 0.0;
        while scene.phase() == GamePhase::Playing && elapsed < TIME_LIMIT_SECS {
            input.keys = autopilot(&scene);
            run_frame(&mut scene, &mut clock, &mut input, SIM_DT);
            dispatch_events(&scene.drain_events(), &mut renderer, &mut hud, &mut audio);
            sync_scene(&scene.snapshot(), &mut renderer);
            elapsed += SIM_DT;
        }

        log::info!(
            "Finished after {:.1}s ({} ticks): score {}, round {}, health {:.0}",
            elapsed,
            scene.time_ticks(),
            scene.score(),
            scene.round(),
            scene.health().health()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Cat Descent (native) starting headless run...");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| cat_descent::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Bad tuning file {path}: {e}");
                std::process::exit(1);
            }
        },
        None => cat_descent::Tuning::default(),
    };

    headless::run(seed, tuning);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
