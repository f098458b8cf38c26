//! Fireball Dodge entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use fireball_dodge::assets::{AssetKey, LoadedAssets};
use fireball_dodge::platform::InputHandler;
use fireball_dodge::renderer::{FrameLayout, Hud, RenderState, SpriteBatch, build_frame};
use fireball_dodge::sim::Viewport;
use fireball_dodge::{DodgeScene, SceneDirector};

/// Everything the loop needs once startup has succeeded
struct Game {
    director: SceneDirector<DodgeScene>,
    render_state: RenderState,
    layout: FrameLayout,
    batch: SpriteBatch,
    hud: Hud,
    input: InputHandler,
}

impl Game {
    fn new(director: SceneDirector<DodgeScene>, render_state: RenderState, assets: &LoadedAssets) -> Self {
        let hud = Hud::new(Some(render_state.max_texture_side()));
        Self {
            director,
            render_state,
            layout: FrameLayout {
                player_grid: assets.player_grid(),
                tile_size: assets.get(AssetKey::Tile).size(),
            },
            batch: SpriteBatch::new(),
            hud,
            input: InputHandler::new(),
        }
    }

    /// Advance the scene by `dt` seconds
    fn update(&mut self, dt: f32) {
        let report = self.director.frame(&self.input.current(), dt);
        if report.restarted {
            log::info!("Restarted (round {})", self.director.rounds_started());
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.render_state.resize(width, height);
        self.director
            .resize(Viewport::new(width as f32, height as f32));
    }

    /// Render the current frame
    fn render(&mut self) {
        let round = self.director.round();
        let tuning = self.director.scene().tuning();
        build_frame(&mut self.batch, round, &self.layout, tuning);
        let hud = self.hud.build(round.score.text(), round.viewport, tuning);

        match self.render_state.render(&self.batch, &hud) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = self.render_state.size;
                self.render_state.resize(w, h);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory!");
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::HtmlCanvasElement;

    use fireball_dodge::Tuning;
    use fireball_dodge::assets::fetch_all;

    use super::{DodgeScene, Game, RenderState, SceneDirector, Viewport};

    /// Loop state shared with the browser callbacks
    struct WebGame {
        game: Game,
        last_time: f64,
    }

    fn inner_size(window: &web_sys::Window) -> (u32, u32) {
        let w = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(800.0);
        let h = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(600.0);
        (w.max(1.0) as u32, h.max(1.0) as u32)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }

        log::info!("Fireball Dodge starting...");

        if let Err(e) = start().await {
            log::error!("Startup failed: {}", e);
        }
    }

    async fn start() -> Result<(), String> {
        let tuning = Tuning::load();
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()
            .map_err(|_| "not a canvas")?;

        // Full-window surface, size read once
        let (width, height) = inner_size(&window);
        canvas.set_width(width);
        canvas.set_height(height);

        let mut assets = fetch_all(&tuning.asset_root, tuning.frame_size)
            .await
            .map_err(|e| e.to_string())?;

        let seed = js_sys::Date::now() as u64;
        log::info!("Game initialized with seed: {}", seed);
        let max_dt = tuning.max_frame_dt;
        let director = SceneDirector::start(
            DodgeScene::new(tuning, seed),
            &mut assets,
            Viewport::new(width as f32, height as f32),
            max_dt,
        )
        .map_err(|e| e.to_string())?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| e.to_string())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| e.to_string())?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height, &assets)
            .await
            .map_err(|e| e.to_string())?;

        let game = Rc::new(RefCell::new(WebGame {
            game: Game::new(director, render_state, &assets),
            last_time: 0.0,
        }));

        setup_input_handlers(game.clone());
        setup_resize_handler(canvas, game.clone());

        request_animation_frame(game);
        log::info!("Fireball Dodge running!");
        Ok(())
    }

    fn setup_input_handlers(game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        for (name, pressed) in [("keydown", true), ("keyup", false)] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                if g.game.input.process_dom_code(&event.code(), pressed) {
                    event.prevent_default();
                }
            });
            let _ = window.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur (click outside) releases held keys
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().game.input.reset();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(canvas: HtmlCanvasElement, game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = inner_size(&window);
            canvas.set_width(width);
            canvas.set_height(height);
            game.borrow_mut().game.resize(width, height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<WebGame>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.game.update(dt);
            g.game.render();
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
mod native_game {
    use std::sync::Arc;
    use std::time::{Instant, SystemTime, UNIX_EPOCH};

    use anyhow::Context;
    use winit::application::ApplicationHandler;
    use winit::dpi::LogicalSize;
    use winit::event::WindowEvent;
    use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
    use winit::window::{Window, WindowId};

    use fireball_dodge::Tuning;
    use fireball_dodge::assets::AssetLoader;
    use fireball_dodge::renderer::RenderError;

    use super::{DodgeScene, Game, LoadedAssets, RenderState, SceneDirector, Viewport};

    const INITIAL_SIZE: (f64, f64) = (800.0, 600.0);

    struct Running {
        window: Arc<Window>,
        game: Game,
        last_frame: Instant,
    }

    struct App {
        tuning: Tuning,
        assets: LoadedAssets,
        running: Option<Running>,
        error: Option<anyhow::Error>,
    }

    impl App {
        async fn start(&mut self, window: Arc<Window>) -> anyhow::Result<Running> {
            let size = window.inner_size();
            let (width, height) = (size.width.max(1), size.height.max(1));

            let seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default();
            log::info!("Game initialized with seed: {}", seed);

            let director = SceneDirector::start(
                DodgeScene::new(self.tuning.clone(), seed),
                &mut self.assets,
                Viewport::new(width as f32, height as f32),
                self.tuning.max_frame_dt,
            )?;

            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
            let surface = instance
                .create_surface(window.clone())
                .map_err(RenderError::from)?;
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(RenderError::from)?;
            log::info!("Using adapter: {:?}", adapter.get_info().name);

            let render_state = RenderState::new(surface, &adapter, width, height, &self.assets).await?;

            Ok(Running {
                window,
                game: Game::new(director, render_state, &self.assets),
                last_frame: Instant::now(),
            })
        }

        fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
            log::error!("{:#}", error);
            self.error = Some(error);
            event_loop.exit();
        }
    }

    impl ApplicationHandler for App {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.running.is_some() {
                return;
            }

            let attrs = Window::default_attributes()
                .with_title("Fireball Dodge")
                .with_inner_size(LogicalSize::new(INITIAL_SIZE.0, INITIAL_SIZE.1));
            let window = match event_loop.create_window(attrs) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    self.fail(event_loop, anyhow::Error::new(e).context("failed to create window"));
                    return;
                }
            };

            match pollster::block_on(self.start(window)) {
                Ok(running) => {
                    running.window.request_redraw();
                    self.running = Some(running);
                }
                Err(e) => self.fail(event_loop, e),
            }
        }

        fn window_event(
            &mut self,
            event_loop: &ActiveEventLoop,
            _window_id: WindowId,
            event: WindowEvent,
        ) {
            let Some(running) = self.running.as_mut() else {
                return;
            };

            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::Resized(size) => running.game.resize(size.width, size.height),
                WindowEvent::KeyboardInput { event, .. } => {
                    running.game.input.process_key(event.physical_key, event.state);
                }
                WindowEvent::Focused(false) => running.game.input.reset(),
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = now.duration_since(running.last_frame).as_secs_f32();
                    running.last_frame = now;

                    running.game.update(dt);
                    running.game.render();
                    running.window.request_redraw();
                }
                _ => {}
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Fireball Dodge (native) starting...");

        let tuning = Tuning::load();
        let assets = AssetLoader::new(&tuning.asset_root)
            .load_all(tuning.frame_size)
            .context("failed to load assets")?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            tuning,
            assets,
            running: None,
            error: None,
        };
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
