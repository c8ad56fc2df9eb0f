use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::Deserialize;
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};

use crate::audio::Audio;
use crate::font;
use crate::input::Input;
use crate::logging::{init_logging, LoggingConfig};
use crate::window::{Window, WindowConfig, WindowRegistry};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Where frames are drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// The event loop thread draws whenever a frame interval has elapsed.
    #[default]
    SingleThreaded,
    /// A dedicated render thread draws; the event loop only updates.
    MultiThreaded,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub run_mode: RunMode,
    pub target_fps: u32,
    /// Claim the audio device slot at startup (the stream itself is opened by
    /// the frontend through [`Audio::setup`]).
    pub audio: bool,
    /// `env_logger` filter; falls back to `RUST_LOG`.
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            run_mode: RunMode::SingleThreaded,
            target_fps: 60,
            audio: false,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&text)
    }

    /// Seconds between drawn frames.
    pub fn frame_interval(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read config: {e}"),
            ConfigError::Parse(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ── Frontend ──────────────────────────────────────────────────────────────────

/// Application driven by the run loop.
///
/// `draw` runs on the render thread in [`RunMode::MultiThreaded`], so the
/// frontend must be `Send`.
pub trait Frontend: Send + 'static {
    fn start(&mut self, _ctx: &mut Context) {}
    /// Once per loop iteration, after input has been processed.
    fn update(&mut self, _ctx: &mut Context, _dt: f32) {}
    /// Draw one frame into `window`; the frame is already begun.
    fn draw(&mut self, window: &Window, input: &Input, dt: f32);
}

/// Everything the event loop thread owns.
#[derive(Default)]
pub struct Context {
    pub windows: WindowRegistry,
    pub input: Input,
    pub audio: Option<Audio>,
    quit: bool,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main_window(&self) -> Option<&Arc<Window>> {
        self.windows.main()
    }

    /// Stop the loop after the current iteration.
    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

// ── Timing ────────────────────────────────────────────────────────────────────

/// Wall-clock delta between ticks, in seconds at microsecond resolution.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Instant,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let micros = now.duration_since(self.last).as_micros();
        self.last = now;
        micros as f32 * 0.000_001
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Begin a frame on `window` and let the frontend fill it.
fn draw_frame<F: Frontend>(window: &Window, frontend: &Mutex<F>, input: &Input, dt: f32) {
    window.update();
    lock(frontend).draw(window, input, dt);
}

// ── Render thread ─────────────────────────────────────────────────────────────

struct RenderThread {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl RenderThread {
    fn spawn<F: Frontend>(
        window: Arc<Window>,
        frontend: Arc<Mutex<F>>,
        input: Arc<Mutex<Input>>,
        interval: f32,
    ) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name("render".into())
            .spawn(move || {
                let mut timer = FrameTimer::new();
                let mut waited = 0.0;
                while flag.load(Ordering::Acquire) {
                    waited += timer.tick();
                    if waited <= interval {
                        std::thread::sleep(Duration::from_secs_f32(interval - waited));
                        continue;
                    }
                    let snapshot = lock(&input).clone();
                    draw_frame(&window, &frontend, &snapshot, waited);
                    waited = 0.0;
                }
            })?;
        Ok(Self { running, handle })
    }

    fn stop(self) {
        self.running.store(false, Ordering::Release);
        if self.handle.join().is_err() {
            log::error!("Render thread panicked");
        }
    }
}

// ── App (winit ApplicationHandler) ────────────────────────────────────────────

struct App<F: Frontend> {
    config: EngineConfig,
    frontend: Arc<Mutex<F>>,
    ctx: Context,
    timer: FrameTimer,
    time_till_render: f32,
    /// Input as of the last update, read by the render thread.
    shared_input: Arc<Mutex<Input>>,
    render_thread: Option<RenderThread>,
    started: bool,
}

impl<F: Frontend> App<F> {
    fn new(config: EngineConfig, frontend: F) -> Self {
        Self {
            config,
            frontend: Arc::new(Mutex::new(frontend)),
            ctx: Context::new(),
            timer: FrameTimer::new(),
            time_till_render: 0.0,
            shared_input: Arc::new(Mutex::new(Input::new())),
            render_thread: None,
            started: false,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("Starting...");
        let config = self.config.window.clone();
        let opened = self
            .ctx
            .windows
            .insert_with(|id| Window::open(event_loop, id, config));
        if let Err(e) = opened {
            log::error!("Could not open the main window: {e}");
            event_loop.exit();
            return;
        }

        font::sheet();

        if self.config.audio {
            match Audio::new() {
                Ok(audio) => self.ctx.audio = Some(audio),
                Err(e) => log::error!("Audio unavailable: {e}"),
            }
        }

        lock(&self.frontend).start(&mut self.ctx);

        if self.config.run_mode == RunMode::MultiThreaded {
            if let Some(window) = self.ctx.main_window() {
                let spawned = RenderThread::spawn(
                    Arc::clone(window),
                    Arc::clone(&self.frontend),
                    Arc::clone(&self.shared_input),
                    self.config.frame_interval(),
                );
                match spawned {
                    Ok(thread) => self.render_thread = Some(thread),
                    Err(e) => log::error!("Could not start render thread, drawing inline: {e}"),
                }
            }
        }

        self.timer = FrameTimer::new();
        log::info!("Started!");
    }
}

impl<F: Frontend> ApplicationHandler for App<F> {
    fn new_events(&mut self, _event_loop: &ActiveEventLoop, _cause: StartCause) {
        self.ctx.input.update();
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.started {
            self.started = true;
            self.start(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            event_loop.exit();
            return;
        }
        let target = self.ctx.windows.find_native(window_id);
        if let Some(window) = target.and_then(|id| self.ctx.windows.get(id)) {
            window.handle_event(&event);
        }
        self.ctx.input.handle_event(&event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.started {
            return;
        }
        let dt = self.timer.tick();
        lock(&self.frontend).update(&mut self.ctx, dt);
        if self.ctx.quit_requested() {
            event_loop.exit();
            return;
        }

        let interval = self.config.frame_interval();
        if self.render_thread.is_some() {
            *lock(&self.shared_input) = self.ctx.input.clone();
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                Instant::now() + Duration::from_secs_f32(interval),
            ));
            return;
        }

        self.time_till_render += dt;
        if self.time_till_render >= interval {
            if let Some(window) = self.ctx.windows.main() {
                draw_frame(window, &self.frontend, &self.ctx.input, dt);
            }
            self.time_till_render -= interval;
        }
        let remaining = (interval - self.time_till_render).max(0.0);
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            Instant::now() + Duration::from_secs_f32(remaining),
        ));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("Shutting down...");
        if let Some(thread) = self.render_thread.take() {
            thread.stop();
        }
        self.ctx.windows.clear();
        self.ctx.audio = None;
    }
}

// ── EngineBuilder ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self { self.config = config; self }
    pub fn with_title(mut self, title: &str) -> Self { self.config.window.title = title.into(); self }
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.window.physical_width = width;
        self.config.window.physical_height = height;
        self
    }
    pub fn with_scale(mut self, scale: i32) -> Self { self.config.window.resolution_scale = scale.max(1); self }
    pub fn with_target_fps(mut self, fps: u32) -> Self { self.config.target_fps = fps; self }
    pub fn multithreaded(mut self) -> Self { self.config.run_mode = RunMode::MultiThreaded; self }
    pub fn with_audio(mut self) -> Self { self.config.audio = true; self }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `frontend` until the main window closes or it requests quit.
    pub fn run<F: Frontend>(self, frontend: F) -> Result<(), EventLoopError> {
        init_logging(LoggingConfig {
            env_filter: self.config.log_filter.clone(),
            ..Default::default()
        });
        let event_loop = EventLoop::new()?;
        let mut app = App::new(self.config, frontend);
        event_loop.run_app(&mut app)
    }
}
