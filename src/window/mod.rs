pub mod config;
pub mod registry;

pub use config::{
    WindowConfig, RESOLUTION_SCALE, SCREEN_ASPECT, SCREEN_HEIGHT, SCREEN_HEIGHT_4_3, SCREEN_STRETCH_4_3,
    SCREEN_WIDTH,
};
pub use registry::{RegistryError, WindowId, WindowRegistry, MAX_WINDOWS};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window as NativeWindow;

use crate::font;
use crate::pixel::{color, Pixel, PixelMode};
use crate::renderer::Presenter;
use crate::sprite::Sprite;

// ── Rect ──────────────────────────────────────────────────────────────────────

/// Integer rectangle in virtual pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && x < self.x.saturating_add(self.w)
            && y >= self.y
            && y < self.y.saturating_add(self.h)
    }
}

// ── Render targets ────────────────────────────────────────────────────────────

/// Handle of an off-screen texture owned by a window.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

/// Surface that draw calls affect.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RenderTarget {
    /// The window's framebuffer.
    #[default]
    Screen,
    /// An off-screen texture created with [`RenderScope::create_texture`].
    Texture(TextureId),
}

struct RenderState {
    bound: RenderTarget,
    pixel_mode: PixelMode,
    screen: Sprite,
    textures: Vec<Sprite>,
    presenter: Option<Presenter>,
}

impl RenderState {
    fn bind(&mut self, target: RenderTarget) {
        if self.bound == target {
            return;
        }
        if let RenderTarget::Texture(TextureId(i)) = target {
            if i as usize >= self.textures.len() {
                log::error!("Could not set render target! Unknown texture {i}");
                return;
            }
        }
        log::trace!("render target {:?} -> {:?}", self.bound, target);
        self.bound = target;
    }

    fn target(&self) -> &Sprite {
        match self.bound {
            RenderTarget::Screen => &self.screen,
            RenderTarget::Texture(TextureId(i)) => &self.textures[i as usize],
        }
    }

    fn target_mut(&mut self) -> &mut Sprite {
        match self.bound {
            RenderTarget::Screen => &mut self.screen,
            RenderTarget::Texture(TextureId(i)) => &mut self.textures[i as usize],
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Window ────────────────────────────────────────────────────────────────────

/// A window with a pixel framebuffer addressed in virtual pixels.
///
/// Drawing goes through a [`RenderScope`], which holds the window's render
/// lock from the moment a target is bound until the scope is dropped, so at
/// most one thread draws to a window at a time.
///
/// Frames follow a two-state cycle: [`Window::update`] begins a frame (ending
/// any frame in progress first) and [`Window::end_frame`] presents it.
/// Dropping a window ends its current frame.
pub struct Window {
    id: WindowId,
    config: WindowConfig,
    native: Option<Arc<NativeWindow>>,
    presentable: bool,
    renderer: Mutex<RenderState>,
    mid_frame: AtomicBool,
    frames_presented: AtomicU64,
}

impl Window {
    /// Open a native window and its presenter.
    ///
    /// Never fails: if the native window or GPU presenter cannot be created
    /// the error is logged and the returned window reports
    /// `is_open() == false`. Drawing into such a window still works, it is
    /// just never shown.
    pub fn open(event_loop: &ActiveEventLoop, id: WindowId, config: WindowConfig) -> Self {
        let attributes = NativeWindow::default_attributes()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(config.physical_width, config.physical_height))
            .with_resizable(false);

        let native = match event_loop.create_window(attributes) {
            Ok(window) => Some(Arc::new(window)),
            Err(e) => {
                log::error!("Window could not be created! {e}");
                None
            }
        };

        let presenter = native.as_ref().and_then(|window| {
            let result = pollster::block_on(Presenter::new(
                Arc::clone(window),
                config.physical_width,
                config.physical_height,
                config.vsync,
            ));
            match result {
                Ok(presenter) => Some(presenter),
                Err(e) => {
                    log::error!("Renderer could not be created! {e}");
                    None
                }
            }
        });

        Self::build(id, config, native, presenter)
    }

    /// A window without a native surface. Everything but presentation works.
    pub fn headless(id: WindowId, config: WindowConfig) -> Self {
        Self::build(id, config, None, None)
    }

    fn build(
        id: WindowId,
        config: WindowConfig,
        native: Option<Arc<NativeWindow>>,
        presenter: Option<Presenter>,
    ) -> Self {
        let screen = Sprite::new(config.physical_width as i32, config.physical_height as i32);
        let window = Self {
            id,
            presentable: presenter.is_some(),
            native,
            renderer: Mutex::new(RenderState {
                bound: RenderTarget::Screen,
                pixel_mode: PixelMode::Normal,
                screen,
                textures: Vec::new(),
                presenter,
            }),
            config,
            mid_frame: AtomicBool::new(false),
            frames_presented: AtomicU64::new(0),
        };
        window.lock_target(RenderTarget::Screen).clear(color::WHITE);
        window.update();
        window
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// True when the native window and its presenter both exist.
    pub fn is_open(&self) -> bool {
        self.native.is_some() && self.presentable
    }

    pub fn native_window(&self) -> Option<&Arc<NativeWindow>> {
        self.native.as_ref()
    }

    pub fn native_id(&self) -> Option<winit::window::WindowId> {
        self.native.as_ref().map(|w| w.id())
    }

    pub fn resolution_scale(&self) -> i32 {
        self.config.resolution_scale.max(1)
    }

    pub fn virtual_width(&self) -> i32 {
        self.config.virtual_width()
    }

    pub fn virtual_height(&self) -> i32 {
        self.config.virtual_height()
    }

    // ── Render target discipline ─────────────────────────────────────────────

    /// Take the render lock and bind `target`, blocking while another scope
    /// is live. Binding the already-bound target does not switch anything.
    pub fn lock_target(&self, target: RenderTarget) -> RenderScope<'_> {
        let mut state = lock(&self.renderer);
        state.bind(target);
        RenderScope { state, scale: self.resolution_scale() }
    }

    /// Like [`Window::lock_target`], but returns `None` instead of waiting
    /// when the lock is held.
    pub fn try_lock_target(&self, target: RenderTarget) -> Option<RenderScope<'_>> {
        let mut state = match self.renderer.try_lock() {
            Ok(state) => state,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        state.bind(target);
        Some(RenderScope { state, scale: self.resolution_scale() })
    }

    /// Lock for off-screen texture work.
    ///
    /// No dedicated texture renderer is created, so this shares the primary
    /// render lock.
    pub fn lock_texture_target(&self, target: RenderTarget) -> RenderScope<'_> {
        self.lock_target(target)
    }

    /// Run `draw` with `target` bound, releasing the lock afterwards.
    pub fn with_target<R>(&self, target: RenderTarget, draw: impl FnOnce(&mut RenderScope<'_>) -> R) -> R {
        let mut scope = self.lock_target(target);
        draw(&mut scope)
    }

    pub fn set_pixel_mode(&self, mode: PixelMode) {
        lock(&self.renderer).pixel_mode = mode;
    }

    pub fn create_texture(&self, width: i32, height: i32) -> TextureId {
        let mut state = lock(&self.renderer);
        state.textures.push(Sprite::new(width, height));
        TextureId((state.textures.len() - 1) as u32)
    }

    /// Copy of the screen framebuffer.
    pub fn screenshot(&self) -> Sprite {
        lock(&self.renderer).screen.clone()
    }

    // ── Frame cycle ──────────────────────────────────────────────────────────

    /// Begin a frame, presenting the previous one if it was never ended.
    pub fn update(&self) {
        self.end_frame();
        self.mid_frame.store(true, Ordering::Release);
    }

    /// Present the current frame. Does nothing between frames.
    pub fn end_frame(&self) {
        if !self.mid_frame.swap(false, Ordering::AcqRel) {
            return;
        }
        self.lock_target(RenderTarget::Screen).present();
        self.frames_presented.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_mid_frame(&self) -> bool {
        self.mid_frame.load(Ordering::Acquire)
    }

    /// Number of frames ended so far, including headless ones.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented.load(Ordering::Relaxed)
    }

    /// React to window-level events. Returns `true` if the event was consumed.
    pub fn handle_event(&self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::Resized(size) => {
                if let Some(presenter) = lock(&self.renderer).presenter.as_mut() {
                    presenter.resize(*size);
                }
                true
            }
            _ => false,
        }
    }

    /// Ask the OS for a redraw; a no-op for headless windows.
    pub fn request_redraw(&self) {
        if let Some(native) = &self.native {
            native.request_redraw();
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.end_frame();
        log::debug!("Destroyed window {}", self.id);
    }
}

// ── RenderScope ───────────────────────────────────────────────────────────────

/// Exclusive drawing access to one window with a render target bound.
///
/// Coordinates are virtual pixels; each one covers a
/// `scale × scale` block of the target. The render lock is released when the
/// scope is dropped, on every exit path.
pub struct RenderScope<'a> {
    state: MutexGuard<'a, RenderState>,
    scale: i32,
}

impl RenderScope<'_> {
    pub fn target(&self) -> RenderTarget {
        self.state.bound
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn pixel_mode(&self) -> PixelMode {
        self.state.pixel_mode
    }

    /// Set how [`RenderScope::draw_sprite`] and
    /// [`RenderScope::draw_texture`] combine pixels. Persists after the scope.
    pub fn set_pixel_mode(&mut self, mode: PixelMode) {
        self.state.pixel_mode = mode;
    }

    /// The bound target's physical pixels.
    pub fn target_sprite(&self) -> &Sprite {
        self.state.target()
    }

    /// The window framebuffer, whatever target is bound.
    pub fn screen(&self) -> &Sprite {
        &self.state.screen
    }

    /// Copy of the window framebuffer.
    pub fn screenshot(&self) -> Sprite {
        self.state.screen.clone()
    }

    /// Allocate an off-screen texture of `width × height` physical pixels.
    pub fn create_texture(&mut self, width: i32, height: i32) -> TextureId {
        let textures = &mut self.state.textures;
        textures.push(Sprite::new(width, height));
        TextureId((textures.len() - 1) as u32)
    }

    /// Bind another target without releasing the lock.
    pub fn set_target(&mut self, target: RenderTarget) {
        self.state.bind(target);
    }

    fn fill_virtual(&mut self, x: i32, y: i32, w: i32, h: i32, color: Pixel) {
        let s = self.scale;
        self.state
            .target_mut()
            .fill_rect(
                x.saturating_mul(s),
                y.saturating_mul(s),
                w.saturating_mul(s),
                h.saturating_mul(s),
                color.with_alpha(255),
            );
    }

    /// Fill the whole target with `color` (drawn opaque).
    pub fn clear(&mut self, color: Pixel) {
        self.state.target_mut().fill(color.with_alpha(255));
    }

    /// Outline `rect`, one virtual pixel thick. `None` outlines the whole
    /// target.
    pub fn draw_rect(&mut self, rect: Option<Rect>, color: Pixel) {
        let Rect { x, y, w, h } = rect.unwrap_or_else(|| {
            let t = self.state.target();
            Rect::new(0, 0, t.width() / self.scale, t.height() / self.scale)
        });
        if w <= 0 || h <= 0 {
            return;
        }
        self.fill_virtual(x, y, w, 1, color);
        self.fill_virtual(x, y.saturating_add(h - 1), w, 1, color);
        self.fill_virtual(x, y, 1, h, color);
        self.fill_virtual(x.saturating_add(w - 1), y, 1, h, color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Pixel) {
        if rect.w > 0 && rect.h > 0 {
            self.fill_virtual(rect.x, rect.y, rect.w, rect.h, color);
        }
    }

    /// Set one virtual pixel.
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Pixel) {
        self.fill_virtual(x, y, 1, 1, color);
    }

    /// Blit `sprite` with its top-left at virtual `(x, y)`, one sprite pixel
    /// per virtual pixel, combined through the current [`PixelMode`].
    pub fn draw_sprite(&mut self, x: i32, y: i32, sprite: &Sprite) {
        let (s, mode) = (self.scale, self.state.pixel_mode);
        let target = self.state.target_mut();
        for j in 0..sprite.height() {
            for i in 0..sprite.width() {
                let src = sprite.pixel(i, j);
                let px = x.saturating_add(i).saturating_mul(s);
                let py = y.saturating_add(j).saturating_mul(s);
                blend_block(target, px, py, s, src, mode);
            }
        }
    }

    /// Copy texture `id` onto the bound target at virtual `(x, y)`,
    /// physical pixel for physical pixel. Returns `false` for an unknown
    /// texture or when `id` is the bound target itself.
    pub fn draw_texture(&mut self, id: TextureId, x: i32, y: i32) -> bool {
        if self.state.bound == RenderTarget::Texture(id) {
            log::error!("Texture {} cannot be drawn onto itself", id.0);
            return false;
        }
        let Some(source) = self.state.textures.get(id.0 as usize).cloned() else {
            log::error!("Unknown texture {}", id.0);
            return false;
        };
        let (s, mode) = (self.scale, self.state.pixel_mode);
        let (ox, oy) = (x.saturating_mul(s), y.saturating_mul(s));
        let target = self.state.target_mut();
        for j in 0..source.height() {
            for i in 0..source.width() {
                let (px, py) = (ox.saturating_add(i), oy.saturating_add(j));
                blend_block(target, px, py, 1, source.pixel(i, j), mode);
            }
        }
        true
    }

    /// Draw `text` with the built-in 8×8 font. `'\n'` starts a new line at
    /// `x`; characters without a glyph leave a gap.
    pub fn draw_string(&mut self, x: i32, y: i32, text: &str, color: Pixel) {
        let sheet = font::sheet();
        let (mut sx, mut sy): (i32, i32) = (0, 0);
        for ch in text.chars() {
            if ch == '\n' {
                sx = 0;
                sy = sy.saturating_add(font::GLYPH_SIZE);
                continue;
            }
            if let Some((ox, oy)) = font::glyph_origin(ch) {
                for j in 0..font::GLYPH_SIZE {
                    for i in 0..font::GLYPH_SIZE {
                        if sheet.pixel(ox + i, oy + j).r() > 0 {
                            let px = x.saturating_add(sx).saturating_add(i);
                            let py = y.saturating_add(sy).saturating_add(j);
                            self.draw_pixel(px, py, color);
                        }
                    }
                }
            }
            sx = sx.saturating_add(font::GLYPH_SIZE);
        }
    }

    /// Present the screen now, outside the frame cycle.
    pub fn present(&mut self) {
        let RenderState { presenter, screen, .. } = &mut *self.state;
        if let Some(presenter) = presenter.as_mut() {
            presenter.present_or_log(screen);
        }
    }
}

/// Combine `src` into the `size × size` block at physical `(x, y)`, clipped
/// to the target.
fn blend_block(target: &mut Sprite, x: i32, y: i32, size: i32, src: Pixel, mode: PixelMode) {
    let x1 = x.saturating_add(size).min(target.width());
    let y1 = y.saturating_add(size).min(target.height());
    for ry in y.max(0)..y1 {
        for rx in x.max(0)..x1 {
            if let Some(out) = mode.apply(src, target.pixel(rx, ry)) {
                target.set_pixel(rx, ry, out);
            }
        }
    }
}
