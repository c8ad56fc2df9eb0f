use serde::Deserialize;

// ── Resolution constants ──────────────────────────────────────────────────────

/// Width of the emulated screen in virtual pixels.
pub const SCREEN_WIDTH: i32 = 256;
/// Height of the emulated screen in virtual pixels.
pub const SCREEN_HEIGHT: i32 = 240;
/// Height the emulated screen stretches to for a 4:3 display.
pub const SCREEN_HEIGHT_4_3: i32 = 341;
pub const SCREEN_STRETCH_4_3: f32 = SCREEN_HEIGHT_4_3 as f32 / SCREEN_HEIGHT as f32;
pub const SCREEN_ASPECT: f32 = SCREEN_WIDTH as f32 / SCREEN_HEIGHT as f32;
/// Real pixels per virtual pixel, per axis.
pub const RESOLUTION_SCALE: i32 = 2;

// ── WindowConfig ──────────────────────────────────────────────────────────────

/// Window configuration snapshot.
///
/// - **physical** dimensions are the size of the real framebuffer and OS
///   window.
/// - **virtual** dimensions are what the drawing API addresses: one virtual
///   pixel covers `resolution_scale × resolution_scale` physical pixels.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Framebuffer width in physical pixels.
    pub physical_width: u32,
    /// Framebuffer height in physical pixels.
    pub physical_height: u32,
    /// Integer scale from virtual to physical pixels.
    pub resolution_scale: i32,
    /// Wait for vertical blank when presenting.
    pub vsync: bool,
}

impl Default for WindowConfig {
    /// 512 × 480, i.e. the 256 × 240 screen at scale 2, vsync off.
    fn default() -> Self {
        Self {
            title: "neswitch".into(),
            physical_width: (SCREEN_WIDTH * RESOLUTION_SCALE) as u32,
            physical_height: (SCREEN_HEIGHT * RESOLUTION_SCALE) as u32,
            resolution_scale: RESOLUTION_SCALE,
            vsync: false,
        }
    }
}

impl WindowConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, physical_width: u32, physical_height: u32) -> Self {
        self.physical_width = physical_width;
        self.physical_height = physical_height;
        self
    }

    /// Scale values below 1 are raised to 1.
    pub fn with_scale(mut self, scale: i32) -> Self {
        self.resolution_scale = scale.max(1);
        self
    }

    fn scale(&self) -> i32 {
        self.resolution_scale.max(1)
    }

    pub fn virtual_width(&self) -> i32 {
        self.physical_width as i32 / self.scale()
    }

    pub fn virtual_height(&self) -> i32 {
        self.physical_height as i32 / self.scale()
    }

    /// Aspect ratio of the virtual resolution.
    ///
    /// Returns `0.0` when the virtual height is zero.
    pub fn virtual_aspect(&self) -> f32 {
        if self.virtual_height() == 0 {
            return 0.0;
        }
        self.virtual_width() as f32 / self.virtual_height() as f32
    }
}
