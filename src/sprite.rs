use std::path::Path;

use crate::pixel::{color, Pixel};

/// Addressing used by [`Sprite::pixel`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SampleMode {
    /// Out-of-range reads return [`color::BLANK`].
    #[default]
    Normal,
    /// Coordinates wrap, so every read is in range.
    Periodic,
}

/// A `width × height` pixel buffer.
///
/// The backing buffer always holds exactly `width * height` pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sprite {
    width: i32,
    height: i32,
    data: Vec<Pixel>,
    mode: SampleMode,
}

impl Sprite {
    /// A sprite filled with opaque black. Negative sizes are treated as zero.
    pub fn new(width: i32, height: i32) -> Self {
        let mut sprite = Self::default();
        sprite.resize(width, height);
        sprite
    }

    /// Decode a PNG into a sprite.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (w, h) = img.dimensions();
        let mut sprite = Sprite::new(w as i32, h as i32);
        for (dst, src) in sprite.data.iter_mut().zip(img.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = Pixel::rgba(r, g, b, a);
        }
        Ok(sprite)
    }

    /// Write the sprite as an RGBA PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        let bytes: Vec<u8> = self
            .data
            .iter()
            .flat_map(|p| [p.r(), p.g(), p.b(), p.a()])
            .collect();
        image::save_buffer(
            path,
            &bytes,
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgba8,
        )
    }

    /// Reallocate to `width × height`, discarding every previous pixel.
    ///
    /// A size whose buffer cannot be allocated leaves an empty sprite.
    pub fn resize(&mut self, width: i32, height: i32) {
        let (width, height) = (width.max(0), height.max(0));
        let mut data = Vec::new();
        let reserved = (width as usize)
            .checked_mul(height as usize)
            .filter(|&len| data.try_reserve_exact(len).is_ok());
        let Some(len) = reserved else {
            log::error!("Sprite of {width}x{height} pixels is too large");
            *self = Self { mode: self.mode, ..Self::default() };
            return;
        };
        data.resize(len, Pixel::default());
        self.width = width;
        self.height = height;
        self.data = data;
    }

    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }

    pub fn sample_mode(&self) -> SampleMode { self.mode }
    pub fn set_sample_mode(&mut self, mode: SampleMode) { self.mode = mode; }

    /// Row-major pixel data.
    pub fn pixels(&self) -> &[Pixel] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.data
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Read a pixel using the sprite's [`SampleMode`].
    pub fn pixel(&self, x: i32, y: i32) -> Pixel {
        match self.mode {
            SampleMode::Normal if self.in_bounds(x, y) => self.data[self.index(x, y)],
            SampleMode::Normal => color::BLANK,
            SampleMode::Periodic => {
                if self.data.is_empty() {
                    return color::BLANK;
                }
                let px = (x % self.width).abs();
                let py = (y % self.height).abs();
                self.data[self.index(px, py)]
            }
        }
    }

    /// Write a pixel. Returns `false`, leaving the sprite untouched, when
    /// `(x, y)` is out of range.
    pub fn set_pixel(&mut self, x: i32, y: i32, p: Pixel) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let i = self.index(x, y);
        self.data[i] = p;
        true
    }

    /// Texture-style lookup at normalised `(u, v)`.
    ///
    /// Always clamps to the last valid row/column, whatever the sample mode.
    pub fn sample(&self, u: f32, v: f32) -> Pixel {
        if self.data.is_empty() {
            return color::BLANK;
        }
        let x = ((u * self.width as f32) as i32).clamp(0, self.width - 1);
        let y = ((v * self.height as f32) as i32).clamp(0, self.height - 1);
        self.data[self.index(x, y)]
    }

    /// Fill every pixel with `p`.
    pub fn fill(&mut self, p: Pixel) {
        self.data.fill(p);
    }

    /// Fill the clipped rectangle `[x, x + w) × [y, y + h)`.
    pub(crate) fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, p: Pixel) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for row in y0..y1 {
            let start = self.index(x0, row);
            let end = self.index(x1, row);
            self.data[start..end].fill(p);
        }
    }
}
