// ── Pixel ─────────────────────────────────────────────────────────────────────

/// A 32-bit RGBA colour packed as `r | g << 8 | b << 16 | a << 24`.
///
/// Equality is exact equality of the packed word. The in-memory layout is the
/// byte sequence `[r, g, b, a]` on little-endian targets, which is what the
/// presenter uploads as an `Rgba8` texture.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Pixel(u32);

impl Pixel {
    /// Opaque colour from three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(r as u32 | (g as u32) << 8 | (b as u32) << 16 | (a as u32) << 24)
    }

    pub const fn from_u32(n: u32) -> Self {
        Self(n)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn r(self) -> u8 { self.0 as u8 }
    pub const fn g(self) -> u8 { (self.0 >> 8) as u8 }
    pub const fn b(self) -> u8 { (self.0 >> 16) as u8 }
    pub const fn a(self) -> u8 { (self.0 >> 24) as u8 }

    /// Same colour with the alpha channel replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::rgba(self.r(), self.g(), self.b(), a)
    }

    /// Normalised `[r, g, b, a]` in `0.0..=1.0`, the form UI layers consume.
    pub fn to_rgba_f32(self) -> [f32; 4] {
        [
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
            self.a() as f32 / 255.0,
        ]
    }

    /// Composite `self` over `dst` using `self`'s alpha. The result is opaque
    /// only if `dst` was.
    pub fn blend_over(self, dst: Pixel) -> Pixel {
        let a = self.a() as f32 / 255.0;
        let c = 1.0 - a;
        let mix = |s: u8, d: u8| (a * s as f32 + c * d as f32) as u8;
        Pixel::rgba(
            mix(self.r(), dst.r()),
            mix(self.g(), dst.g()),
            mix(self.b(), dst.b()),
            dst.a(),
        )
    }
}

/// Opaque black.
impl Default for Pixel {
    fn default() -> Self {
        color::BLACK
    }
}

impl std::fmt::Debug for Pixel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pixel(#{})", hex(self.0 as u64, 8))
    }
}

impl From<u32> for Pixel {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

impl From<Pixel> for u32 {
    fn from(p: Pixel) -> Self {
        p.0
    }
}

// ── PixelMode ─────────────────────────────────────────────────────────────────

/// How sprite blits combine source pixels with the target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PixelMode {
    /// Source overwrites the target.
    #[default]
    Normal,
    /// Only fully opaque source pixels are written.
    Mask,
    /// Source is alpha-blended over the target.
    Alpha,
}

impl PixelMode {
    /// Combine `src` with `dst`; `None` means the target keeps `dst`.
    pub fn apply(self, src: Pixel, dst: Pixel) -> Option<Pixel> {
        match self {
            PixelMode::Normal => Some(src),
            PixelMode::Mask => (src.a() == 255).then_some(src),
            PixelMode::Alpha => Some(src.blend_over(dst)),
        }
    }
}

// ── Named colours ─────────────────────────────────────────────────────────────

pub mod color {
    use super::Pixel;

    pub const WHITE: Pixel = Pixel::new(255, 255, 255);
    pub const GREY: Pixel = Pixel::new(192, 192, 192);
    pub const DARK_GREY: Pixel = Pixel::new(128, 128, 128);
    pub const VERY_DARK_GREY: Pixel = Pixel::new(64, 64, 64);
    pub const RED: Pixel = Pixel::new(255, 0, 0);
    pub const DARK_RED: Pixel = Pixel::new(128, 0, 0);
    pub const VERY_DARK_RED: Pixel = Pixel::new(64, 0, 0);
    pub const YELLOW: Pixel = Pixel::new(255, 255, 0);
    pub const DARK_YELLOW: Pixel = Pixel::new(128, 128, 0);
    pub const VERY_DARK_YELLOW: Pixel = Pixel::new(64, 64, 0);
    pub const GREEN: Pixel = Pixel::new(0, 255, 0);
    pub const DARK_GREEN: Pixel = Pixel::new(0, 128, 0);
    pub const VERY_DARK_GREEN: Pixel = Pixel::new(0, 64, 0);
    pub const CYAN: Pixel = Pixel::new(0, 255, 255);
    pub const DARK_CYAN: Pixel = Pixel::new(0, 128, 128);
    pub const VERY_DARK_CYAN: Pixel = Pixel::new(0, 64, 64);
    pub const BLUE: Pixel = Pixel::new(0, 0, 255);
    pub const DARK_BLUE: Pixel = Pixel::new(0, 0, 128);
    pub const VERY_DARK_BLUE: Pixel = Pixel::new(0, 0, 64);
    pub const MAGENTA: Pixel = Pixel::new(255, 0, 255);
    pub const DARK_MAGENTA: Pixel = Pixel::new(128, 0, 128);
    pub const VERY_DARK_MAGENTA: Pixel = Pixel::new(64, 0, 64);
    pub const BLACK: Pixel = Pixel::new(0, 0, 0);
    /// Fully transparent black.
    pub const BLANK: Pixel = Pixel::rgba(0, 0, 0, 0);
}

// ── hex ───────────────────────────────────────────────────────────────────────

/// Upper-case hexadecimal of the low `digits` nibbles of `n`, zero padded.
pub fn hex(n: u64, digits: u8) -> String {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = vec![b'0'; digits as usize];
    let mut n = n;
    for slot in out.iter_mut().rev() {
        *slot = DIGITS[(n & 0xF) as usize];
        n >>= 4;
    }
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_pads_and_truncates() {
        assert_eq!(hex(0xA, 4), "000A");
        assert_eq!(hex(0x12345, 4), "2345");
        assert_eq!(hex(0, 0), "");
    }

    #[test]
    fn alpha_blend_halfway() {
        let src = Pixel::rgba(255, 0, 0, 128);
        let out = src.blend_over(color::BLUE);
        assert!(out.r() > 120 && out.r() < 135);
        assert!(out.b() > 120 && out.b() < 135);
        assert_eq!(out.a(), 255);
    }
}
