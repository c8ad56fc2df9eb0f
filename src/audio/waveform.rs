//! Stateless oscillators. `t` is phase in radians unless noted otherwise.
//!
//! The pulse generators are additive harmonic sums scaled by fixed constants
//! that keep their output roughly within `-1.0..=1.0`.

use std::f32::consts::PI;

/// Harmonic count the pulse generators are usually driven with.
pub const DEFAULT_HARMONICS: i32 = 10;

const PULSE_SAW_NORM: f32 = 1.75;
const PULSE_SQUARE_NORM: f32 = 1.06;

/// Cubic approximation of a sine wave. One period spans `t` in `0..20/π`;
/// negative `t` continues the same period.
pub fn approximate_sin(t: f32) -> f32 {
    let mut t = t * (0.05 * PI);
    t -= t.floor();
    20.785 * t * (t - 0.5) * (t - 1.0)
}

/// Falling sawtooth with phase offset `p` (in periods).
pub fn saw(t: f32, p: f32) -> f32 {
    let mut t = t / (2.0 * PI);
    t += p;
    2.0 * (-(t - t.trunc()) + 0.5)
}

/// Square wave with duty cycle `d`.
pub fn square(t: f32, d: f32) -> f32 {
    saw(t, 0.0) - saw(t, d) + 2.0 * (0.5 - d)
}

pub fn triangle(t: f32, p: f32) -> f32 {
    saw(2.0 * t + PI, p) * square(t + 0.5 * PI, 0.5)
}

/// Band-limited sawtooth summed from harmonics `1..harmonics`.
pub fn pulse_saw(t: f32, p: f32, harmonics: i32) -> f32 {
    let mut r = 0.0;
    for i in 1..harmonics {
        r += approximate_sin((t - p * 2.0 * PI) * i as f32) / i as f32;
    }
    r / PULSE_SAW_NORM
}

/// Band-limited pulse wave with duty cycle `d`, clamped to `0.0..=1.0`.
pub fn pulse_square(t: f32, d: f32, harmonics: i32) -> f32 {
    let d = d.clamp(0.0, 1.0);
    let y0 = pulse_saw(t, 0.0, harmonics);
    let y1 = pulse_saw(t, d, harmonics);
    (y0 - y1) / PULSE_SQUARE_NORM
}
