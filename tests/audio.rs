use std::f32::consts::PI;
use std::sync::Arc;

use neswitch::audio::waveform::*;
use neswitch::audio::*;

#[test]
fn only_one_audio_at_a_time() {
    let first = Audio::new().unwrap();
    assert!(matches!(Audio::new(), Err(AudioError::AlreadyExists)));
    assert!(!first.is_running());
    assert_eq!(first.spec(), None);
    drop(first);

    let second = Audio::new().unwrap();
    assert!(Arc::ptr_eq(second.stats(), second.stats()));
}

#[test]
fn average_after_one_callback_is_a_tenth() {
    let stats = CallbackStats::new();
    let d = 0.004_2;
    stats.record_duration(d);
    assert_eq!(stats.average_callback_time(), 0.1 * d);
}

#[test]
fn average_is_exponential() {
    let stats = CallbackStats::new();
    stats.record_duration(1.0);
    stats.record_duration(1.0);
    let expected = 0.9 * 0.1 + 0.1 * 1.0;
    assert!((stats.average_callback_time() - expected).abs() < 1e-7);
}

#[test]
fn history_keeps_the_last_64_oldest_first() {
    let stats = CallbackStats::new();
    for i in 0..100 {
        stats.record_duration(i as f32);
    }
    let times = stats.callback_times();
    assert_eq!(times.len(), CALLBACK_HISTORY);
    assert_eq!(times[0], 36.0);
    assert_eq!(times[CALLBACK_HISTORY - 1], 99.0);
    assert!(times.windows(2).all(|w| w[1] == w[0] + 1.0));
}

#[test]
fn last_buffer_is_a_copy() {
    let stats = CallbackStats::new();
    assert!(stats.last_buffer().is_empty());
    stats.record_buffer(&[0.5, -0.5, 0.25]);
    assert_eq!(stats.last_buffer(), vec![0.5, -0.5, 0.25]);
}

#[test]
fn waveforms_are_deterministic() {
    for i in 0..256 {
        let t = i as f32 * 0.037;
        assert_eq!(pulse_square(t, 0.5, 10).to_bits(), pulse_square(t, 0.5, 10).to_bits());
        assert_eq!(pulse_saw(t, 0.25, 10).to_bits(), pulse_saw(t, 0.25, 10).to_bits());
    }
}

#[test]
fn approximate_sin_shape() {
    assert_eq!(approximate_sin(0.0), 0.0);
    // One period spans 20 / π.
    let quarter = 5.0 / PI;
    assert!(approximate_sin(quarter) > 0.9);
    assert!(approximate_sin(3.0 * quarter) < -0.9);
    assert!((approximate_sin(-quarter) - approximate_sin(3.0 * quarter)).abs() < 1e-5);
}

#[test]
fn square_is_plus_minus_one() {
    assert!((square(0.5, 0.5) - 1.0).abs() < 1e-5);
    assert!((square(PI + 0.5, 0.5) + 1.0).abs() < 1e-5);
}

#[test]
fn saw_falls_over_one_period() {
    assert!((saw(0.0, 0.0) - 1.0).abs() < 1e-6);
    assert!(saw(PI, 0.0).abs() < 1e-6);
    assert!(saw(1.9 * PI, 0.0) < -0.8);
}

#[test]
fn triangle_stays_in_range() {
    for i in 0..200 {
        let v = triangle(i as f32 * 0.05, 0.0);
        assert!(v.abs() <= 1.0 + 1e-5, "{v}");
    }
}

#[test]
fn pulse_waves_stay_roughly_in_range() {
    for i in 0..500 {
        let t = i as f32 * 0.0127;
        assert!(pulse_saw(t, 0.0, DEFAULT_HARMONICS).abs() <= 1.1);
        assert!(pulse_square(t, 0.5, DEFAULT_HARMONICS).abs() <= 1.1);
    }
}

#[test]
fn pulse_square_duty_is_clamped() {
    for t in [0.1, 1.0, 2.7] {
        assert_eq!(pulse_square(t, 1.5, 10), pulse_square(t, 1.0, 10));
        assert_eq!(pulse_square(t, -1.0, 10), pulse_square(t, 0.0, 10));
    }
}

#[test]
fn one_harmonic_is_silent() {
    assert_eq!(pulse_saw(1.234, 0.0, 1), 0.0);
}

#[test]
fn fixed_time_splits_whole_and_fraction() {
    let t = FixedTime::new(3.25);
    assert_eq!((t.whole(), t.frac()), (3, 0.25));
    assert_eq!(f32::from(t), 3.25);

    let mut t = FixedTime::from(0.75);
    t += 0.5;
    assert_eq!((t.whole(), t.frac()), (1, 0.25));
    t -= 2.0;
    assert_eq!((t.whole(), t.frac()), (0, -0.75));
}
