use neswitch::pixel::{color, Pixel};
use neswitch::sprite::*;

fn gradient(w: i32, h: i32) -> Sprite {
    let mut s = Sprite::new(w, h);
    for y in 0..h {
        for x in 0..w {
            s.set_pixel(x, y, Pixel::rgba(x as u8, y as u8, 0, 255));
        }
    }
    s
}

#[test]
fn new_is_filled_with_opaque_black() {
    let s = Sprite::new(3, 2);
    assert_eq!((s.width(), s.height()), (3, 2));
    assert_eq!(s.pixels().len(), 6);
    assert!(s.pixels().iter().all(|&p| p == color::BLACK));
}

#[test]
fn negative_size_is_empty() {
    let s = Sprite::new(-4, 3);
    assert_eq!(s.width(), 0);
    assert!(s.pixels().is_empty());
}

#[test]
fn read_back_what_was_written() {
    let mut s = Sprite::new(4, 4);
    assert!(s.set_pixel(2, 3, color::RED));
    assert_eq!(s.pixel(2, 3), color::RED);
    assert_eq!(s.pixel(3, 2), color::BLACK);
}

#[test]
fn out_of_range_reads_are_blank() {
    let s = gradient(4, 3);
    for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 3), (i32::MAX, i32::MIN)] {
        assert_eq!(s.pixel(x, y), color::BLANK, "({x}, {y})");
    }
}

#[test]
fn out_of_range_writes_are_ignored() {
    let mut s = gradient(4, 3);
    let before = s.clone();
    assert!(!s.set_pixel(4, 0, color::RED));
    assert!(!s.set_pixel(-1, -1, color::RED));
    assert_eq!(s, before);
}

#[test]
fn periodic_reads_wrap() {
    let mut s = gradient(4, 3);
    s.set_sample_mode(SampleMode::Periodic);
    for (x, y) in [(0, 0), (5, 1), (9, 7), (123, 456)] {
        assert_eq!(s.pixel(x, y), s.pixel(x % 4, y % 3), "({x}, {y})");
    }
}

#[test]
fn periodic_negative_coordinates_use_absolute_remainder() {
    let mut s = gradient(4, 3);
    s.set_sample_mode(SampleMode::Periodic);
    assert_eq!(s.pixel(-1, 0), Pixel::rgba(1, 0, 0, 255));
    assert_eq!(s.pixel(-6, -4), Pixel::rgba(2, 1, 0, 255));
}

#[test]
fn periodic_on_empty_sprite_is_blank() {
    let mut s = Sprite::new(0, 0);
    s.set_sample_mode(SampleMode::Periodic);
    assert_eq!(s.pixel(3, 3), color::BLANK);
}

#[test]
fn sample_maps_normalised_coordinates() {
    let s = gradient(4, 2);
    assert_eq!(s.sample(0.0, 0.0), Pixel::rgba(0, 0, 0, 255));
    assert_eq!(s.sample(0.5, 0.5), Pixel::rgba(2, 1, 0, 255));
    assert_eq!(s.sample(0.999_999, 0.999_999), Pixel::rgba(3, 1, 0, 255));
}

#[test]
fn sample_clamps_even_in_periodic_mode() {
    let mut s = gradient(4, 2);
    s.set_sample_mode(SampleMode::Periodic);
    assert_eq!(s.sample(1.0, 1.0), Pixel::rgba(3, 1, 0, 255));
    assert_eq!(s.sample(7.5, -3.0), Pixel::rgba(3, 0, 0, 255));
}

#[test]
fn resize_discards_contents() {
    let mut s = gradient(4, 4);
    s.resize(2, 5);
    assert_eq!((s.width(), s.height()), (2, 5));
    assert_eq!(s.pixels().len(), 10);
    assert!(s.pixels().iter().all(|&p| p == color::BLACK));

    s.fill(color::RED);
    s.resize(2, 5);
    assert!(s.pixels().iter().all(|&p| p == color::BLACK));
}

#[test]
fn unallocatable_size_leaves_an_empty_sprite() {
    let s = Sprite::new(i32::MAX, i32::MAX);
    assert_eq!((s.width(), s.height()), (0, 0));
    assert!(s.pixels().is_empty());

    let mut s = gradient(3, 3);
    s.set_sample_mode(SampleMode::Periodic);
    s.resize(i32::MAX, i32::MAX);
    assert_eq!((s.width(), s.height()), (0, 0));
    assert!(s.pixels().is_empty());
    assert_eq!(s.sample_mode(), SampleMode::Periodic);
    assert_eq!(s.pixel(5, 5), color::BLANK);
}

#[test]
fn bytes_are_rgba_row_major() {
    let mut s = Sprite::new(2, 1);
    s.set_pixel(1, 0, Pixel::rgba(1, 2, 3, 4));
    assert_eq!(s.as_bytes(), &[0, 0, 0, 255, 1, 2, 3, 4]);
}

#[test]
fn png_round_trip_preserves_pixels() {
    let s = gradient(5, 3);
    let path = std::env::temp_dir().join(format!("neswitch-sprite-{}.png", std::process::id()));
    s.save_png(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let back = Sprite::from_png_bytes(&bytes).unwrap();
    assert_eq!(back.pixels(), s.pixels());
    assert_eq!((back.width(), back.height()), (5, 3));
}

#[test]
fn garbage_png_is_an_error() {
    assert!(Sprite::from_png_bytes(b"not a png").is_err());
}
