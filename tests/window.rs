use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use neswitch::pixel::{color, Pixel, PixelMode};
use neswitch::sprite::Sprite;
use neswitch::window::*;

/// 4 × 3 virtual pixels at scale 2.
fn small() -> Window {
    Window::headless(WindowId::new(0), WindowConfig::default().with_size(8, 6).with_scale(2))
}

#[test]
fn default_config_is_the_scaled_screen() {
    let cfg = WindowConfig::default();
    assert_eq!((cfg.physical_width, cfg.physical_height), (512, 480));
    assert_eq!(cfg.resolution_scale, RESOLUTION_SCALE);
    assert_eq!((cfg.virtual_width(), cfg.virtual_height()), (SCREEN_WIDTH, SCREEN_HEIGHT));
    assert!(!cfg.vsync);
}

#[test]
fn virtual_aspect_matches_screen() {
    let cfg = WindowConfig::default();
    assert!((cfg.virtual_aspect() - SCREEN_ASPECT).abs() < 1e-6);
    assert!((SCREEN_STRETCH_4_3 - 341.0 / 240.0).abs() < 1e-6);
}

#[test]
fn virtual_aspect_zero_height_returns_zero() {
    let cfg = WindowConfig::default().with_size(100, 0);
    assert_eq!(cfg.virtual_aspect(), 0.0);
}

#[test]
fn scale_below_one_is_raised() {
    assert_eq!(WindowConfig::default().with_scale(0).resolution_scale, 1);
}

#[test]
fn headless_window_starts_white_and_mid_frame() {
    let w = small();
    assert!(!w.is_open());
    assert!(w.is_mid_frame());
    assert_eq!(w.frames_presented(), 0);
    assert!(w.screenshot().pixels().iter().all(|&p| p == color::WHITE));
}

#[test]
fn frame_cycle() {
    let w = small();
    w.end_frame();
    assert!(!w.is_mid_frame());
    assert_eq!(w.frames_presented(), 1);

    // Ending an idle frame does nothing.
    w.end_frame();
    assert_eq!(w.frames_presented(), 1);

    w.update();
    assert!(w.is_mid_frame());
    w.update();
    assert_eq!(w.frames_presented(), 2);
}

#[test]
fn draw_pixel_covers_one_scaled_block() {
    let w = small();
    w.with_target(RenderTarget::Screen, |s| {
        s.clear(color::BLACK);
        s.draw_pixel(1, 2, color::RED);
    });
    let shot = w.screenshot();
    let red: Vec<(i32, i32)> = (0..6)
        .flat_map(|y| (0..8).map(move |x| (x, y)))
        .filter(|&(x, y)| shot.pixel(x, y) == color::RED)
        .collect();
    assert_eq!(red, [(2, 4), (3, 4), (2, 5), (3, 5)]);
}

#[test]
fn primitives_draw_opaque() {
    let w = small();
    w.with_target(RenderTarget::Screen, |s| s.draw_pixel(0, 0, Pixel::rgba(9, 9, 9, 0)));
    assert_eq!(w.screenshot().pixel(0, 0), Pixel::new(9, 9, 9));
}

#[test]
fn draw_rect_outlines() {
    let w = small();
    w.with_target(RenderTarget::Screen, |s| {
        s.clear(color::BLACK);
        s.draw_rect(Some(Rect::new(0, 0, 3, 3)), color::GREEN);
    });
    let shot = w.screenshot();
    assert_eq!(shot.pixel(0, 0), color::GREEN);
    assert_eq!(shot.pixel(5, 5), color::GREEN);
    assert_eq!(shot.pixel(2, 2), color::BLACK);
    assert_eq!(shot.pixel(6, 0), color::BLACK);
}

#[test]
fn draw_rect_none_outlines_the_target() {
    let w = small();
    w.with_target(RenderTarget::Screen, |s| {
        s.clear(color::BLACK);
        s.draw_rect(None, color::BLUE);
    });
    let shot = w.screenshot();
    assert_eq!(shot.pixel(7, 5), color::BLUE);
    assert_eq!(shot.pixel(0, 5), color::BLUE);
    assert_eq!(shot.pixel(3, 3), color::BLACK);
}

#[test]
fn drawing_off_screen_is_clipped() {
    let w = small();
    w.with_target(RenderTarget::Screen, |s| {
        s.clear(color::BLACK);
        s.fill_rect(Rect::new(-10, -10, 11, 11), color::RED);
        s.draw_pixel(100, 100, color::RED);
    });
    let shot = w.screenshot();
    assert_eq!(shot.pixel(1, 1), color::RED);
    assert_eq!(shot.pixel(2, 2), color::BLACK);
}

#[test]
fn far_off_screen_coordinates_draw_nothing() {
    let w = small();
    let tex = w.create_texture(2, 2);
    w.with_target(RenderTarget::Texture(tex), |s| s.clear(color::RED));
    let mut sprite = Sprite::new(2, 2);
    sprite.fill(color::RED);

    w.with_target(RenderTarget::Screen, |s| {
        s.clear(color::BLACK);
        for (x, y) in [(i32::MAX, 0), (i32::MAX - 1, i32::MAX - 1), (i32::MIN, 0), (0, i32::MIN), (1 << 30, 0)] {
            s.draw_pixel(x, y, color::RED);
            s.fill_rect(Rect::new(x, y, 4, 4), color::RED);
            s.draw_rect(Some(Rect::new(x, y, 4, 4)), color::RED);
            s.draw_rect(Some(Rect::new(x, y, i32::MAX, i32::MAX)), color::RED);
            s.draw_sprite(x, y, &sprite);
            s.draw_texture(tex, x, y);
            s.draw_string(x, y, "AB\nAB", color::RED);
        }
        s.draw_string(i32::MAX - 4, 0, "AB", color::RED);
    });
    assert!(w.screenshot().pixels().iter().all(|&p| p == color::BLACK));
}

#[test]
fn sprites_straddling_the_edge_are_clipped() {
    let w = small();
    let mut sprite = Sprite::new(2, 1);
    sprite.fill(color::RED);
    w.with_target(RenderTarget::Screen, |s| {
        s.clear(color::BLACK);
        s.draw_sprite(-1, 0, &sprite);
        s.draw_sprite(3, 2, &sprite);
    });
    let shot = w.screenshot();
    assert_eq!(shot.pixel(0, 0), color::RED);
    assert_eq!(shot.pixel(1, 1), color::RED);
    assert_eq!(shot.pixel(2, 0), color::BLACK);
    assert_eq!(shot.pixel(7, 5), color::RED);
    assert_eq!(shot.pixel(5, 5), color::BLACK);
}

#[test]
fn draw_sprite_honours_pixel_mode() {
    let w = small();
    let mut sprite = Sprite::new(2, 1);
    sprite.set_pixel(0, 0, color::RED);
    sprite.set_pixel(1, 0, color::BLANK);

    w.with_target(RenderTarget::Screen, |s| {
        s.clear(color::WHITE);
        s.set_pixel_mode(PixelMode::Mask);
        s.draw_sprite(0, 0, &sprite);
    });
    let shot = w.screenshot();
    assert_eq!(shot.pixel(0, 0), color::RED);
    assert_eq!(shot.pixel(2, 0), color::WHITE);

    w.set_pixel_mode(PixelMode::Normal);
    w.with_target(RenderTarget::Screen, |s| {
        assert_eq!(s.pixel_mode(), PixelMode::Normal);
        s.draw_sprite(0, 0, &sprite);
    });
    assert_eq!(w.screenshot().pixel(2, 0), color::BLANK);
}

#[test]
fn textures_are_separate_targets() {
    let w = small();
    let tex = w.create_texture(2, 2);
    w.with_target(RenderTarget::Texture(tex), |s| {
        assert_eq!(s.target(), RenderTarget::Texture(tex));
        s.clear(color::YELLOW);
        assert!(!s.draw_texture(tex, 0, 0));
    });
    assert_eq!(w.screenshot().pixel(0, 0), color::WHITE);

    w.with_target(RenderTarget::Screen, |s| assert!(s.draw_texture(tex, 1, 1)));
    let shot = w.screenshot();
    assert_eq!(shot.pixel(2, 2), color::YELLOW);
    assert_eq!(shot.pixel(3, 3), color::YELLOW);
    assert_eq!(shot.pixel(4, 4), color::WHITE);
}

#[test]
fn binding_an_unknown_texture_keeps_the_previous_target() {
    let w = small();
    let tex = w.create_texture(1, 1);
    w.lock_target(RenderTarget::Texture(tex));

    let other = Window::headless(WindowId::new(1), WindowConfig::default());
    other.create_texture(1, 1);
    let foreign = other.create_texture(1, 1);

    let scope = w.lock_target(RenderTarget::Texture(foreign));
    assert_eq!(scope.target(), RenderTarget::Texture(tex));
}

#[test]
fn draw_string_uses_the_font() {
    let w = Window::headless(WindowId::new(0), WindowConfig::default().with_size(32, 32).with_scale(1));
    w.with_target(RenderTarget::Screen, |s| {
        s.clear(color::BLACK);
        s.draw_string(0, 0, "A\nA", color::RED);
    });
    let shot = w.screenshot();
    // Top row of 'A' is "..###...".
    let row: Vec<bool> = (0..8).map(|x| shot.pixel(x, 0) == color::RED).collect();
    assert_eq!(row, [false, false, true, true, true, false, false, false]);
    assert_eq!(shot.pixel(2, 8), color::RED);
    assert_eq!(shot.pixel(10, 0), color::BLACK);
}

#[test]
fn try_lock_fails_while_a_scope_is_live() {
    let w = small();
    let scope = w.lock_target(RenderTarget::Screen);
    assert!(w.try_lock_target(RenderTarget::Screen).is_none());
    drop(scope);
    assert!(w.try_lock_target(RenderTarget::Screen).is_some());
}

#[test]
fn scope_serialises_drawing_across_threads() {
    let w = Arc::new(small());
    let scope = w.lock_target(RenderTarget::Screen);

    let (tx, rx) = mpsc::channel();
    let worker = {
        let w = Arc::clone(&w);
        thread::spawn(move || {
            w.with_target(RenderTarget::Screen, |s| s.clear(color::RED));
            tx.send(()).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    drop(scope);
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    worker.join().unwrap();
    assert_eq!(w.screenshot().pixel(0, 0), color::RED);
}

#[test]
fn scope_is_released_on_panic() {
    let w = Arc::new(small());
    let w2 = Arc::clone(&w);
    let result = thread::spawn(move || {
        w2.with_target(RenderTarget::Screen, |s| {
            s.clear(color::RED);
            if s.scale() > 0 {
                panic!("draw failed");
            }
        });
    })
    .join();
    assert!(result.is_err());
    assert!(w.try_lock_target(RenderTarget::Screen).is_some());
}
