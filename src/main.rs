use std::f32::consts::TAU;
use std::sync::Arc;

use anyhow::Context as _;
use neswitch::audio::{waveform, CallbackStats, FixedTime, SAMPLE_RATE};
use neswitch::engine::{Context, EngineBuilder, EngineConfig, Frontend};
use neswitch::logging::{init_logging, LoggingConfig};
use neswitch::{color, font, Input, KeyCode, MouseButton, Rect, RenderTarget, Window};

// ── Menu bar layout (virtual pixels) ─────────────────────────────────────────

const BAR_HEIGHT: i32 = 12;
const TEXT_INSET: i32 = 2;
const ITEM_HEIGHT: i32 = 10;
const SEPARATOR: &str = "-";

const MENUS: &[(&str, &[&str])] = &[
    ("File", &["Open"]),
    ("Edit", &["Cut", "Copy", "Paste", SEPARATOR, "Undo", "Redo"]),
];

const TONE_HZ: f32 = 220.0;
const TONE_VOLUME: f32 = 0.1;

fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * font::GLYPH_SIZE
}

/// Header rectangle of every menu, left to right.
fn menu_headers() -> Vec<Rect> {
    let mut x = 0;
    MENUS
        .iter()
        .map(|(title, _)| {
            let w = text_width(title) + 2 * font::GLYPH_SIZE;
            let rect = Rect::new(x, 0, w, BAR_HEIGHT);
            x += w;
            rect
        })
        .collect()
}

/// Dropdown rectangle of one item of menu `menu`.
fn item_rect(menu: usize, item: usize) -> Rect {
    let header = menu_headers()[menu];
    let (_, items) = MENUS[menu];
    let widest = items.iter().map(|i| text_width(i)).max().unwrap_or(0);
    Rect::new(
        header.x,
        BAR_HEIGHT + item as i32 * ITEM_HEIGHT,
        widest + 2 * font::GLYPH_SIZE,
        ITEM_HEIGHT,
    )
}

// ── Demo ──────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Demo {
    open_menu: Option<usize>,
    hovered: Option<(usize, usize)>,
    audio_stats: Option<Arc<CallbackStats>>,
    screenshots: u32,
}

impl Demo {
    /// Mouse position in virtual pixels.
    fn cursor(window: &Window, input: &Input) -> (i32, i32) {
        let scale = window.resolution_scale();
        (input.mouse_x() / scale, input.mouse_y() / scale)
    }

    fn item_at(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let menu = self.open_menu?;
        let (_, items) = MENUS[menu];
        (0..items.len())
            .find(|&i| items[i] != SEPARATOR && item_rect(menu, i).contains(x, y))
            .map(|i| (menu, i))
    }

    fn click(&mut self, x: i32, y: i32) {
        if let Some(header) = menu_headers().iter().position(|r| r.contains(x, y)) {
            self.open_menu = if self.open_menu == Some(header) { None } else { Some(header) };
            return;
        }
        if let Some((menu, item)) = self.item_at(x, y) {
            log::info!("{}->{}", MENUS[menu].0, MENUS[menu].1[item]);
        }
        self.open_menu = None;
    }

    fn start_tone(&mut self, ctx: &mut Context) {
        let Some(audio) = ctx.audio.as_mut() else { return };
        let step = TONE_HZ / SAMPLE_RATE as f32;
        let mut phase = FixedTime::default();
        let started = audio.setup(move |buffer| {
            for sample in buffer.iter_mut() {
                let t = phase.frac() * TAU;
                *sample = TONE_VOLUME * waveform::pulse_square(t, 0.5, waveform::DEFAULT_HARMONICS);
                phase += step;
                phase = FixedTime::new(phase.frac());
            }
        });
        if started.is_ok() {
            self.audio_stats = Some(Arc::clone(audio.stats()));
        }
    }

    fn save_screenshot(&mut self, window: &Window) {
        self.screenshots += 1;
        let path = format!("screenshot_{:03}.png", self.screenshots);
        match window.screenshot().save_png(&path) {
            Ok(()) => log::info!("Saved {path}"),
            Err(e) => log::error!("Could not save {path}: {e}"),
        }
    }

    fn draw_menu_bar(&self, window: &Window) {
        let mut scope = window.lock_target(RenderTarget::Screen);
        scope.fill_rect(Rect::new(0, 0, window.virtual_width(), BAR_HEIGHT), color::DARK_GREY);
        for (i, header) in menu_headers().into_iter().enumerate() {
            if self.open_menu == Some(i) {
                scope.fill_rect(header, color::DARK_BLUE);
            }
            scope.draw_string(header.x + font::GLYPH_SIZE, TEXT_INSET, MENUS[i].0, color::WHITE);
        }

        let Some(menu) = self.open_menu else { return };
        for (i, item) in MENUS[menu].1.iter().enumerate() {
            let rect = item_rect(menu, i);
            let fill = if self.hovered == Some((menu, i)) { color::DARK_BLUE } else { color::GREY };
            scope.fill_rect(rect, fill);
            if *item == SEPARATOR {
                let mid = rect.y + rect.h / 2;
                scope.fill_rect(Rect::new(rect.x + 2, mid, rect.w - 4, 1), color::DARK_GREY);
            } else {
                scope.draw_string(rect.x + font::GLYPH_SIZE, rect.y + 1, item, color::BLACK);
            }
        }
        let first = item_rect(menu, 0);
        let height = MENUS[menu].1.len() as i32 * ITEM_HEIGHT;
        scope.draw_rect(Some(Rect::new(first.x, first.y, first.w, height)), color::BLACK);
    }

    fn draw_audio(&self, window: &Window) {
        let Some(stats) = &self.audio_stats else { return };
        let width = window.virtual_width();
        let area = Rect::new(8, 40, width - 16, 64);
        let mid = area.y + area.h / 2;

        let mut scope = window.lock_target(RenderTarget::Screen);
        scope.fill_rect(area, color::VERY_DARK_GREEN);
        scope.draw_rect(Some(area), color::DARK_GREEN);

        let samples = stats.last_buffer();
        if !samples.is_empty() {
            for x in 0..area.w {
                let i = x as usize * samples.len() / area.w as usize;
                let y = mid - (samples[i] / TONE_VOLUME * (area.h / 2 - 1) as f32) as i32;
                scope.draw_pixel(area.x + x, y.clamp(area.y, area.y + area.h - 1), color::GREEN);
            }
        }

        let text = format!("avg callback {:.3} ms", stats.average_callback_time() * 1000.0);
        scope.draw_string(area.x, area.y + area.h + 4, &text, color::WHITE);
    }
}

impl Frontend for Demo {
    fn start(&mut self, ctx: &mut Context) {
        self.start_tone(ctx);
    }

    fn update(&mut self, ctx: &mut Context, _dt: f32) {
        let Some(window) = ctx.main_window().cloned() else { return };
        let (x, y) = Self::cursor(&window, &ctx.input);
        self.hovered = self.item_at(x, y);
        if ctx.input.mouse_button(MouseButton::Left).pressed {
            self.click(x, y);
        }
        if ctx.input.key(KeyCode::F12).pressed {
            self.save_screenshot(&window);
        }
        if ctx.input.key(KeyCode::Escape).pressed {
            ctx.request_quit();
        }
    }

    fn draw(&mut self, window: &Window, _input: &Input, _dt: f32) {
        window.with_target(RenderTarget::Screen, |scope| scope.clear(color::VERY_DARK_GREY));
        self.draw_audio(window);
        self.draw_menu_bar(window);
    }
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let mut config = EngineConfig::default();
    let mut multithread = false;
    let mut audio = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                config = EngineConfig::load(&path).with_context(|| format!("loading {path}"))?;
            }
            "--multithread" => multithread = true,
            "--audio" => audio = true,
            other => anyhow::bail!("unknown argument `{other}`"),
        }
    }

    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..Default::default()
    });

    let mut builder = EngineBuilder::new().with_config(config);
    if multithread {
        builder = builder.multithreaded();
    }
    if audio {
        builder = builder.with_audio();
    }
    builder.run(Demo::default())?;
    Ok(())
}
