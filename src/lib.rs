pub mod audio;
pub mod engine;
pub mod font;
pub mod input;
pub mod logging;
pub mod pixel;
pub mod renderer;
pub mod sprite;
pub mod window;

pub use audio::{Audio, AudioError, CallbackStats, FixedTime};
pub use engine::{Context, EngineBuilder, EngineConfig, Frontend, RunMode};
pub use input::{Button, Input, KeyCode, Mouse, MouseButton};
pub use pixel::{color, Pixel, PixelMode};
pub use sprite::{SampleMode, Sprite};
pub use window::{Rect, RenderScope, RenderTarget, TextureId, Window, WindowConfig, WindowId, WindowRegistry};
