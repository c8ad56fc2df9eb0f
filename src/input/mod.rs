use std::collections::HashMap;

use glam::IVec2;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
use winit::keyboard::PhysicalKey;

// ── Button ────────────────────────────────────────────────────────────────────

/// Tri-state of a key or mouse button.
///
/// `pressed` and `released` are edges: true for exactly one update cycle at
/// the transition. `held` is the level in between.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Button {
    pub pressed: bool,
    pub held: bool,
    pub released: bool,
}

impl Button {
    fn clear_edges(&mut self) {
        self.pressed = false;
        self.released = false;
    }

    /// Apply a new level, raising the matching edge on a transition.
    fn set_level(&mut self, down: bool) {
        if down && !self.held {
            self.held = true;
            self.pressed = true;
        } else if !down && self.held {
            self.held = false;
            self.released = true;
        }
    }
}

// ── Mouse ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Mouse {
    /// Cursor position in window pixels.
    pub position: IVec2,
    /// Wheel movement since the last update, in lines.
    pub wheel: i32,
    /// Previous position minus current position.
    pub delta: IVec2,
    pub left: Button,
    pub right: Button,
    pub middle: Button,
}

const LEFT_MASK: u8 = 1 << 0;
const RIGHT_MASK: u8 = 1 << 1;
const MIDDLE_MASK: u8 = 1 << 2;

/// Device state as last reported by the platform; sampled once per update.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct DeviceState {
    cursor: IVec2,
    buttons: u8,
}

// ── InputEvent ────────────────────────────────────────────────────────────────

/// Platform-agnostic input event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Vertical wheel movement in lines.
    Wheel(i32),
    CursorMoved(IVec2),
    MouseButton { button: MouseButton, down: bool },
}

/// Translate a winit event into an [`InputEvent`].
///
/// Returns `None` for events the input layer does not track.
pub fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            let PhysicalKey::Code(code) = event.physical_key else { return None };
            Some(match event.state {
                ElementState::Pressed => InputEvent::KeyDown(code),
                ElementState::Released => InputEvent::KeyUp(code),
            })
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let lines = match delta {
                MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
                MouseScrollDelta::PixelDelta(pos) => (pos.y / 100.0).round() as i32,
            };
            Some(InputEvent::Wheel(lines))
        }
        WindowEvent::CursorMoved { position, .. } => {
            Some(InputEvent::CursorMoved(IVec2::new(position.x as i32, position.y as i32)))
        }
        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::MouseButton {
            button: *button,
            down: *state == ElementState::Pressed,
        }),
        _ => None,
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Keyboard and mouse tables for one process.
///
/// Call [`Input::update`] once per frame before routing that frame's events
/// through [`Input::handle_event`]. Key edges come from events; mouse button
/// edges come from comparing the polled device state on each update.
#[derive(Clone, Debug, Default)]
pub struct Input {
    keys: HashMap<KeyCode, Button>,
    mouse: Mouse,
    device: DeviceState,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `key`. The first query creates an all-false entry.
    pub fn key(&mut self, key: KeyCode) -> Button {
        *self.keys.entry(key).or_default()
    }

    /// State of `key` without creating an entry.
    pub fn peek_key(&self, key: KeyCode) -> Button {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    /// Number of keys with an entry in the table.
    pub fn tracked_keys(&self) -> usize {
        self.keys.len()
    }

    /// State of a mouse button. Buttons other than right and middle read as
    /// the left button.
    pub fn mouse_button(&self, button: MouseButton) -> Button {
        match button {
            MouseButton::Right => self.mouse.right,
            MouseButton::Middle => self.mouse.middle,
            _ => self.mouse.left,
        }
    }

    pub fn mouse(&self) -> &Mouse {
        &self.mouse
    }

    pub fn mouse_x(&self) -> i32 { self.mouse.position.x }
    pub fn mouse_y(&self) -> i32 { self.mouse.position.y }
    pub fn mouse_wheel(&self) -> i32 { self.mouse.wheel }

    /// Start a new input cycle: clear every edge and the wheel, then sample
    /// the device state for cursor movement and mouse button transitions.
    pub fn update(&mut self) {
        for button in self.keys.values_mut() {
            button.clear_edges();
        }

        let DeviceState { cursor, buttons } = self.device;
        let mouse = &mut self.mouse;
        mouse.wheel = 0;
        mouse.delta = mouse.position - cursor;
        mouse.position = cursor;

        for (button, mask) in [
            (&mut mouse.left, LEFT_MASK),
            (&mut mouse.right, RIGHT_MASK),
            (&mut mouse.middle, MIDDLE_MASK),
        ] {
            button.clear_edges();
            button.set_level(buttons & mask != 0);
        }
    }

    /// Apply one event. Returns `true` if the event was consumed here; cursor
    /// and mouse button events only update the device state sampled by the
    /// next [`Input::update`] and are not consumed.
    pub fn apply(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::KeyDown(code) => {
                self.keys.entry(code).or_default().set_level(true);
                true
            }
            InputEvent::KeyUp(code) => {
                self.keys.entry(code).or_default().set_level(false);
                true
            }
            InputEvent::Wheel(lines) => {
                self.mouse.wheel = lines;
                true
            }
            InputEvent::CursorMoved(pos) => {
                self.device.cursor = pos;
                false
            }
            InputEvent::MouseButton { button, down } => {
                let mask = match button {
                    MouseButton::Left => LEFT_MASK,
                    MouseButton::Right => RIGHT_MASK,
                    MouseButton::Middle => MIDDLE_MASK,
                    _ => return false,
                };
                if down {
                    self.device.buttons |= mask;
                } else {
                    self.device.buttons &= !mask;
                }
                false
            }
        }
    }

    /// Translate and apply a winit event.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        translate_window_event(event).is_some_and(|e| self.apply(e))
    }
}
