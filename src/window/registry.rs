use std::cell::Cell;
use std::sync::Arc;

use super::Window;

/// Upper bound on simultaneously live windows.
pub const MAX_WINDOWS: usize = 256;

/// Stable handle of a live window. Released when the window is closed and
/// handed to the next window opened after that.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u32);

impl WindowId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Every one of the [`MAX_WINDOWS`] slots is taken.
    Full,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Full => write!(f, "window registry is full ({MAX_WINDOWS} windows)"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Slot arena of live windows.
///
/// A new window takes the lowest free slot, so ids stay unique among live
/// windows and are only reused once their previous owner is closed.
#[derive(Default)]
pub struct WindowRegistry {
    slots: Vec<Option<Arc<Window>>>,
    main: Cell<Option<WindowId>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn vacant(&self) -> Option<WindowId> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.slots.len());
        (index < MAX_WINDOWS).then(|| WindowId::new(index as u32))
    }

    /// Build a window for the lowest free id and store it.
    ///
    /// `build` is not called when the registry is full.
    pub fn insert_with<F>(&mut self, build: F) -> Result<WindowId, RegistryError>
    where
        F: FnOnce(WindowId) -> Window,
    {
        let Some(id) = self.vacant() else {
            log::error!("Window couldn't be added to the registry: {}", RegistryError::Full);
            return Err(RegistryError::Full);
        };
        let window = Arc::new(build(id));
        if id.index() == self.slots.len() {
            self.slots.push(Some(window));
        } else {
            self.slots[id.index()] = Some(window);
        }
        log::info!("Created window {id}");
        Ok(id)
    }

    /// Remove a window, freeing its id. Returns the registry's handle so the
    /// caller decides when the window is dropped.
    pub fn remove(&mut self, id: WindowId) -> Option<Arc<Window>> {
        let window = self.slots.get_mut(id.index())?.take()?;
        if self.main.get() == Some(id) {
            self.main.set(None);
        }
        log::info!("Closed window {id}");
        Some(window)
    }

    /// Bounds-checked lookup; `None` for free or never-allocated ids.
    pub fn get(&self, id: WindowId) -> Option<&Arc<Window>> {
        self.slots.get(id.index())?.as_ref()
    }

    /// The main window: the cached one while it lives, otherwise the first
    /// live window, which becomes the new cached main.
    pub fn main(&self) -> Option<&Arc<Window>> {
        if let Some(window) = self.main.get().and_then(|id| self.get(id)) {
            return Some(window);
        }
        let (index, window) = self
            .slots
            .iter()
            .enumerate()
            .find_map(|(i, slot)| slot.as_ref().map(|w| (i, w)))?;
        self.main.set(Some(WindowId::new(index as u32)));
        Some(window)
    }

    /// Id of the window wrapping the native window `native`.
    pub fn find_native(&self, native: winit::window::WindowId) -> Option<WindowId> {
        self.iter()
            .find(|(_, w)| w.native_id() == Some(native))
            .map(|(id, _)| id)
    }

    /// Live windows in id order.
    pub fn iter(&self) -> impl Iterator<Item = (WindowId, &Arc<Window>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|w| (WindowId::new(i as u32), w)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every window, highest id first.
    pub fn clear(&mut self) {
        while let Some(slot) = self.slots.pop() {
            drop(slot);
        }
        self.main.set(None);
    }
}
