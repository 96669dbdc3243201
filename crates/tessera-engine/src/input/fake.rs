use std::collections::HashSet;

use super::Input;
use super::types::{KeyCode, MouseButton};

/// Scriptable input source for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct FakeInput {
    keys: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    position: (f32, f32),
}

impl FakeInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn press_button(&mut self, button: MouseButton) {
        self.buttons.insert(button);
    }

    pub fn release_button(&mut self, button: MouseButton) {
        self.buttons.remove(&button);
    }

    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        self.position = (x, y);
    }

    /// Releases every key and button.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.buttons.clear();
    }
}

impl Input for FakeInput {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    fn mouse_position(&self) -> (f32, f32) {
        self.position
    }
}
