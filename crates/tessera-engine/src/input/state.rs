use std::collections::HashSet;

use crate::events::{Event, EventPayload};

use super::Input;
use super::types::{KeyCode, MouseButton};

/// Current input state for the application window.
///
/// Fed from the same events the layer stack receives, so polling and
/// event-driven code observe the same history.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: (f32, f32),

    pub keys_down: HashSet<KeyCode>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    pub fn apply_event(&mut self, event: &Event) {
        match event.payload() {
            EventPayload::KeyPressed(e) => {
                self.keys_down.insert(e.key);
            }
            EventPayload::KeyReleased(e) => {
                self.keys_down.remove(&e.key);
            }
            EventPayload::MouseButtonPressed(e) => {
                self.buttons_down.insert(e.button);
            }
            EventPayload::MouseButtonReleased(e) => {
                self.buttons_down.remove(&e.button);
            }
            EventPayload::MouseMoved(e) => {
                self.pointer_pos = (e.x, e.y);
            }
            EventPayload::WindowFocus(_) => {
                self.focused = true;
            }
            EventPayload::WindowLostFocus(_) => {
                self.focused = false;
                // No release events arrive while unfocused; avoid stuck keys.
                self.keys_down.clear();
                self.buttons_down.clear();
            }
            _ => {}
        }
    }
}

impl Input for InputState {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    fn mouse_position(&self) -> (f32, f32) {
        self.pointer_pos
    }
}
