//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Polling goes through the [`Input`] trait so controllers can be driven by
//! the live window state or by a scripted [`FakeInput`].

mod fake;
mod state;
mod types;

pub use fake::FakeInput;
pub use state::InputState;
pub use types::{KeyCode, MouseButton};

/// Polling view of keyboard and mouse state.
pub trait Input {
    fn is_key_pressed(&self, key: KeyCode) -> bool;

    fn is_mouse_button_pressed(&self, button: MouseButton) -> bool;

    /// Pointer position in logical window pixels.
    fn mouse_position(&self) -> (f32, f32);

    fn mouse_x(&self) -> f32 {
        self.mouse_position().0
    }

    fn mouse_y(&self) -> f32 {
        self.mouse_position().1
    }
}
