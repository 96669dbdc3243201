use std::fmt;

use crate::input::MouseButton;

/// Cursor position in logical window pixels, origin top-left.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseMovedEvent {
    pub x: f32,
    pub y: f32,
}

impl MouseMovedEvent {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Scroll delta in "lines". Positive `y_offset` scrolls up / away from the user.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseScrolledEvent {
    pub x_offset: f32,
    pub y_offset: f32,
}

impl MouseScrolledEvent {
    pub fn new(x_offset: f32, y_offset: f32) -> Self {
        Self { x_offset, y_offset }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MouseButtonPressedEvent {
    pub button: MouseButton,
}

impl MouseButtonPressedEvent {
    pub fn new(button: MouseButton) -> Self {
        Self { button }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MouseButtonReleasedEvent {
    pub button: MouseButton,
}

impl MouseButtonReleasedEvent {
    pub fn new(button: MouseButton) -> Self {
        Self { button }
    }
}

impl fmt::Display for MouseMovedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseMoved: {}, {}", self.x, self.y)
    }
}

impl fmt::Display for MouseScrolledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseScrolled: {}, {}", self.x_offset, self.y_offset)
    }
}

impl fmt::Display for MouseButtonPressedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseButtonPressed: {}", self.button)
    }
}

impl fmt::Display for MouseButtonReleasedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseButtonReleased: {}", self.button)
    }
}
