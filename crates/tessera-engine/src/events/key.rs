use std::fmt;

use crate::input::KeyCode;

/// Key went down. `repeat_count` is 0 for the initial press and 1 for
/// platform auto-repeat.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyPressedEvent {
    pub key: KeyCode,
    pub repeat_count: u32,
}

impl KeyPressedEvent {
    pub fn new(key: KeyCode, repeat_count: u32) -> Self {
        Self { key, repeat_count }
    }

    #[inline]
    pub fn is_repeat(&self) -> bool {
        self.repeat_count > 0
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyReleasedEvent {
    pub key: KeyCode,
}

impl KeyReleasedEvent {
    pub fn new(key: KeyCode) -> Self {
        Self { key }
    }
}

/// Text input, carrying a Unicode scalar value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyTypedEvent {
    pub code: u32,
}

impl KeyTypedEvent {
    pub fn new(code: u32) -> Self {
        Self { code }
    }

    pub fn character(&self) -> Option<char> {
        char::from_u32(self.code)
    }
}

impl fmt::Display for KeyPressedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPressed: {} ({} repeats)", self.key, self.repeat_count)
    }
}

impl fmt::Display for KeyReleasedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyReleased: {}", self.key)
    }
}

impl fmt::Display for KeyTypedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.character() {
            Some(c) => write!(f, "KeyTyped: {c:?}"),
            None => write!(f, "KeyTyped: U+{:04X}", self.code),
        }
    }
}
