use std::fmt;

/// Window close requested by the platform.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct WindowCloseEvent;

/// Framebuffer resized. A `0x0` size means the window was minimized.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowResizeEvent {
    pub width: u32,
    pub height: u32,
}

impl WindowResizeEvent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_zero_sized(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct WindowFocusEvent;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct WindowLostFocusEvent;

/// Window moved to a new position in desktop coordinates.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowMovedEvent {
    pub x: i32,
    pub y: i32,
}

impl WindowMovedEvent {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AppTickEvent;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AppUpdateEvent;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AppRenderEvent;

impl fmt::Display for WindowResizeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowResize: {}x{}", self.width, self.height)
    }
}

impl fmt::Display for WindowMovedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowMoved: {}, {}", self.x, self.y)
    }
}

macro_rules! display_as_name {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str($name)
                }
            }
        )*
    };
}

display_as_name! {
    WindowCloseEvent => "WindowClose",
    WindowFocusEvent => "WindowFocus",
    WindowLostFocusEvent => "WindowLostFocus",
    AppTickEvent => "AppTick",
    AppUpdateEvent => "AppUpdate",
    AppRenderEvent => "AppRender",
}
