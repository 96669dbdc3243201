//! Typed engine events.
//!
//! Events are produced by the window layer, routed by reference through the
//! application and layer stack, and dropped at the end of the frame. There is
//! no queue persistence and no broadcast: consumers mark an event handled and
//! routers stop.

mod application;
mod dispatcher;
mod event;
mod key;
mod mouse;

pub use application::{
    AppRenderEvent, AppTickEvent, AppUpdateEvent, WindowCloseEvent, WindowFocusEvent,
    WindowLostFocusEvent, WindowMovedEvent, WindowResizeEvent,
};
pub use dispatcher::EventDispatcher;
pub use event::{Event, EventGroup, EventKind, EventPayload, EventType};
pub use key::{KeyPressedEvent, KeyReleasedEvent, KeyTypedEvent};
pub use mouse::{
    MouseButtonPressedEvent, MouseButtonReleasedEvent, MouseMovedEvent, MouseScrolledEvent,
};
