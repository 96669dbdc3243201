use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::application::{
    AppRenderEvent, AppTickEvent, AppUpdateEvent, WindowCloseEvent, WindowFocusEvent,
    WindowLostFocusEvent, WindowMovedEvent, WindowResizeEvent,
};
use super::key::{KeyPressedEvent, KeyReleasedEvent, KeyTypedEvent};
use super::mouse::{
    MouseButtonPressedEvent, MouseButtonReleasedEvent, MouseMovedEvent, MouseScrolledEvent,
};

/// Exact event kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u16)]
pub enum EventKind {
    None = 0,

    // Window / app
    WindowClose,
    WindowResize,
    WindowFocus,
    WindowLostFocus,
    WindowMoved,
    AppTick,
    AppUpdate,
    AppRender,

    // Keyboard
    KeyPressed,
    KeyReleased,
    KeyTyped,

    // Mouse
    MouseButtonPressed,
    MouseButtonReleased,
    MouseMoved,
    MouseScrolled,
}

/// OR-able group mask used for coarse filtering and routing.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct EventGroup(u32);

impl EventGroup {
    pub const NONE: Self = Self(0);
    pub const APPLICATION: Self = Self(1 << 0);
    pub const INPUT: Self = Self(1 << 1);
    pub const KEYBOARD: Self = Self(1 << 2);
    pub const MOUSE: Self = Self(1 << 3);
    pub const MOUSE_BUTTON: Self = Self(1 << 4);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True when any bit of `other` is set in `self`.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True when every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventGroup {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for EventGroup {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Implemented by every concrete event payload.
///
/// `KIND` is the static identity compared against an event's runtime kind by
/// [`EventDispatcher`](super::EventDispatcher).
pub trait EventType: fmt::Display + Sized {
    const KIND: EventKind;
    const NAME: &'static str;
    const GROUPS: EventGroup;

    /// Returns the payload when `payload` holds this exact type.
    fn from_payload(payload: &EventPayload) -> Option<&Self>;
}

/// Closed set of event payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    WindowClose(WindowCloseEvent),
    WindowResize(WindowResizeEvent),
    WindowFocus(WindowFocusEvent),
    WindowLostFocus(WindowLostFocusEvent),
    WindowMoved(WindowMovedEvent),
    AppTick(AppTickEvent),
    AppUpdate(AppUpdateEvent),
    AppRender(AppRenderEvent),
    KeyPressed(KeyPressedEvent),
    KeyReleased(KeyReleasedEvent),
    KeyTyped(KeyTypedEvent),
    MouseButtonPressed(MouseButtonPressedEvent),
    MouseButtonReleased(MouseButtonReleasedEvent),
    MouseMoved(MouseMovedEvent),
    MouseScrolled(MouseScrolledEvent),
}

macro_rules! event_payloads {
    ($($variant:ident => $ty:ty, $groups:expr;)*) => {
        $(
            impl EventType for $ty {
                const KIND: EventKind = EventKind::$variant;
                const NAME: &'static str = stringify!($variant);
                const GROUPS: EventGroup = $groups;

                fn from_payload(payload: &EventPayload) -> Option<&Self> {
                    match payload {
                        EventPayload::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for EventPayload {
                fn from(inner: $ty) -> Self {
                    EventPayload::$variant(inner)
                }
            }

            impl From<$ty> for Event {
                fn from(inner: $ty) -> Self {
                    Event::new(EventPayload::$variant(inner))
                }
            }
        )*

        impl EventPayload {
            pub fn kind(&self) -> EventKind {
                match self {
                    $(EventPayload::$variant(_) => EventKind::$variant,)*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(EventPayload::$variant(_) => <$ty as EventType>::NAME,)*
                }
            }

            pub fn groups(&self) -> EventGroup {
                match self {
                    $(EventPayload::$variant(_) => <$ty as EventType>::GROUPS,)*
                }
            }
        }

        impl fmt::Display for EventPayload {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(EventPayload::$variant(inner) => inner.fmt(f),)*
                }
            }
        }
    };
}

const INPUT_KEYBOARD: EventGroup = EventGroup::INPUT.union(EventGroup::KEYBOARD);
const INPUT_MOUSE: EventGroup = EventGroup::INPUT.union(EventGroup::MOUSE);
const INPUT_MOUSE_BUTTON: EventGroup = INPUT_MOUSE.union(EventGroup::MOUSE_BUTTON);

event_payloads! {
    WindowClose => WindowCloseEvent, EventGroup::APPLICATION;
    WindowResize => WindowResizeEvent, EventGroup::APPLICATION;
    WindowFocus => WindowFocusEvent, EventGroup::APPLICATION;
    WindowLostFocus => WindowLostFocusEvent, EventGroup::APPLICATION;
    WindowMoved => WindowMovedEvent, EventGroup::APPLICATION;
    AppTick => AppTickEvent, EventGroup::APPLICATION;
    AppUpdate => AppUpdateEvent, EventGroup::APPLICATION;
    AppRender => AppRenderEvent, EventGroup::APPLICATION;
    KeyPressed => KeyPressedEvent, INPUT_KEYBOARD;
    KeyReleased => KeyReleasedEvent, INPUT_KEYBOARD;
    KeyTyped => KeyTypedEvent, INPUT_KEYBOARD;
    MouseButtonPressed => MouseButtonPressedEvent, INPUT_MOUSE_BUTTON;
    MouseButtonReleased => MouseButtonReleasedEvent, INPUT_MOUSE_BUTTON;
    MouseMoved => MouseMovedEvent, INPUT_MOUSE;
    MouseScrolled => MouseScrolledEvent, INPUT_MOUSE;
}

/// A captured event travelling through the dispatch chain.
///
/// `handled` is the only propagation signal: routers stop walking consumers
/// once it is set. The dispatcher itself never enforces that.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub handled: bool,
    payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            handled: false,
            payload,
        }
    }

    #[inline]
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.payload.name()
    }

    #[inline]
    pub fn groups(&self) -> EventGroup {
        self.payload.groups()
    }

    #[inline]
    pub fn is_in_group(&self, group: EventGroup) -> bool {
        self.groups().intersects(group)
    }

    /// Typed view of the payload, if this event is a `T`.
    pub fn get<T: EventType>(&self) -> Option<&T> {
        T::from_payload(&self.payload)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.payload.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyCode, MouseButton};

    #[test]
    fn groups_follow_event_family() {
        let resize = Event::from(WindowResizeEvent::new(10, 20));
        assert!(resize.is_in_group(EventGroup::APPLICATION));
        assert!(!resize.is_in_group(EventGroup::INPUT));

        let key = Event::from(KeyPressedEvent::new(KeyCode::A, 0));
        assert_eq!(key.groups(), EventGroup::INPUT | EventGroup::KEYBOARD);

        let button = Event::from(MouseButtonPressedEvent::new(MouseButton::Left));
        assert!(button.groups().contains(EventGroup::MOUSE | EventGroup::MOUSE_BUTTON));
        assert!(!button.is_in_group(EventGroup::KEYBOARD));

        let scroll = Event::from(MouseScrolledEvent::new(0.0, 1.0));
        assert!(scroll.is_in_group(EventGroup::MOUSE));
        assert!(!scroll.is_in_group(EventGroup::MOUSE_BUTTON));
    }

    #[test]
    fn kind_matches_static_constant() {
        let e = Event::from(KeyTypedEvent::new('x' as u32));
        assert_eq!(e.kind(), KeyTypedEvent::KIND);
        assert_eq!(e.name(), "KeyTyped");
        assert!(e.get::<KeyTypedEvent>().is_some());
        assert!(e.get::<KeyPressedEvent>().is_none());
    }

    #[test]
    fn display_includes_payload() {
        let e = Event::from(WindowResizeEvent::new(1280, 720));
        assert_eq!(e.to_string(), "WindowResize: 1280x720");

        let e = Event::from(KeyPressedEvent::new(KeyCode::A, 1));
        assert_eq!(e.to_string(), "KeyPressed: A (1 repeats)");

        let e = Event::from(WindowCloseEvent);
        assert_eq!(e.to_string(), "WindowClose");
    }

    #[test]
    fn new_events_are_unhandled() {
        assert!(!Event::from(AppTickEvent).handled);
    }
}
