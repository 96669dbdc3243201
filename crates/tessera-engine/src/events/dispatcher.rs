use super::event::{Event, EventType};

/// Routes one event to type-specific handlers.
///
/// Each `dispatch::<T>` call checks the event's runtime kind against `T::KIND`.
/// On a match the handler runs and its return value overwrites
/// `event.handled`. Handlers for other kinds are never invoked.
pub struct EventDispatcher<'a> {
    event: &'a mut Event,
}

impl<'a> EventDispatcher<'a> {
    pub fn new(event: &'a mut Event) -> Self {
        Self { event }
    }

    /// Returns `true` if the kinds matched and `handler` ran.
    pub fn dispatch<T: EventType>(&mut self, handler: impl FnOnce(&T) -> bool) -> bool {
        if self.event.kind() != T::KIND {
            return false;
        }
        let Some(payload) = T::from_payload(self.event.payload()) else {
            return false;
        };
        let handled = handler(payload);
        self.event.handled = handled;
        true
    }

    #[inline]
    pub fn event(&self) -> &Event {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{
        KeyPressedEvent, MouseScrolledEvent, WindowCloseEvent, WindowResizeEvent,
    };
    use crate::input::KeyCode;

    #[test]
    fn matching_kind_runs_handler_and_sets_handled() {
        let mut event = Event::from(WindowResizeEvent::new(800, 600));
        let mut seen = None;
        let ran = EventDispatcher::new(&mut event).dispatch::<WindowResizeEvent>(|e| {
            seen = Some((e.width, e.height));
            true
        });
        assert!(ran);
        assert_eq!(seen, Some((800, 600)));
        assert!(event.handled);
    }

    #[test]
    fn mismatched_kind_skips_handler() {
        let mut event = Event::from(KeyPressedEvent::new(KeyCode::W, 0));
        let mut calls = 0;
        let ran = EventDispatcher::new(&mut event).dispatch::<WindowCloseEvent>(|_| {
            calls += 1;
            true
        });
        assert!(!ran);
        assert_eq!(calls, 0);
        assert!(!event.handled);
    }

    #[test]
    fn handler_result_overwrites_flag() {
        let mut event = Event::from(MouseScrolledEvent::new(0.0, 1.0));
        event.handled = true;
        let mut dispatcher = EventDispatcher::new(&mut event);
        assert!(dispatcher.dispatch::<MouseScrolledEvent>(|_| false));
        assert!(!event.handled);
    }

    #[test]
    fn several_dispatches_on_one_event() {
        let mut event = Event::from(WindowCloseEvent);
        let mut dispatcher = EventDispatcher::new(&mut event);
        assert!(!dispatcher.dispatch::<WindowResizeEvent>(|_| true));
        assert!(dispatcher.dispatch::<WindowCloseEvent>(|_| true));
        assert!(dispatcher.event().handled);
    }
}
