use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::events::{Event, WindowResizeEvent};

use super::{EventCallback, Window, WindowConfig};

/// Handle for feeding events into a [`HeadlessWindow`] after it has been
/// moved into an application.
#[derive(Clone, Default)]
pub struct EventScript {
    queue: Rc<RefCell<VecDeque<Event>>>,
}

impl EventScript {
    pub fn push(&self, event: impl Into<Event>) {
        self.queue.borrow_mut().push_back(event.into());
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

/// A window with no OS surface.
///
/// Scripted events are delivered on the next `on_update`, in push order.
pub struct HeadlessWindow {
    title: String,
    width: u32,
    height: u32,
    vsync: bool,
    script: EventScript,
    callback: Option<EventCallback>,
    updates: u64,
}

impl HeadlessWindow {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            vsync: config.vsync,
            script: EventScript::default(),
            callback: None,
            updates: 0,
        }
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self::new(&WindowConfig::new("tessera headless", width, height))
    }

    pub fn script(&self) -> EventScript {
        self.script.clone()
    }

    pub fn push_event(&self, event: impl Into<Event>) {
        self.script.push(event);
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn update_count(&self) -> u64 {
        self.updates
    }
}

impl Window for HeadlessWindow {
    fn on_update(&mut self) {
        self.updates += 1;

        // Pop one at a time; the callback may push follow-up events.
        loop {
            let next = self.script.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };

            if let Some(e) = event.get::<WindowResizeEvent>() {
                self.width = e.width;
                self.height = e.height;
            }

            match self.callback.as_mut() {
                Some(callback) => callback(event),
                None => log::trace!("headless window dropped {event} (no callback)"),
            }
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
    }

    fn is_vsync(&self) -> bool {
        self.vsync
    }

    fn set_event_callback(&mut self, callback: EventCallback) {
        self.callback = Some(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, WindowCloseEvent};

    #[test]
    fn delivers_scripted_events_in_order() {
        let mut window = HeadlessWindow::with_size(320, 240);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        window.set_event_callback(Box::new(move |e| sink.borrow_mut().push(e.kind())));

        let script = window.script();
        script.push(WindowResizeEvent::new(640, 360));
        script.push(WindowCloseEvent);
        assert_eq!(script.len(), 2);

        window.on_update();
        assert_eq!(*seen.borrow(), vec![EventKind::WindowResize, EventKind::WindowClose]);
        assert!(script.is_empty());
        assert_eq!((window.width(), window.height()), (640, 360));
        assert_eq!(window.update_count(), 1);
    }

    #[test]
    fn events_without_callback_are_discarded() {
        let mut window = HeadlessWindow::with_size(10, 10);
        window.push_event(WindowCloseEvent);
        window.on_update();
        assert!(window.script().is_empty());
    }

    #[test]
    fn has_no_native_handle() {
        let window = HeadlessWindow::new(&WindowConfig::default());
        assert!(window.native_handle().is_none());
        assert_eq!(window.title(), "tessera");
        assert!(window.is_vsync());
    }
}
