//! Platform windows.
//!
//! A window owns the OS event pump. Every platform event is translated into an
//! engine [`Event`] and handed to the single registered [`EventCallback`].

mod config;
mod headless;
mod winit_window;

use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::events::Event;

pub use config::WindowConfig;
pub use headless::{EventScript, HeadlessWindow};
pub use winit_window::WinitWindow;

/// Receives every event the window produces during `on_update`.
pub type EventCallback = Box<dyn FnMut(Event)>;

/// Anything a GPU surface can be created from.
pub trait WindowHandleSource: HasWindowHandle + HasDisplayHandle + Send + Sync {}

impl<T> WindowHandleSource for T where T: HasWindowHandle + HasDisplayHandle + Send + Sync + ?Sized {}

/// Shared native window handle. Owning it keeps the OS window alive.
pub type NativeHandle = Arc<dyn WindowHandleSource>;

pub trait Window {
    /// Pumps platform events and forwards them to the callback.
    fn on_update(&mut self);

    /// Logical size.
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Drawable size in physical pixels.
    fn framebuffer_size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn dpi_scale(&self) -> f32 {
        1.0
    }

    fn set_title(&mut self, title: &str);

    fn set_vsync(&mut self, enabled: bool);
    fn is_vsync(&self) -> bool;

    /// Replaces any previously registered callback.
    fn set_event_callback(&mut self, callback: EventCallback);

    /// `None` for windows without an OS surface.
    fn native_handle(&self) -> Option<NativeHandle> {
        None
    }
}
