use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window as OsWindow, WindowAttributes, WindowId};

use crate::events::{
    Event, KeyPressedEvent, KeyReleasedEvent, KeyTypedEvent, MouseButtonPressedEvent,
    MouseButtonReleasedEvent, MouseMovedEvent, MouseScrolledEvent, WindowCloseEvent,
    WindowFocusEvent, WindowLostFocusEvent, WindowMovedEvent, WindowResizeEvent,
};
use crate::input::{KeyCode, MouseButton};

use super::{EventCallback, NativeHandle, Window, WindowConfig};

/// Pixel scroll deltas (touchpads) are converted to lines at this rate.
const PIXELS_PER_SCROLL_LINE: f64 = 20.0;

/// Upper bound on pumps while waiting for the platform to resume.
const STARTUP_PUMPS: usize = 16;

/// Desktop window backed by winit.
///
/// The event loop is pumped once per `on_update` instead of owning the
/// thread, so the application keeps control of its frame loop.
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    pump: PumpState,
    window: Arc<OsWindow>,
    vsync: bool,
    callback: Option<EventCallback>,
}

struct PumpState {
    attributes: Option<WindowAttributes>,
    window: Option<Arc<OsWindow>>,
    create_error: Option<winit::error::OsError>,
    scale_factor: f64,
    events: Vec<Event>,
}

impl WinitWindow {
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let mut event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

        let attributes = OsWindow::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64))
            .with_resizable(config.resizable)
            .with_visible(config.visible);

        let mut pump = PumpState {
            attributes: Some(attributes),
            window: None,
            create_error: None,
            scale_factor: 1.0,
            events: Vec::new(),
        };

        for _ in 0..STARTUP_PUMPS {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut pump)
            {
                bail!("event loop exited during startup (code {code})");
            }
            if pump.window.is_some() || pump.create_error.is_some() {
                break;
            }
        }

        if let Some(err) = pump.create_error.take() {
            bail!("failed to create window: {err}");
        }
        let window = pump
            .window
            .clone()
            .context("event loop did not resume; no window was created")?;
        pump.scale_factor = window.scale_factor();

        let size = window.inner_size();
        log::info!(
            "created window \"{}\" ({}x{} physical)",
            config.title,
            size.width,
            size.height
        );

        Ok(Self {
            event_loop,
            pump,
            window,
            vsync: config.vsync,
            callback: None,
        })
    }
}

impl Window for WinitWindow {
    fn on_update(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.pump);
        if let PumpStatus::Exit(code) = status {
            log::info!("event loop exited (code {code})");
            self.pump.events.push(WindowCloseEvent.into());
        }

        let events = std::mem::take(&mut self.pump.events);
        match self.callback.as_mut() {
            Some(callback) => {
                for event in events {
                    callback(event);
                }
            }
            None => log::trace!("dropped {} window events (no callback)", events.len()),
        }
    }

    fn width(&self) -> u32 {
        let logical: LogicalSize<u32> = self.window.inner_size().to_logical(self.pump.scale_factor);
        logical.width
    }

    fn height(&self) -> u32 {
        let logical: LogicalSize<u32> = self.window.inner_size().to_logical(self.pump.scale_factor);
        logical.height
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn dpi_scale(&self) -> f32 {
        self.pump.scale_factor as f32
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Takes effect when the renderer configures its surface.
    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
    }

    fn is_vsync(&self) -> bool {
        self.vsync
    }

    fn set_event_callback(&mut self, callback: EventCallback) {
        self.callback = Some(callback);
    }

    fn native_handle(&self) -> Option<NativeHandle> {
        let handle: NativeHandle = self.window.clone();
        Some(handle)
    }
}

impl ApplicationHandler for PumpState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(attributes) = self.attributes.take() else {
            return;
        };
        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.create_error = Some(e),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::ScaleFactorChanged { scale_factor, .. } = &event {
            self.scale_factor = *scale_factor;
        }
        translate_window_event(self.scale_factor, &event, &mut self.events);
    }
}

fn translate_window_event(scale: f64, event: &WindowEvent, out: &mut Vec<Event>) {
    match event {
        WindowEvent::CloseRequested => out.push(WindowCloseEvent.into()),

        WindowEvent::Resized(size) => {
            out.push(WindowResizeEvent::new(size.width, size.height).into());
        }

        WindowEvent::Moved(pos) => out.push(WindowMovedEvent::new(pos.x, pos.y).into()),

        WindowEvent::Focused(true) => out.push(WindowFocusEvent.into()),
        WindowEvent::Focused(false) => out.push(WindowLostFocusEvent.into()),

        WindowEvent::KeyboardInput { event, .. } => {
            let key = map_key(event.physical_key);
            match event.state {
                ElementState::Pressed => {
                    let repeat_count = u32::from(event.repeat);
                    out.push(KeyPressedEvent::new(key, repeat_count).into());

                    if let Some(text) = &event.text {
                        out.extend(
                            text.chars()
                                .filter(|c| !c.is_control())
                                .map(|c| Event::from(KeyTypedEvent::new(c as u32))),
                        );
                    }
                }
                ElementState::Released => out.push(KeyReleasedEvent::new(key).into()),
            }
        }

        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_mouse_button(*button);
            let event: Event = match state {
                ElementState::Pressed => MouseButtonPressedEvent::new(button).into(),
                ElementState::Released => MouseButtonReleasedEvent::new(button).into(),
            };
            out.push(event);
        }

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical_f32(scale, *position);
            out.push(MouseMovedEvent::new(x, y).into());
        }

        WindowEvent::MouseWheel { delta, .. } => {
            let (x, y) = scroll_lines(scale, *delta);
            out.push(MouseScrolledEvent::new(x, y).into());
        }

        _ => {}
    }
}

fn scroll_lines(scale: f64, delta: MouseScrollDelta) -> (f32, f32) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (x, y),
        MouseScrollDelta::PixelDelta(p) => {
            let logical = p.to_logical::<f64>(scale);
            (
                (logical.x / PIXELS_PER_SCROLL_LINE) as f32,
                (logical.y / PIXELS_PER_SCROLL_LINE) as f32,
            )
        }
    }
}

fn to_logical_f32(scale: f64, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> KeyCode {
    let PhysicalKey::Code(code) = pk else {
        return KeyCode::Unknown(0);
    };

    match code {
        WinitKeyCode::Escape => KeyCode::Escape,
        WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => KeyCode::Enter,
        WinitKeyCode::Tab => KeyCode::Tab,
        WinitKeyCode::Backspace => KeyCode::Backspace,
        WinitKeyCode::Space => KeyCode::Space,

        WinitKeyCode::Insert => KeyCode::Insert,
        WinitKeyCode::Delete => KeyCode::Delete,
        WinitKeyCode::Home => KeyCode::Home,
        WinitKeyCode::End => KeyCode::End,
        WinitKeyCode::PageUp => KeyCode::PageUp,
        WinitKeyCode::PageDown => KeyCode::PageDown,

        WinitKeyCode::ArrowUp => KeyCode::Up,
        WinitKeyCode::ArrowDown => KeyCode::Down,
        WinitKeyCode::ArrowLeft => KeyCode::Left,
        WinitKeyCode::ArrowRight => KeyCode::Right,

        WinitKeyCode::ShiftLeft => KeyCode::LeftShift,
        WinitKeyCode::ShiftRight => KeyCode::RightShift,
        WinitKeyCode::ControlLeft => KeyCode::LeftControl,
        WinitKeyCode::ControlRight => KeyCode::RightControl,
        WinitKeyCode::AltLeft => KeyCode::LeftAlt,
        WinitKeyCode::AltRight => KeyCode::RightAlt,
        WinitKeyCode::SuperLeft => KeyCode::LeftSuper,
        WinitKeyCode::SuperRight => KeyCode::RightSuper,

        WinitKeyCode::KeyA => KeyCode::A,
        WinitKeyCode::KeyB => KeyCode::B,
        WinitKeyCode::KeyC => KeyCode::C,
        WinitKeyCode::KeyD => KeyCode::D,
        WinitKeyCode::KeyE => KeyCode::E,
        WinitKeyCode::KeyF => KeyCode::F,
        WinitKeyCode::KeyG => KeyCode::G,
        WinitKeyCode::KeyH => KeyCode::H,
        WinitKeyCode::KeyI => KeyCode::I,
        WinitKeyCode::KeyJ => KeyCode::J,
        WinitKeyCode::KeyK => KeyCode::K,
        WinitKeyCode::KeyL => KeyCode::L,
        WinitKeyCode::KeyM => KeyCode::M,
        WinitKeyCode::KeyN => KeyCode::N,
        WinitKeyCode::KeyO => KeyCode::O,
        WinitKeyCode::KeyP => KeyCode::P,
        WinitKeyCode::KeyQ => KeyCode::Q,
        WinitKeyCode::KeyR => KeyCode::R,
        WinitKeyCode::KeyS => KeyCode::S,
        WinitKeyCode::KeyT => KeyCode::T,
        WinitKeyCode::KeyU => KeyCode::U,
        WinitKeyCode::KeyV => KeyCode::V,
        WinitKeyCode::KeyW => KeyCode::W,
        WinitKeyCode::KeyX => KeyCode::X,
        WinitKeyCode::KeyY => KeyCode::Y,
        WinitKeyCode::KeyZ => KeyCode::Z,

        WinitKeyCode::Digit0 => KeyCode::Digit0,
        WinitKeyCode::Digit1 => KeyCode::Digit1,
        WinitKeyCode::Digit2 => KeyCode::Digit2,
        WinitKeyCode::Digit3 => KeyCode::Digit3,
        WinitKeyCode::Digit4 => KeyCode::Digit4,
        WinitKeyCode::Digit5 => KeyCode::Digit5,
        WinitKeyCode::Digit6 => KeyCode::Digit6,
        WinitKeyCode::Digit7 => KeyCode::Digit7,
        WinitKeyCode::Digit8 => KeyCode::Digit8,
        WinitKeyCode::Digit9 => KeyCode::Digit9,

        WinitKeyCode::F1 => KeyCode::F1,
        WinitKeyCode::F2 => KeyCode::F2,
        WinitKeyCode::F3 => KeyCode::F3,
        WinitKeyCode::F4 => KeyCode::F4,
        WinitKeyCode::F5 => KeyCode::F5,
        WinitKeyCode::F6 => KeyCode::F6,
        WinitKeyCode::F7 => KeyCode::F7,
        WinitKeyCode::F8 => KeyCode::F8,
        WinitKeyCode::F9 => KeyCode::F9,
        WinitKeyCode::F10 => KeyCode::F10,
        WinitKeyCode::F11 => KeyCode::F11,
        WinitKeyCode::F12 => KeyCode::F12,

        other => KeyCode::Unknown(other as u32),
    }
}
