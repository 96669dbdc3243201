use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::device::GpuInit;
use crate::events::{Event, EventDispatcher, WindowCloseEvent, WindowResizeEvent};
use crate::input::InputState;
use crate::logging::{LoggingConfig, init_logging};
use crate::renderer::wgpu_backend::WgpuBackend;
use crate::renderer::{RenderError, Renderer, RendererBackend};
use crate::time::FrameClock;
use crate::window::{Window, WindowConfig, WinitWindow};

use super::layer::{LayerCtx, LayerRef};
use super::layer_stack::LayerStack;
use super::overlay::DebugOverlay;

/// Everything needed to bring up the default window and GPU backend.
#[derive(Debug, Clone, Default)]
pub struct ApplicationConfig {
    pub window: WindowConfig,
    pub gpu: GpuInit,
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("an Application already exists in this process")]
    AlreadyExists,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Platform(#[from] anyhow::Error),
}

static INSTANCE: AtomicBool = AtomicBool::new(false);

/// Holds the process-wide instance flag until dropped.
struct InstanceGuard;

impl InstanceGuard {
    fn acquire() -> Result<Self, AppError> {
        INSTANCE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InstanceGuard)
            .map_err(|_| AppError::AlreadyExists)
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        INSTANCE.store(false, Ordering::Release);
    }
}

/// Events produced by the window callback, drained once per frame.
type EventQueue = Rc<RefCell<VecDeque<Event>>>;

/// Owns the window, renderer and layer stack and drives the frame loop.
///
/// Only one may exist at a time.
pub struct Application {
    window: Box<dyn Window>,
    renderer: Renderer,
    input: InputState,
    layers: LayerStack,
    overlay: Rc<RefCell<DebugOverlay>>,
    events: EventQueue,
    clock: FrameClock,
    running: bool,
    minimized: bool,
    // Declared last: released after everything above has dropped.
    _instance: InstanceGuard,
}

impl Application {
    /// Opens a winit window with a wgpu backend.
    pub fn new(config: ApplicationConfig) -> Result<Self, AppError> {
        let instance = InstanceGuard::acquire()?;
        init_logging(config.logging);

        let window = WinitWindow::new(&config.window)?;
        let gpu = config.gpu;
        Self::build(instance, Box::new(window), move |w| {
            let backend: Box<dyn RendererBackend> = Box::new(WgpuBackend::new(w, &gpu)?);
            Ok(backend)
        })
    }

    /// Uses the given window and a backend built for it.
    pub fn with_parts(
        window: Box<dyn Window>,
        make_backend: impl FnOnce(&dyn Window) -> anyhow::Result<Box<dyn RendererBackend>>,
    ) -> Result<Self, AppError> {
        let instance = InstanceGuard::acquire()?;
        Self::build(instance, window, make_backend)
    }

    fn build(
        instance: InstanceGuard,
        mut window: Box<dyn Window>,
        make_backend: impl FnOnce(&dyn Window) -> anyhow::Result<Box<dyn RendererBackend>>,
    ) -> Result<Self, AppError> {
        let events = EventQueue::default();
        let sink = events.clone();
        window.set_event_callback(Box::new(move |event| sink.borrow_mut().push_back(event)));

        let backend = make_backend(window.as_ref())?;
        let mut renderer = Renderer::new();
        renderer.init(backend)?;

        let (width, height) = window.framebuffer_size();
        renderer.set_viewport(0, 0, width, height);
        log::info!(
            "application started: {width}x{height}, backend {:?}",
            renderer.api()
        );

        let mut app = Self {
            window,
            renderer,
            input: InputState::default(),
            layers: LayerStack::new(),
            overlay: Rc::new(RefCell::new(DebugOverlay::new())),
            events,
            clock: FrameClock::new(),
            running: true,
            minimized: width == 0 || height == 0,
            _instance: instance,
        };

        let overlay: LayerRef = app.overlay.clone();
        app.push_overlay(overlay)?;
        Ok(app)
    }

    /// Stores `layer` below every overlay, then attaches it.
    ///
    /// A failed attach removes the layer again.
    pub fn push_layer(&mut self, layer: LayerRef) -> Result<(), AppError> {
        self.layers.push_layer(layer.clone());
        if let Err(e) = self.attach(&layer) {
            self.layers.remove_layer(&layer);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn push_overlay(&mut self, overlay: LayerRef) -> Result<(), AppError> {
        self.layers.push_overlay(overlay.clone());
        if let Err(e) = self.attach(&overlay) {
            self.layers.remove_overlay(&overlay);
            return Err(e.into());
        }
        Ok(())
    }

    /// Removes then detaches. `None` if `layer` is not a normal layer here.
    pub fn pop_layer(&mut self, layer: &LayerRef) -> Option<LayerRef> {
        let removed = self.layers.remove_layer(layer)?;
        self.detach(&removed);
        Some(removed)
    }

    pub fn pop_overlay(&mut self, overlay: &LayerRef) -> Option<LayerRef> {
        let removed = self.layers.remove_overlay(overlay)?;
        self.detach(&removed);
        Some(removed)
    }

    fn attach(&mut self, layer: &LayerRef) -> anyhow::Result<()> {
        let window_size = self.window.framebuffer_size();
        let mut ctx = LayerCtx {
            renderer: &mut self.renderer,
            input: &self.input,
            window_size,
        };
        let mut layer = layer.borrow_mut();
        log::debug!("attaching layer `{}`", layer.name());
        layer.on_attach(&mut ctx)
    }

    fn detach(&mut self, layer: &LayerRef) {
        let window_size = self.window.framebuffer_size();
        let mut ctx = LayerCtx {
            renderer: &mut self.renderer,
            input: &self.input,
            window_size,
        };
        let mut layer = layer.borrow_mut();
        log::debug!("detaching layer `{}`", layer.name());
        layer.on_detach(&mut ctx);
    }

    /// Routes one event: input state, built-in handlers, then layers from
    /// the top down until one marks it handled.
    pub fn handle_event(&mut self, event: &mut Event) {
        log::trace!("event: {event}");
        self.input.apply_event(event);

        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<WindowCloseEvent>(|_| {
            self.running = false;
            true
        });
        let handled = dispatcher.event().handled;
        dispatcher.dispatch::<WindowResizeEvent>(|e| {
            self.on_window_resize(e.width, e.height);
            handled
        });

        let layers: Vec<LayerRef> = self.layers.iter_rev().cloned().collect();
        for layer in layers {
            let mut layer = layer.borrow_mut();
            if !layer.is_enabled() {
                continue;
            }
            layer.on_event(event);
            if event.handled {
                break;
            }
        }
    }

    fn on_window_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            if !self.minimized {
                log::debug!("window minimized");
            }
            self.minimized = true;
            return;
        }
        self.minimized = false;
        self.renderer.on_window_resize(width, height);
    }

    /// One iteration of the main loop.
    pub fn run_frame(&mut self) -> Result<(), AppError> {
        let ts = self.clock.tick().timestep();

        if !self.minimized {
            let layers: Vec<LayerRef> = self.layers.iter().cloned().collect();
            let window_size = self.window.framebuffer_size();

            for layer in &layers {
                let mut layer = layer.borrow_mut();
                if !layer.is_enabled() {
                    continue;
                }
                let mut ctx = LayerCtx {
                    renderer: &mut self.renderer,
                    input: &self.input,
                    window_size,
                };
                layer.on_update(&mut ctx, ts);
            }

            let mut frame = self.overlay.borrow_mut().begin();
            for layer in &layers {
                let mut layer = layer.borrow_mut();
                if layer.is_enabled() {
                    layer.on_overlay_render(&mut frame);
                }
            }
            self.overlay.borrow_mut().end(frame);
        }

        if let Err(e) = self.renderer.present() {
            log::error!("present failed: {e}");
            return Err(e.into());
        }

        self.window.on_update();
        self.drain_events();
        Ok(())
    }

    fn drain_events(&mut self) {
        loop {
            // Release the queue before routing; handlers may cause more events.
            let next = self.events.borrow_mut().pop_front();
            let Some(mut event) = next else {
                break;
            };
            self.handle_event(&mut event);
        }
    }

    /// Runs frames until the window closes or `request_close` is called.
    pub fn run(&mut self) -> Result<(), AppError> {
        while self.running {
            self.run_frame()?;
        }
        log::info!("application loop finished");
        Ok(())
    }

    /// Runs at most `max_frames` frames. Returns how many ran.
    pub fn run_frames(&mut self, max_frames: u64) -> Result<u64, AppError> {
        let mut frames = 0;
        while self.running && frames < max_frames {
            self.run_frame()?;
            frames += 1;
        }
        Ok(frames)
    }

    pub fn request_close(&mut self) {
        self.running = false;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    #[inline]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[inline]
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    #[inline]
    pub fn window(&self) -> &dyn Window {
        self.window.as_ref()
    }

    #[inline]
    pub fn window_mut(&mut self) -> &mut dyn Window {
        self.window.as_mut()
    }

    #[inline]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[inline]
    pub fn layer_stack(&self) -> &LayerStack {
        &self.layers
    }

    #[inline]
    pub fn debug_overlay(&self) -> &Rc<RefCell<DebugOverlay>> {
        &self.overlay
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        let layers: Vec<LayerRef> = self.layers.iter_rev().cloned().collect();
        for layer in &layers {
            self.detach(layer);
        }
        self.layers.clear();
        self.renderer.shutdown();
        log::info!("application shut down");
    }
}
