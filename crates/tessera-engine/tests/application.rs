use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

use tessera_engine::core::{AppError, Application, Layer, LayerCtx, LayerInfo, LayerRef, OverlayFrame};
use tessera_engine::events::{
    Event, EventKind, KeyPressedEvent, WindowCloseEvent, WindowResizeEvent,
};
use tessera_engine::input::{Input, KeyCode};
use tessera_engine::renderer::RendererBackend;
use tessera_engine::renderer::headless::{CommandLog, HeadlessBackend, RenderCommand};
use tessera_engine::time::Timestep;
use tessera_engine::window::{EventScript, HeadlessWindow, Window};

// Application is single-instance per process; tests in this file take turns.
static APP_LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    APP_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn headless_app(width: u32, height: u32) -> (Application, EventScript, CommandLog) {
    let window = HeadlessWindow::with_size(width, height);
    let script = window.script();
    let backend = HeadlessBackend::new();
    let log = backend.command_log();
    let app = Application::with_parts(Box::new(window), move |_| {
        let backend: Box<dyn RendererBackend> = Box::new(backend);
        Ok(backend)
    })
    .unwrap();
    (app, script, log)
}

type Journal = Rc<RefCell<Vec<(String, EventKind)>>>;

#[derive(Default)]
struct Counters {
    attached: Cell<u32>,
    detached: Cell<u32>,
    updates: Cell<u32>,
}

struct Recorder {
    info: LayerInfo,
    journal: Journal,
    counters: Rc<Counters>,
    consume: bool,
    fail_attach: bool,
    overlay_line: Option<&'static str>,
}

impl Recorder {
    fn new(name: &str, journal: &Journal) -> Self {
        Self {
            info: LayerInfo::new(name, 0),
            journal: journal.clone(),
            counters: Rc::default(),
            consume: false,
            fail_attach: false,
            overlay_line: None,
        }
    }

    fn consuming(mut self) -> Self {
        self.consume = true;
        self
    }

    fn into_ref(self) -> LayerRef {
        Rc::new(RefCell::new(self))
    }
}

impl Layer for Recorder {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut LayerInfo {
        &mut self.info
    }

    fn on_attach(&mut self, _ctx: &mut LayerCtx<'_>) -> anyhow::Result<()> {
        if self.fail_attach {
            anyhow::bail!("{} refused to attach", self.info.name());
        }
        self.counters.attached.set(self.counters.attached.get() + 1);
        Ok(())
    }

    fn on_detach(&mut self, _ctx: &mut LayerCtx<'_>) {
        self.counters.detached.set(self.counters.detached.get() + 1);
    }

    fn on_update(&mut self, _ctx: &mut LayerCtx<'_>, _ts: Timestep) {
        self.counters.updates.set(self.counters.updates.get() + 1);
    }

    fn on_overlay_render(&mut self, frame: &mut OverlayFrame) {
        if let Some(line) = self.overlay_line {
            frame.text(self.info.name().to_string(), line);
        }
    }

    fn on_event(&mut self, event: &mut Event) {
        self.journal
            .borrow_mut()
            .push((self.info.name().to_string(), event.kind()));
        if self.consume {
            event.handled = true;
        }
    }
}

fn seen_by(journal: &Journal, kind: EventKind) -> Vec<String> {
    journal
        .borrow()
        .iter()
        .filter(|(_, k)| *k == kind)
        .map(|(name, _)| name.clone())
        .collect()
}

#[test]
fn handled_event_stops_at_consuming_layer() {
    let _guard = lock();
    let (mut app, script, _) = headless_app(640, 360);
    let journal = Journal::default();

    app.push_layer(Recorder::new("bottom", &journal).into_ref()).unwrap();
    app.push_layer(Recorder::new("middle", &journal).consuming().into_ref())
        .unwrap();
    app.push_overlay(Recorder::new("top", &journal).into_ref()).unwrap();

    script.push(KeyPressedEvent::new(KeyCode::Space, 0));
    app.run_frame().unwrap();

    assert_eq!(seen_by(&journal, EventKind::KeyPressed), ["top", "middle"]);
    assert!(app.input().is_key_pressed(KeyCode::Space));
}

#[test]
fn close_reaches_top_layer_and_ends_run() {
    let _guard = lock();
    let (mut app, script, _) = headless_app(640, 360);
    let journal = Journal::default();

    app.push_layer(Recorder::new("lower", &journal).into_ref()).unwrap();
    app.push_overlay(Recorder::new("upper", &journal).into_ref()).unwrap();

    script.push(WindowCloseEvent);
    app.run().unwrap();

    assert!(!app.is_running());
    // Built-in handler consumes the close; only the topmost layer sees it.
    assert_eq!(seen_by(&journal, EventKind::WindowClose), ["upper"]);
    assert!(seen_by(&journal, EventKind::WindowClose).iter().all(|n| n != "lower"));
}

#[test]
fn resize_is_not_consumed() {
    let _guard = lock();
    let (mut app, script, _) = headless_app(640, 360);
    let journal = Journal::default();
    app.push_layer(Recorder::new("a", &journal).into_ref()).unwrap();
    app.push_layer(Recorder::new("b", &journal).into_ref()).unwrap();

    script.push(WindowResizeEvent::new(800, 600));
    app.run_frame().unwrap();

    assert_eq!(seen_by(&journal, EventKind::WindowResize), ["b", "a"]);
}

#[test]
fn zero_sized_resize_pauses_updates() {
    let _guard = lock();
    let (mut app, script, _) = headless_app(640, 360);
    let journal = Journal::default();
    let recorder = Recorder::new("counter", &journal);
    let counters = recorder.counters.clone();
    app.push_layer(recorder.into_ref()).unwrap();

    app.run_frame().unwrap();
    assert_eq!(counters.updates.get(), 1);

    // Events are drained after updates, so this frame still updates.
    script.push(WindowResizeEvent::new(0, 0));
    app.run_frame().unwrap();
    assert!(app.is_minimized());
    assert_eq!(counters.updates.get(), 2);

    app.run_frame().unwrap();
    app.run_frame().unwrap();
    assert_eq!(counters.updates.get(), 2);

    script.push(WindowResizeEvent::new(640, 360));
    app.run_frame().unwrap();
    assert!(!app.is_minimized());
    app.run_frame().unwrap();
    assert_eq!(counters.updates.get(), 3);
}

#[test]
fn headless_viewport_follows_resize() {
    let _guard = lock();
    let (mut app, script, log) = headless_app(1280, 720);
    assert_eq!(log.last_viewport(), Some((0, 0, 1280, 720)));

    script.push(WindowResizeEvent::new(640, 360));
    app.run_frame().unwrap();

    assert_eq!(log.last_viewport(), Some((0, 0, 640, 360)));
    assert_eq!(
        log.count(|c| matches!(c, RenderCommand::ResizeSurface { width: 640, height: 360 })),
        1
    );
    assert_eq!(app.window().width(), 640);
}

#[test]
fn second_instance_is_rejected_until_drop() {
    let _guard = lock();
    let (app, _, _) = headless_app(64, 64);

    let second = Application::with_parts(Box::new(HeadlessWindow::with_size(64, 64)), |_| {
        let backend: Box<dyn RendererBackend> = Box::new(HeadlessBackend::new());
        Ok(backend)
    });
    assert!(matches!(second, Err(AppError::AlreadyExists)));

    drop(app);
    let (third, _, _) = headless_app(64, 64);
    assert!(third.is_running());
}

#[test]
fn failed_attach_removes_layer() {
    let _guard = lock();
    let (mut app, _, _) = headless_app(64, 64);
    let journal = Journal::default();
    let mut recorder = Recorder::new("broken", &journal);
    recorder.fail_attach = true;

    let before = app.layer_stack().len();
    let err = app.push_layer(recorder.into_ref()).unwrap_err();
    assert!(matches!(err, AppError::Platform(_)));
    assert_eq!(app.layer_stack().len(), before);
    assert!(app.layer_stack().find_by_name("broken").is_none());
}

#[test]
fn pop_detaches_and_drop_detaches_the_rest() {
    let _guard = lock();
    let (mut app, _, _) = headless_app(64, 64);
    let journal = Journal::default();

    let popped = Recorder::new("popped", &journal);
    let popped_counters = popped.counters.clone();
    let popped = popped.into_ref();
    let kept = Recorder::new("kept", &journal);
    let kept_counters = kept.counters.clone();

    app.push_layer(popped.clone()).unwrap();
    app.push_overlay(kept.into_ref()).unwrap();
    assert_eq!(popped_counters.attached.get(), 1);

    // Either pop finds the layer; the second call has nothing left to remove.
    assert!(app.pop_overlay(&popped).is_some());
    assert!(app.pop_layer(&popped).is_none());
    assert_eq!(popped_counters.detached.get(), 1);
    assert_eq!(app.layer_stack().layer_count(), 0);

    drop(app);
    assert_eq!(kept_counters.detached.get(), 1);
    assert_eq!(popped_counters.detached.get(), 1);
}

#[test]
fn disabled_layers_are_skipped() {
    let _guard = lock();
    let (mut app, script, _) = headless_app(64, 64);
    let journal = Journal::default();
    let recorder = Recorder::new("sleepy", &journal);
    let counters = recorder.counters.clone();
    let layer = recorder.into_ref();
    layer.borrow_mut().set_enabled(false);
    app.push_layer(layer).unwrap();

    script.push(KeyPressedEvent::new(KeyCode::A, 0));
    app.run_frames(2).unwrap();

    assert_eq!(counters.updates.get(), 0);
    assert!(journal.borrow().is_empty());
}

#[test]
fn overlay_collects_lines_and_frames_present() {
    let _guard = lock();
    let (mut app, _, log) = headless_app(64, 64);
    let journal = Journal::default();
    let mut recorder = Recorder::new("stats", &journal);
    recorder.overlay_line = Some("ok");
    app.push_layer(recorder.into_ref()).unwrap();

    assert_eq!(app.run_frames(3).unwrap(), 3);

    let overlay = app.debug_overlay().borrow();
    assert!(overlay.is_attached());
    assert_eq!(overlay.frame_count(), 3);
    assert_eq!(overlay.last_frame().and_then(|f| f.get("stats")), Some("ok"));
    assert_eq!(log.present_count(), 3);
}

#[test]
fn debug_overlay_is_the_first_overlay() {
    let _guard = lock();
    let (app, _, _) = headless_app(64, 64);
    let stack = app.layer_stack();
    assert_eq!(stack.layer_count(), 0);
    assert_eq!(stack.overlay_count(), 1);
    assert!(stack.find_by_name("DebugOverlay").is_some());
}

#[test]
fn request_close_stops_run_frames() {
    let _guard = lock();
    let (mut app, _, _) = headless_app(64, 64);
    app.request_close();
    assert_eq!(app.run_frames(10).unwrap(), 0);
}
