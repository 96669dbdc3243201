use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant};

use tracing::{Subscriber, span};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use super::instrumentor::{Instrumentor, ProfileResult};

/// Enter time of a span, stored in its extensions.
struct Entered(Instant);

/// `tracing` layer that reports span scopes to an [`Instrumentor`].
///
/// Timestamps count from the layer's creation. A span re-entered later
/// produces one event per entry.
pub struct ChromeTraceLayer {
    sink: &'static Instrumentor,
    epoch: Instant,
}

impl ChromeTraceLayer {
    pub fn new(sink: &'static Instrumentor) -> Self {
        Self {
            sink,
            epoch: Instant::now(),
        }
    }
}

impl<S> Layer<S> for ChromeTraceLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_enter(&self, id: &span::Id, ctx: Context<'_, S>) {
        if !self.sink.is_active() {
            return;
        }
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().replace(Entered(Instant::now()));
        }
    }

    fn on_exit(&self, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let Some(Entered(start)) = span.extensions_mut().remove::<Entered>() else {
            return;
        };
        let end = Instant::now();
        self.sink.write_profile(&ProfileResult {
            name: span.name(),
            start_us: micros(start.saturating_duration_since(self.epoch)),
            duration_us: micros(end.saturating_duration_since(start)),
            thread_id: current_thread_id(),
        });
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

fn current_thread_id() -> u32 {
    let mut hasher = DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::instrumentor::tests::{names, read_events, trace_path};
    use crate::renderer::headless::HeadlessBackend;
    use crate::renderer::{OrthographicCamera, Renderer};
    use glam::{Vec2, Vec4};
    use tracing_subscriber::layer::SubscriberExt;

    fn with_layer<R>(sink: &'static Instrumentor, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(ChromeTraceLayer::new(sink));
        tracing::subscriber::with_default(subscriber, f)
    }

    #[test]
    fn nested_spans_become_complete_events() {
        static SINK: Instrumentor = Instrumentor::new();
        let path = trace_path("nested");

        with_layer(&SINK, || drop(tracing::trace_span!("before").entered()));
        SINK.begin_session("Test", &path).unwrap();
        with_layer(&SINK, || {
            let _outer = tracing::trace_span!("outer").entered();
            let _inner = tracing::trace_span!("inner").entered();
        });
        SINK.end_session();

        let events = read_events(&path);
        // Inner exits first; "before" ran with no session open.
        assert_eq!(names(&events), ["inner", "outer"]);
        for event in &events {
            assert_eq!(event["ph"], "X");
            assert_eq!(event["cat"], "function");
            assert!(event["dur"].is_u64());
        }
        assert!(events[1]["ts"].as_u64() <= events[0]["ts"].as_u64());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn renderer_scopes_are_traced() {
        static SINK: Instrumentor = Instrumentor::new();
        let path = trace_path("renderer");

        let mut renderer = Renderer::new();
        renderer.init(Box::new(HeadlessBackend::new())).unwrap();
        let camera = OrthographicCamera::new(-1.0, 1.0, -1.0, 1.0);

        SINK.begin_session("Renderer", &path).unwrap();
        with_layer(&SINK, || {
            let mut r2d = renderer.renderer_2d();
            r2d.begin_scene(&camera);
            r2d.draw_quad(Vec2::ZERO, Vec2::ONE, Vec4::ONE);
            r2d.end_scene();
        });
        SINK.end_session();

        let events = read_events(&path);
        let names = names(&events);
        for expected in [
            "Renderer2D::begin_scene",
            "Renderer::begin_scene",
            "Renderer2D::submit_quad",
            "OrthographicCamera::rebuild_view",
            "OrthographicCamera::rebuild_projection",
        ] {
            assert!(names.contains(&expected), "{expected} missing from {names:?}");
        }
        let _ = std::fs::remove_file(path);
    }
}
