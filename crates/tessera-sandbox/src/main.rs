use std::rc::Rc;

use glam::{Vec2, Vec3, Vec4};
use tessera_engine::core::{
    Application, ApplicationConfig, Layer, LayerCtx, LayerInfo, OrthographicCameraController,
    OverlayFrame, layer_ref,
};
use tessera_engine::events::Event;
use tessera_engine::input::KeyCode;
use tessera_engine::logging::{LoggingConfig, init_logging};
use tessera_engine::physics::Acceleration;
use tessera_engine::profiling::{Instrumentor, init_profiling};
use tessera_engine::renderer::{FxSpec, FxSystem, RendererBackend, Texture2D};
use tessera_engine::renderer::headless::HeadlessBackend;
use tessera_engine::time::Timestep;
use tessera_engine::window::{HeadlessWindow, WindowConfig};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const HEADLESS_FRAMES: u64 = 120;
const SMOKE_EVERY: f32 = 0.1;
const TRACE_FILE: &str = "tessera-runtime.json";

static PROFILER: Instrumentor = Instrumentor::new();

/// RGBA8 checkerboard, `cells` squares per side.
fn checkerboard(size: u32, cells: u32) -> Vec<u8> {
    let cell = (size / cells).max(1);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let v = if ((x / cell) + (y / cell)) % 2 == 0 { 0xff } else { 0xcc };
            pixels.extend_from_slice(&[v, v, v, 0xff]);
        }
    }
    pixels
}

struct Sandbox2D {
    info: LayerInfo,
    controller: OrthographicCameraController,
    checkerboard: Option<Rc<dyn Texture2D>>,
    square_color: Vec4,
    fx: FxSystem,
    smoke: FxSpec,
    flame: FxSpec,
    smoke_timer: f32,
}

fn smoke() -> FxSpec {
    FxSpec {
        velocity: Vec2::new(-2.0, 0.0),
        velocity_jitter: Vec2::new(4.0, 2.0),
        color_start: Vec4::new(0.8, 0.8, 0.8, 1.0),
        color_end: Vec4::new(0.6, 0.6, 0.6, 1.0),
        size_start: 0.35,
        size_end: 0.0,
        size_jitter: 0.15,
        lifetime: 4.0,
        ..FxSpec::default()
    }
}

fn flame() -> FxSpec {
    FxSpec {
        velocity: Vec2::new(0.0, -1.0),
        velocity_jitter: Vec2::new(3.0, 1.0),
        color_start: Vec4::new(254.0 / 255.0, 109.0 / 255.0, 41.0 / 255.0, 1.0),
        color_end: Vec4::new(254.0 / 255.0, 212.0 / 255.0, 123.0 / 255.0, 1.0),
        size_start: 0.5,
        size_end: 0.0,
        size_jitter: 0.3,
        lifetime: 1.0,
        ..FxSpec::default()
    }
}

impl Sandbox2D {
    fn new(aspect_ratio: f32) -> Self {
        Self {
            info: LayerInfo::new("Sandbox2D", 0),
            controller: OrthographicCameraController::new(aspect_ratio, true),
            checkerboard: None,
            square_color: Vec4::new(0.2, 0.3, 0.8, 1.0),
            fx: FxSystem::new(),
            smoke: smoke(),
            flame: flame(),
            smoke_timer: 0.0,
        }
    }

    fn emit(&mut self, ts: Timestep, space_held: bool) {
        let origin = Vec2::new(-1.0, 0.0);
        self.smoke_timer += ts.seconds();
        while self.smoke_timer >= SMOKE_EVERY {
            self.smoke.position = origin;
            self.fx.spawn(&self.smoke);
            self.smoke_timer -= SMOKE_EVERY;
        }
        if space_held {
            self.flame.position = origin - Vec2::new(0.0, 0.6);
            self.fx.spawn(&self.flame);
        }
        self.fx.update(ts);
    }
}

impl Layer for Sandbox2D {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut LayerInfo {
        &mut self.info
    }

    fn on_attach(&mut self, ctx: &mut LayerCtx<'_>) -> anyhow::Result<()> {
        // Smoke drifts upward.
        self.fx.set_acceleration(Acceleration::new(Vec2::new(0.0, 0.4)));
        let texture = ctx.renderer.create_texture(64, 64)?;
        texture.set_data(&checkerboard(64, 8))?;
        self.checkerboard = Some(texture);
        Ok(())
    }

    fn on_detach(&mut self, _ctx: &mut LayerCtx<'_>) {
        self.checkerboard = None;
    }

    fn on_update(&mut self, ctx: &mut LayerCtx<'_>, ts: Timestep) {
        self.controller.on_update(ts, ctx.input);
        self.emit(ts, ctx.input.is_key_pressed(KeyCode::Space));

        ctx.renderer.set_clear_color(Vec4::new(0.1, 0.1, 0.1, 1.0));
        ctx.renderer.clear();

        let mut r2d = ctx.renderer.renderer_2d();
        r2d.begin_scene(self.controller.camera());
        if let Some(texture) = &self.checkerboard {
            r2d.draw_textured_quad_3d(
                Vec3::new(0.0, 0.0, -0.1),
                Vec2::splat(10.0),
                texture.as_ref(),
                10.0,
                Vec4::ONE,
            );
        }
        r2d.draw_rotated_quad(
            Vec2::new(-1.0, 0.0),
            Vec2::splat(0.8),
            (-45.0f32).to_radians(),
            Vec4::new(0.8, 0.2, 0.3, 1.0),
        );
        r2d.draw_quad(Vec2::new(0.5, -0.5), Vec2::new(0.5, 0.75), self.square_color);
        self.fx.render(&mut r2d);
        r2d.end_scene();
    }

    fn on_overlay_render(&mut self, frame: &mut OverlayFrame) {
        frame.text("square color", format!("{:.2?}", self.square_color.to_array()));
        frame.text("zoom", format!("{:.2}", self.controller.zoom_level()));
        frame.text("rotation", format!("{:.1}", self.controller.rotation()));
        frame.text("particles", self.fx.live_count());
    }

    fn on_event(&mut self, event: &mut Event) {
        self.controller.on_event(event);
    }
}

fn main() -> anyhow::Result<()> {
    let headless = std::env::args().skip(1).any(|arg| arg == "--headless");
    let profile = std::env::args().skip(1).any(|arg| arg == "--profile");
    let window = WindowConfig::new("Tessera Sandbox", WIDTH, HEIGHT);

    let mut app = if headless {
        init_logging(LoggingConfig::default());
        Application::with_parts(Box::new(HeadlessWindow::new(&window)), |_| {
            let backend: Box<dyn RendererBackend> = Box::new(HeadlessBackend::new());
            Ok(backend)
        })?
    } else {
        Application::new(ApplicationConfig {
            window,
            ..ApplicationConfig::default()
        })?
    };

    app.push_layer(layer_ref(Sandbox2D::new(WIDTH as f32 / HEIGHT as f32)))?;

    let _session = if profile {
        if !init_profiling(&PROFILER) {
            log::warn!("a tracing subscriber is already installed; spans may not reach {TRACE_FILE}");
        }
        Some(PROFILER.scoped_session("Runtime", TRACE_FILE)?)
    } else {
        None
    };

    if headless {
        let frames = app.run_frames(HEADLESS_FRAMES)?;
        log::info!("headless run finished after {frames} frames");
    } else {
        app.run()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_cells() {
        let pixels = checkerboard(4, 2);
        assert_eq!(pixels.len(), 4 * 4 * 4);
        // (0,0) and (2,0) fall in different cells.
        assert_eq!(pixels[0], 0xff);
        assert_eq!(pixels[2 * 4], 0xcc);
        assert_eq!(pixels[3], 0xff);
    }

    #[test]
    fn smoke_is_emitted_on_a_fixed_interval() {
        let mut sandbox = Sandbox2D::new(1.0);
        sandbox.emit(Timestep::from_seconds(0.25), false);
        assert_eq!(sandbox.fx.live_count(), 2);
        sandbox.emit(Timestep::from_seconds(0.1), true);
        assert_eq!(sandbox.fx.live_count(), 4);
    }
}
