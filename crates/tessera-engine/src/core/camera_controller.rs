use glam::Vec3;

use crate::events::{Event, EventDispatcher, MouseScrolledEvent, WindowResizeEvent};
use crate::input::{Input, KeyCode};
use crate::renderer::OrthographicCamera;
use crate::time::Timestep;

/// Key bindings for [`OrthographicCameraController`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CameraControls {
    pub left: KeyCode,
    pub right: KeyCode,
    pub up: KeyCode,
    pub down: KeyCode,
    /// Counter-clockwise.
    pub rotate_ccw: KeyCode,
    pub rotate_cw: KeyCode,
}

impl Default for CameraControls {
    fn default() -> Self {
        Self {
            left: KeyCode::A,
            right: KeyCode::D,
            up: KeyCode::W,
            down: KeyCode::S,
            rotate_ccw: KeyCode::Q,
            rotate_cw: KeyCode::E,
        }
    }
}

/// Keyboard pan/rotate and scroll zoom around an [`OrthographicCamera`].
///
/// The projection is `(-aspect * zoom, aspect * zoom, -zoom, zoom)`.
#[derive(Debug, Clone)]
pub struct OrthographicCameraController {
    camera: OrthographicCamera,
    controls: CameraControls,

    aspect_ratio: f32,
    zoom_level: f32,
    zoom_min: f32,
    zoom_max: f32,
    zoom_step: f32,

    rotation_enabled: bool,
    position: Vec3,
    /// Degrees.
    rotation: f32,

    pan_speed: f32,
    /// Degrees per second.
    rotate_speed: f32,
}

impl OrthographicCameraController {
    pub const DEFAULT_ZOOM_MIN: f32 = 0.25;
    pub const DEFAULT_ZOOM_MAX: f32 = 10.0;
    pub const DEFAULT_PAN_SPEED: f32 = 5.0;
    pub const DEFAULT_ROTATE_SPEED: f32 = 180.0;
    pub const DEFAULT_ZOOM_STEP: f32 = 0.25;

    const MIN_POSITIVE: f32 = 0.001;
    const MIN_PAN_SPEED: f32 = 0.25;

    pub fn new(aspect_ratio: f32, rotation_enabled: bool) -> Self {
        let aspect_ratio = aspect_ratio.max(Self::MIN_POSITIVE);
        let zoom_level = 1.0;
        Self {
            camera: OrthographicCamera::new(
                -aspect_ratio * zoom_level,
                aspect_ratio * zoom_level,
                -zoom_level,
                zoom_level,
            ),
            controls: CameraControls::default(),
            aspect_ratio,
            zoom_level,
            zoom_min: Self::DEFAULT_ZOOM_MIN,
            zoom_max: Self::DEFAULT_ZOOM_MAX,
            zoom_step: Self::DEFAULT_ZOOM_STEP,
            rotation_enabled,
            position: Vec3::ZERO,
            rotation: 0.0,
            pan_speed: Self::DEFAULT_PAN_SPEED,
            rotate_speed: Self::DEFAULT_ROTATE_SPEED,
        }
    }

    /// Polls movement keys and advances the camera by `ts`.
    pub fn on_update(&mut self, ts: Timestep, input: &dyn Input) {
        let dt = ts.seconds();
        let step = self.pan_speed * dt;
        let c = self.controls;

        // Opposite keys held together cancel out.
        if input.is_key_pressed(c.left) {
            self.position.x -= step;
        }
        if input.is_key_pressed(c.right) {
            self.position.x += step;
        }
        if input.is_key_pressed(c.up) {
            self.position.y += step;
        }
        if input.is_key_pressed(c.down) {
            self.position.y -= step;
        }

        if self.rotation_enabled {
            if input.is_key_pressed(c.rotate_ccw) {
                self.rotation += self.rotate_speed * dt;
            }
            if input.is_key_pressed(c.rotate_cw) {
                self.rotation -= self.rotate_speed * dt;
            }

            if self.rotation > 180.0 {
                self.rotation -= 360.0;
            } else if self.rotation <= -180.0 {
                self.rotation += 360.0;
            }
            self.camera.set_rotation_degrees(self.rotation);
        }

        self.camera.set_position(self.position);
        self.pan_speed = self.zoom_level.max(Self::MIN_PAN_SPEED);
    }

    /// Reacts to scroll and resize. Neither is consumed.
    pub fn on_event(&mut self, event: &mut Event) {
        let handled = event.handled;
        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<MouseScrolledEvent>(|e| {
            self.on_mouse_scrolled(e);
            handled
        });
        dispatcher.dispatch::<WindowResizeEvent>(|e| {
            self.on_window_resized(e);
            handled
        });
    }

    fn on_mouse_scrolled(&mut self, e: &MouseScrolledEvent) {
        self.set_zoom_level(self.zoom_level - e.y_offset * self.zoom_step);
    }

    fn on_window_resized(&mut self, e: &WindowResizeEvent) {
        if e.width > 0 && e.height > 0 {
            self.set_aspect_ratio(e.width as f32 / e.height as f32);
        }
    }

    /// Clamped to the current limits.
    pub fn set_zoom_level(&mut self, zoom: f32) {
        self.zoom_level = zoom.clamp(self.zoom_min, self.zoom_max);
        self.recalculate_projection();
    }

    /// Reversed bounds are swapped. The minimum never drops below 0.001.
    pub fn set_zoom_limits(&mut self, min: f32, max: f32) {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        self.zoom_min = min.max(Self::MIN_POSITIVE);
        self.zoom_max = max.max(self.zoom_min);
        self.set_zoom_level(self.zoom_level);
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio.max(Self::MIN_POSITIVE);
        self.recalculate_projection();
    }

    /// Back to the origin with no rotation. Zoom and limits are kept.
    pub fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.rotation = 0.0;
        self.camera.set_position(self.position);
        self.camera.set_rotation_degrees(0.0);
        self.set_zoom_level(self.zoom_level);
    }

    fn recalculate_projection(&mut self) {
        let w = self.aspect_ratio * self.zoom_level;
        let h = self.zoom_level;
        self.camera.set_projection(-w, w, -h, h);
    }

    pub fn set_pan_speed(&mut self, speed: f32) {
        self.pan_speed = speed;
    }

    pub fn set_rotate_speed(&mut self, degrees_per_second: f32) {
        self.rotate_speed = degrees_per_second;
    }

    pub fn set_zoom_step(&mut self, step: f32) {
        self.zoom_step = step;
    }

    pub fn set_rotation_enabled(&mut self, enabled: bool) {
        self.rotation_enabled = enabled;
    }

    pub fn set_controls(&mut self, controls: CameraControls) {
        self.controls = controls;
    }

    #[inline]
    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut OrthographicCamera {
        &mut self.camera
    }

    #[inline]
    pub fn controls(&self) -> CameraControls {
        self.controls
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    #[inline]
    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    #[inline]
    pub fn zoom_limits(&self) -> (f32, f32) {
        (self.zoom_min, self.zoom_max)
    }

    #[inline]
    pub fn zoom_step(&self) -> f32 {
        self.zoom_step
    }

    #[inline]
    pub fn pan_speed(&self) -> f32 {
        self.pan_speed
    }

    #[inline]
    pub fn rotate_speed(&self) -> f32 {
        self.rotate_speed
    }

    #[inline]
    pub fn is_rotation_enabled(&self) -> bool {
        self.rotation_enabled
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Degrees, in (-180, 180].
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FakeInput;
    use crate::renderer::OrthographicBounds;
    use approx::assert_relative_eq;

    fn assert_bounds(actual: OrthographicBounds, l: f32, r: f32, b: f32, t: f32) {
        assert_relative_eq!(actual.left, l, epsilon = 1e-5);
        assert_relative_eq!(actual.right, r, epsilon = 1e-5);
        assert_relative_eq!(actual.bottom, b, epsilon = 1e-5);
        assert_relative_eq!(actual.top, t, epsilon = 1e-5);
    }

    #[test]
    fn defaults() {
        let ctrl = OrthographicCameraController::new(16.0 / 9.0, false);
        assert_eq!(ctrl.zoom_level(), 1.0);
        assert_eq!(ctrl.zoom_limits(), (0.25, 10.0));
        assert_eq!(ctrl.pan_speed(), 5.0);
        assert_eq!(ctrl.rotate_speed(), 180.0);
        assert_eq!(ctrl.zoom_step(), 0.25);
        assert_eq!(ctrl.controls(), CameraControls::default());
        assert_bounds(ctrl.camera().bounds(), -16.0 / 9.0, 16.0 / 9.0, -1.0, 1.0);
    }

    #[test]
    fn scroll_zooms_and_clamps() {
        let mut ctrl = OrthographicCameraController::new(2.0, false);
        assert_bounds(ctrl.camera().bounds(), -2.0, 2.0, -1.0, 1.0);
        ctrl.set_zoom_limits(0.5, 2.0);
        ctrl.set_zoom_step(0.5);

        let mut scroll_in = Event::from(MouseScrolledEvent::new(0.0, 2.0));
        ctrl.on_event(&mut scroll_in);
        assert_eq!(ctrl.zoom_level(), 0.5);
        assert_bounds(ctrl.camera().bounds(), -1.0, 1.0, -0.5, 0.5);
        assert!(!scroll_in.handled);

        let mut scroll_out = Event::from(MouseScrolledEvent::new(0.0, -6.0));
        ctrl.on_event(&mut scroll_out);
        assert_eq!(ctrl.zoom_level(), 2.0);
        assert_bounds(ctrl.camera().bounds(), -4.0, 4.0, -2.0, 2.0);
    }

    #[test]
    fn resize_updates_aspect_unless_zero() {
        let mut ctrl = OrthographicCameraController::new(1.0, false);
        let mut resize = Event::from(WindowResizeEvent::new(1280, 720));
        ctrl.on_event(&mut resize);
        assert_relative_eq!(ctrl.aspect_ratio(), 1280.0 / 720.0);
        assert!(!resize.handled);

        ctrl.on_event(&mut Event::from(WindowResizeEvent::new(0, 720)));
        assert_relative_eq!(ctrl.aspect_ratio(), 1280.0 / 720.0);
    }

    #[test]
    fn pan_uses_speed_then_tracks_zoom() {
        let mut ctrl = OrthographicCameraController::new(1.0, false);
        let mut input = FakeInput::new();
        input.press(KeyCode::D);
        input.press(KeyCode::W);

        ctrl.on_update(Timestep::from_seconds(0.5), &input);
        assert_relative_eq!(ctrl.position().x, 2.5);
        assert_relative_eq!(ctrl.position().y, 2.5);
        assert_eq!(ctrl.camera().position(), ctrl.position());
        // Speed follows zoom after the first update.
        assert_eq!(ctrl.pan_speed(), 1.0);

        ctrl.set_zoom_level(0.25);
        ctrl.on_update(Timestep::from_seconds(1.0), &input);
        assert_relative_eq!(ctrl.position().x, 3.5);
        assert_eq!(ctrl.pan_speed(), 0.25);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut ctrl = OrthographicCameraController::new(1.0, false);
        let mut input = FakeInput::new();
        input.press(KeyCode::A);
        input.press(KeyCode::D);
        ctrl.on_update(Timestep::from_seconds(1.0), &input);
        assert_relative_eq!(ctrl.position().x, 0.0);

        input.press(KeyCode::W);
        input.press(KeyCode::S);
        ctrl.on_update(Timestep::from_seconds(1.0), &input);
        assert_relative_eq!(ctrl.position().y, 0.0);

        input.release(KeyCode::D);
        ctrl.on_update(Timestep::from_seconds(1.0), &input);
        assert_relative_eq!(ctrl.position().x, -5.0);
    }

    #[test]
    fn rotation_wraps_into_half_open_range() {
        let mut ctrl = OrthographicCameraController::new(1.0, true);
        ctrl.set_rotate_speed(100.0);
        let mut input = FakeInput::new();

        input.press(KeyCode::Q);
        ctrl.on_update(Timestep::from_seconds(2.0), &input);
        assert_relative_eq!(ctrl.rotation(), -160.0, epsilon = 1e-4);
        assert_relative_eq!(ctrl.camera().rotation_degrees(), -160.0, epsilon = 1e-3);

        input.release(KeyCode::Q);
        input.press(KeyCode::E);
        ctrl.on_update(Timestep::from_seconds(0.3), &input);
        assert_relative_eq!(ctrl.rotation(), 170.0, epsilon = 1e-4);
    }

    #[test]
    fn rotation_disabled_ignores_keys() {
        let mut ctrl = OrthographicCameraController::new(1.0, false);
        let mut input = FakeInput::new();
        input.press(KeyCode::Q);
        ctrl.on_update(Timestep::from_seconds(1.0), &input);
        assert_eq!(ctrl.rotation(), 0.0);
    }

    #[test]
    fn zoom_limits_are_normalized() {
        let mut ctrl = OrthographicCameraController::new(1.0, false);
        ctrl.set_zoom_limits(4.0, 2.0);
        assert_eq!(ctrl.zoom_limits(), (2.0, 4.0));
        assert_eq!(ctrl.zoom_level(), 2.0);

        ctrl.set_zoom_limits(-1.0, 0.0);
        assert_eq!(ctrl.zoom_limits(), (0.001, 0.001));
        assert_eq!(ctrl.zoom_level(), 0.001);
    }

    #[test]
    fn aspect_is_floored() {
        let mut ctrl = OrthographicCameraController::new(0.0, false);
        assert_eq!(ctrl.aspect_ratio(), 0.001);
        ctrl.set_aspect_ratio(-3.0);
        assert_eq!(ctrl.aspect_ratio(), 0.001);
    }

    #[test]
    fn reset_returns_to_origin() {
        let mut ctrl = OrthographicCameraController::new(1.0, true);
        let mut input = FakeInput::new();
        input.press(KeyCode::S);
        input.press(KeyCode::E);
        ctrl.on_update(Timestep::from_seconds(0.1), &input);
        ctrl.set_zoom_level(3.0);

        ctrl.reset();
        assert_eq!(ctrl.position(), Vec3::ZERO);
        assert_eq!(ctrl.rotation(), 0.0);
        assert_eq!(ctrl.camera().position(), Vec3::ZERO);
        assert_eq!(ctrl.zoom_level(), 3.0);
        assert_bounds(ctrl.camera().bounds(), -3.0, 3.0, -3.0, 3.0);
    }

    #[test]
    fn rebinding_controls() {
        let mut ctrl = OrthographicCameraController::new(1.0, false);
        ctrl.set_controls(CameraControls {
            left: KeyCode::Left,
            right: KeyCode::Right,
            up: KeyCode::Up,
            down: KeyCode::Down,
            ..CameraControls::default()
        });
        let mut input = FakeInput::new();
        input.press(KeyCode::A);
        ctrl.on_update(Timestep::from_seconds(1.0), &input);
        assert_eq!(ctrl.position().x, 0.0);

        input.press(KeyCode::Left);
        ctrl.on_update(Timestep::from_seconds(1.0), &input);
        assert!(ctrl.position().x < 0.0);
    }
}
