use std::cell::Cell;

use glam::{Mat4, Quat, Vec3};

/// Projection rectangle of an orthographic camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthographicBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl OrthographicBounds {
    pub const fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

impl Default for OrthographicBounds {
    fn default() -> Self {
        Self::new(-1.0, 1.0, -1.0, 1.0)
    }
}

/// How often each cached matrix has been rebuilt.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CameraRebuilds {
    pub projection: u32,
    pub view: u32,
    pub view_projection: u32,
}

/// 2D orthographic camera with lazily rebuilt matrices.
///
/// Getters take `&self` and rebuild stale caches on read. Position and
/// rotation setters ignore assignments of the current value; projection
/// setters always invalidate.
#[derive(Debug, Clone)]
pub struct OrthographicCamera {
    bounds: OrthographicBounds,
    near: f32,
    far: f32,

    position: Vec3,
    /// Radians around +Z.
    rotation: f32,

    projection: Cell<Mat4>,
    view: Cell<Mat4>,
    view_projection: Cell<Mat4>,

    projection_dirty: Cell<bool>,
    view_dirty: Cell<bool>,
    view_projection_dirty: Cell<bool>,

    rebuilds: Cell<CameraRebuilds>,
}

impl OrthographicCamera {
    pub const DEFAULT_NEAR: f32 = -1.0;
    pub const DEFAULT_FAR: f32 = 1.0;

    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self::with_depth(
            OrthographicBounds::new(left, right, bottom, top),
            Self::DEFAULT_NEAR,
            Self::DEFAULT_FAR,
        )
    }

    pub fn with_depth(bounds: OrthographicBounds, near: f32, far: f32) -> Self {
        Self {
            bounds,
            near,
            far,
            position: Vec3::ZERO,
            rotation: 0.0,
            projection: Cell::new(Mat4::IDENTITY),
            view: Cell::new(Mat4::IDENTITY),
            view_projection: Cell::new(Mat4::IDENTITY),
            projection_dirty: Cell::new(true),
            view_dirty: Cell::new(true),
            view_projection_dirty: Cell::new(true),
            rebuilds: Cell::new(CameraRebuilds::default()),
        }
    }

    #[inline]
    pub fn bounds(&self) -> OrthographicBounds {
        self.bounds
    }

    #[inline]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[inline]
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Keeps near/far.
    pub fn set_projection(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        self.bounds = OrthographicBounds::new(left, right, bottom, top);
        self.mark_projection_dirty();
    }

    pub fn set_projection_with_depth(&mut self, bounds: OrthographicBounds, near: f32, far: f32) {
        self.bounds = bounds;
        self.near = near;
        self.far = far;
        self.mark_projection_dirty();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        if self.position == position {
            return;
        }
        self.position = position;
        self.mark_view_dirty();
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, radians: f32) {
        if self.rotation == radians {
            return;
        }
        self.rotation = radians;
        self.mark_view_dirty();
    }

    #[inline]
    pub fn rotation_degrees(&self) -> f32 {
        self.rotation.to_degrees()
    }

    pub fn set_rotation_degrees(&mut self, degrees: f32) {
        self.set_rotation(degrees.to_radians());
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.rebuild_projection();
        self.projection.get()
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.rebuild_view();
        self.view.get()
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.rebuild_projection();
        self.rebuild_view();
        if self.view_projection_dirty.get() {
            self.view_projection
                .set(self.projection.get() * self.view.get());
            self.view_projection_dirty.set(false);
            self.count(|r| r.view_projection += 1);
        }
        self.view_projection.get()
    }

    #[inline]
    pub fn rebuild_count(&self) -> CameraRebuilds {
        self.rebuilds.get()
    }

    fn mark_view_dirty(&self) {
        self.view_dirty.set(true);
        self.view_projection_dirty.set(true);
    }

    fn mark_projection_dirty(&self) {
        self.projection_dirty.set(true);
        self.view_projection_dirty.set(true);
    }

    fn rebuild_projection(&self) {
        if !self.projection_dirty.get() {
            return;
        }
        let _span = tracing::trace_span!("OrthographicCamera::rebuild_projection").entered();
        let b = self.bounds;
        self.projection.set(Mat4::orthographic_rh(
            b.left, b.right, b.bottom, b.top, self.near, self.far,
        ));
        self.projection_dirty.set(false);
        self.view_projection_dirty.set(true);
        self.count(|r| r.projection += 1);
    }

    fn rebuild_view(&self) {
        if !self.view_dirty.get() {
            return;
        }
        let _span = tracing::trace_span!("OrthographicCamera::rebuild_view").entered();
        let model = Mat4::from_rotation_translation(Quat::from_rotation_z(self.rotation), self.position);
        self.view.set(model.inverse());
        self.view_dirty.set(false);
        self.view_projection_dirty.set(true);
        self.count(|r| r.view += 1);
    }

    fn count(&self, bump: impl FnOnce(&mut CameraRebuilds)) {
        let mut rebuilds = self.rebuilds.get();
        bump(&mut rebuilds);
        self.rebuilds.set(rebuilds);
    }
}
