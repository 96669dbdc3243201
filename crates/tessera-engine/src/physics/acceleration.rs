use glam::Vec2;

use crate::time::Timestep;

/// Constant 2D acceleration, in units per second squared.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Acceleration(Vec2);

impl Acceleration {
    pub const ZERO: Self = Self(Vec2::ZERO);

    pub const fn new(accel: Vec2) -> Self {
        Self(accel)
    }

    /// `radians` is measured counter-clockwise from +X.
    pub fn from_polar(magnitude: f32, radians: f32) -> Self {
        Self(Vec2::from_angle(radians) * magnitude)
    }

    #[inline]
    pub fn get(&self) -> Vec2 {
        self.0
    }

    pub fn set(&mut self, accel: Vec2) {
        self.0 = accel;
    }

    pub fn set_from_polar(&mut self, magnitude: f32, radians: f32) {
        *self = Self::from_polar(magnitude, radians);
    }

    pub fn magnitude(&self) -> f32 {
        self.0.length()
    }

    /// Radians in `(-π, π]`.
    pub fn angle(&self) -> f32 {
        self.0.y.atan2(self.0.x)
    }

    /// `velocity += a * dt`
    pub fn apply(&self, velocity: &mut Vec2, ts: Timestep) {
        *velocity += self.0 * ts.seconds();
    }
}
