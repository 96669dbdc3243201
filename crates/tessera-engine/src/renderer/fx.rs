use std::f32::consts::PI;

use glam::{Vec2, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::renderer2d::Renderer2D;
use crate::physics::Acceleration;
use crate::time::Timestep;

/// Spin applied to every live particle, radians per second.
const SPIN: f32 = 0.01;

/// Parameters for one spawned particle.
///
/// Jitter values are full ranges: a jitter of `j` offsets by up to `±j / 2`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FxSpec {
    pub position: Vec2,
    pub velocity: Vec2,
    pub velocity_jitter: Vec2,

    pub color_start: Vec4,
    pub color_end: Vec4,

    pub size_start: f32,
    pub size_end: f32,
    pub size_jitter: f32,

    /// Seconds.
    pub lifetime: f32,
}

impl Default for FxSpec {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            velocity_jitter: Vec2::ZERO,
            color_start: Vec4::ONE,
            color_end: Vec4::ZERO,
            size_start: 1.0,
            size_end: 0.0,
            size_jitter: 0.0,
            lifetime: 1.0,
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Particle {
    live: bool,
    position: Vec2,
    velocity: Vec2,
    rotation: f32,
    color_start: Vec4,
    color_end: Vec4,
    size_start: f32,
    size_end: f32,
    lifetime: f32,
    remaining: f32,
}

impl Particle {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Seconds left to live.
    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// 1 at spawn, falling to 0 at expiry.
    pub fn life_fraction(&self) -> f32 {
        self.remaining / self.lifetime
    }

    /// Color and size at the current point of the particle's life. Alpha fades with age.
    pub fn appearance(&self) -> (Vec4, f32) {
        let t = self.life_fraction();
        let mut color = self.color_end.lerp(self.color_start, t);
        color.w *= t;
        let size = self.size_end + (self.size_start - self.size_end) * t;
        (color, size)
    }
}

/// Fixed pool of short-lived quads.
///
/// Spawning writes into a ring buffer, so once the pool is full the oldest
/// slot is reused whether or not its particle is still alive.
pub struct FxSystem {
    pool: Vec<Particle>,
    head: usize,
    acceleration: Acceleration,
    rng: SmallRng,
}

impl Default for FxSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FxSystem {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_rng(capacity, SmallRng::from_os_rng())
    }

    /// Reproducible jitter and spawn rotation.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::from_rng(capacity, SmallRng::seed_from_u64(seed))
    }

    fn from_rng(capacity: usize, rng: SmallRng) -> Self {
        let mut fx = Self {
            pool: Vec::new(),
            head: 0,
            acceleration: Acceleration::ZERO,
            rng,
        };
        fx.resize_pool(capacity);
        fx
    }

    /// Kills every particle and restarts the ring at slot 0.
    pub fn resize_pool(&mut self, capacity: usize) {
        self.pool.clear();
        self.pool.resize(capacity, Particle::default());
        self.head = 0;
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    pub fn live_count(&self) -> usize {
        self.pool.iter().filter(|p| p.live).count()
    }

    /// Raw pool in slot order, dead slots included.
    pub fn particles(&self) -> &[Particle] {
        &self.pool
    }

    /// Applied to every live particle's velocity on update.
    pub fn set_acceleration(&mut self, acceleration: Acceleration) {
        self.acceleration = acceleration;
    }

    pub fn acceleration(&self) -> Acceleration {
        self.acceleration
    }

    /// Ignored for an empty pool or a non-positive lifetime.
    pub fn spawn(&mut self, spec: &FxSpec) {
        if self.pool.is_empty() || spec.lifetime <= 0.0 {
            return;
        }

        let jitter = Vec2::new(self.rng.random::<f32>() - 0.5, self.rng.random::<f32>() - 0.5);
        let rotation = self.rng.random_range(-PI..PI);
        let size_jitter = self.rng.random::<f32>() - 0.5;

        self.pool[self.head] = Particle {
            live: true,
            position: spec.position,
            velocity: spec.velocity + spec.velocity_jitter * jitter,
            rotation,
            color_start: spec.color_start,
            color_end: spec.color_end,
            size_start: spec.size_start + spec.size_jitter * size_jitter,
            size_end: spec.size_end,
            lifetime: spec.lifetime,
            remaining: spec.lifetime,
        };
        self.head = (self.head + 1) % self.pool.len();
    }

    pub fn update(&mut self, ts: Timestep) {
        let dt = ts.seconds();
        for particle in self.pool.iter_mut().filter(|p| p.live) {
            particle.remaining -= dt;
            if particle.remaining <= 0.0 {
                particle.live = false;
                continue;
            }
            self.acceleration.apply(&mut particle.velocity, ts);
            particle.position += particle.velocity * dt;
            particle.rotation += SPIN * dt;
        }
    }

    /// Draws live particles into the current scene.
    pub fn render(&self, r2d: &mut Renderer2D<'_>) {
        let _span = tracing::trace_span!("FxSystem::render").entered();
        for particle in self.pool.iter().filter(|p| p.live) {
            let (color, size) = particle.appearance();
            r2d.draw_rotated_quad(particle.position, Vec2::splat(size), particle.rotation, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::{CommandLog, HeadlessBackend};
    use crate::renderer::{OrthographicCamera, Renderer};
    use approx::assert_relative_eq;

    fn at(x: f32) -> FxSpec {
        FxSpec {
            position: Vec2::new(x, 0.0),
            ..FxSpec::default()
        }
    }

    fn renderer() -> (Renderer, CommandLog) {
        let backend = HeadlessBackend::new();
        let log = backend.command_log();
        let mut renderer = Renderer::new();
        renderer.init(Box::new(backend)).unwrap();
        (renderer, log)
    }

    #[test]
    fn spawn_wraps_around_the_pool() {
        let mut fx = FxSystem::with_seed(3, 7);
        for x in 0..4 {
            fx.spawn(&at(x as f32));
        }
        assert_eq!(fx.live_count(), 3);
        let xs: Vec<f32> = fx.particles().iter().map(|p| p.position().x).collect();
        // Fourth spawn overwrote the oldest slot.
        assert_eq!(xs, [3.0, 1.0, 2.0]);

        fx.spawn(&at(9.0));
        assert_eq!(fx.particles()[1].position().x, 9.0);
    }

    #[test]
    fn particles_expire_after_their_lifetime() {
        let mut fx = FxSystem::with_seed(4, 1);
        fx.spawn(&FxSpec {
            velocity: Vec2::new(2.0, 0.0),
            lifetime: 1.0,
            ..FxSpec::default()
        });
        fx.spawn(&FxSpec {
            lifetime: 3.0,
            ..FxSpec::default()
        });

        fx.update(Timestep::from_seconds(0.6));
        assert_eq!(fx.live_count(), 2);
        let first = fx.particles()[0];
        assert_relative_eq!(first.position().x, 1.2, epsilon = 1e-5);
        assert_relative_eq!(first.remaining(), 0.4, epsilon = 1e-5);

        fx.update(Timestep::from_seconds(0.5));
        assert!(!fx.particles()[0].is_live());
        assert_eq!(fx.live_count(), 1);

        fx.update(Timestep::from_seconds(2.0));
        assert_eq!(fx.live_count(), 0);
    }

    #[test]
    fn acceleration_bends_velocity() {
        let mut fx = FxSystem::with_seed(1, 3);
        fx.set_acceleration(Acceleration::new(Vec2::new(0.0, -10.0)));
        fx.spawn(&FxSpec {
            lifetime: 5.0,
            ..FxSpec::default()
        });
        fx.update(Timestep::from_seconds(0.5));
        let p = fx.particles()[0];
        assert_relative_eq!(p.velocity().y, -5.0);
        assert_relative_eq!(p.position().y, -2.5);
    }

    #[test]
    fn degenerate_spawns_are_ignored() {
        let mut fx = FxSystem::with_seed(2, 0);
        fx.spawn(&FxSpec {
            lifetime: 0.0,
            ..FxSpec::default()
        });
        assert_eq!(fx.live_count(), 0);

        fx.resize_pool(0);
        fx.spawn(&FxSpec::default());
        assert_eq!(fx.capacity(), 0);
    }

    #[test]
    fn resize_kills_everything() {
        let mut fx = FxSystem::with_seed(2, 0);
        fx.spawn(&FxSpec::default());
        fx.spawn(&FxSpec::default());
        fx.resize_pool(5);
        assert_eq!(fx.capacity(), 5);
        assert_eq!(fx.live_count(), 0);
        fx.spawn(&at(4.0));
        assert_eq!(fx.particles()[0].position().x, 4.0);
    }

    #[test]
    fn render_fades_color_and_size() {
        let (mut renderer, log) = renderer();
        let mut fx = FxSystem::with_seed(8, 42);
        fx.spawn(&FxSpec {
            color_start: Vec4::new(1.0, 0.0, 0.0, 1.0),
            color_end: Vec4::new(0.0, 0.0, 1.0, 1.0),
            size_start: 1.0,
            size_end: 0.0,
            lifetime: 1.0,
            ..FxSpec::default()
        });
        fx.spawn(&at(1.0));
        fx.update(Timestep::from_seconds(0.5));

        let (color, size) = fx.particles()[0].appearance();
        assert_relative_eq!(color.x, 0.5);
        assert_relative_eq!(color.z, 0.5);
        assert_relative_eq!(color.w, 0.5);
        assert_relative_eq!(size, 0.5);

        let mut r2d = renderer.renderer_2d();
        r2d.begin_scene(&OrthographicCamera::new(-1.0, 1.0, -1.0, 1.0));
        fx.render(&mut r2d);
        r2d.end_scene();

        let draws = log.draws();
        assert_eq!(draws.len(), 2);
        let uniforms = draws[0].uniforms.as_ref().unwrap();
        let tint = uniforms.float4("u_Color").unwrap();
        assert_relative_eq!(tint.w, 0.5);
    }
}
