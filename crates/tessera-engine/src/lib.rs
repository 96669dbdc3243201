//! Tessera engine crate.
//!
//! Windowing, input, layers and a 2D renderer over wgpu, with a headless
//! backend for tests and offscreen runs. Particles and span profiling sit on
//! top of the renderer.

pub mod device;
pub mod window;
pub mod events;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod physics;
pub mod profiling;
pub mod renderer;
