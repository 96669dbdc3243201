//! GPU device + surface management for the wgpu backend.
//!
//! Creates the wgpu Instance/Adapter/Device/Queue, configures the surface and
//! hands out frames to encode into.

mod error;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
