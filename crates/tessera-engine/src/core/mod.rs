//! Application core.
//!
//! The [`Application`] owns the window, renderer and [`LayerStack`] and runs
//! the frame loop. User code plugs in through the [`Layer`] trait.

mod application;
mod camera_controller;
mod layer;
mod layer_stack;
mod overlay;

pub use application::{AppError, Application, ApplicationConfig};
pub use camera_controller::{CameraControls, OrthographicCameraController};
pub use layer::{Layer, LayerCtx, LayerId, LayerInfo, LayerRef, layer_ref};
pub use layer_stack::LayerStack;
pub use overlay::{DebugOverlay, OverlayFrame};
