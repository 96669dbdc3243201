//! Time subsystem.
//!
//! `FrameClock` is ticked once per application frame; the resulting
//! `Timestep` is what layers see.

mod frame_clock;
mod timestep;

pub use frame_clock::{FrameClock, FrameTime};
pub use timestep::Timestep;
