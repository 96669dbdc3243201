//! Small kinematics helpers.

mod acceleration;

pub use acceleration::Acceleration;
