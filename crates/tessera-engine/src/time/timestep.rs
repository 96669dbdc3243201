use std::ops::Mul;

/// Elapsed time for one frame, in seconds.
///
/// Passed to every layer update. Converts to `f32` seconds implicitly through
/// `From` and multiplies directly with speeds.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
pub struct Timestep(f32);

impl Timestep {
    #[inline]
    pub const fn from_seconds(seconds: f32) -> Self {
        Self(seconds)
    }

    #[inline]
    pub fn seconds(self) -> f32 {
        self.0
    }

    #[inline]
    pub fn milliseconds(self) -> f32 {
        self.0 * 1000.0
    }
}

impl From<f32> for Timestep {
    fn from(seconds: f32) -> Self {
        Self(seconds)
    }
}

impl From<Timestep> for f32 {
    fn from(ts: Timestep) -> Self {
        ts.0
    }
}

impl Mul<f32> for Timestep {
    type Output = f32;

    fn mul(self, rhs: f32) -> f32 {
        self.0 * rhs
    }
}

impl Mul<Timestep> for f32 {
    type Output = f32;

    fn mul(self, rhs: Timestep) -> f32 {
        self * rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_units() {
        let ts = Timestep::from_seconds(0.25);
        assert_eq!(ts.seconds(), 0.25);
        assert_eq!(ts.milliseconds(), 250.0);
        assert_eq!(f32::from(ts), 0.25);
    }

    #[test]
    fn scales_speeds_from_either_side() {
        let ts = Timestep::from(0.5);
        assert_eq!(ts * 4.0, 2.0);
        assert_eq!(4.0 * ts, 2.0);
    }
}
