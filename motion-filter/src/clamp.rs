//! Symmetric per-axis velocity limit

use crate::{Vec3, CLAMP_LIMIT};

/// Bound `value` to `[-limit, limit]`
///
/// Unlike `f64::clamp` this never panics, and NaN passes through unchanged.
pub fn clamp_axis(value: f64, limit: f64) -> f64 {
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

/// Clamps each velocity axis independently to the same limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisClamp {
    limit: f64,
}

impl AxisClamp {
    pub const fn new(limit: f64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// Clamp every axis of `velocity`
    pub fn apply(&self, velocity: &Vec3) -> Vec3 {
        velocity.map(|v| clamp_axis(v, self.limit))
    }
}

impl Default for AxisClamp {
    fn default() -> Self {
        Self::new(CLAMP_LIMIT)
    }
}
