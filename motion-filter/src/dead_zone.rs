//! Stillness detection that suppresses prediction drift

use crate::{Vec3, DEAD_ZONE_THRESHOLD};

/// Treats the device as still when the L1 magnitude of the clamped velocity
/// is below the threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadZoneReset {
    threshold: f64,
}

impl DeadZoneReset {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `|x| + |y| + |z|`
    pub fn magnitude(velocity: &Vec3) -> f64 {
        velocity.x.abs() + velocity.y.abs() + velocity.z.abs()
    }

    /// Whether `clamped` lies strictly inside the dead zone
    pub fn contains(&self, clamped: &Vec3) -> bool {
        Self::magnitude(clamped) < self.threshold
    }
}

impl Default for DeadZoneReset {
    fn default() -> Self {
        Self::new(DEAD_ZONE_THRESHOLD)
    }
}
