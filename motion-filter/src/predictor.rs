//! Short-horizon position extrapolation

use crate::Vec3;

/// Position one filtered-velocity step ahead of `position`
///
/// Takes the jitter-filtered velocity. The running average is display-only
/// and must never be passed here.
pub fn predict_position(position: &Vec3, filtered_velocity: &Vec3) -> Vec3 {
    position + filtered_velocity
}
