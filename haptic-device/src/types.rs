//! Common types for the device interface

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Number of user switches reported per sample
pub const USER_SWITCH_COUNT: usize = 4;

/// Backend used to produce samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Synthetic motion generated in-process
    #[default]
    Simulated,
    /// Samples read back from a JSON-lines recording
    Replay,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Simulated => "simulated",
            DeviceKind::Replay => "replay",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of an opened device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Human-readable model name
    pub model_name: String,
    /// Device reports orientation, not just position
    pub sensed_rotation: bool,
    /// Device has a gripper that can act as a user switch
    pub has_gripper: bool,
    /// Number of user switches the device exposes
    pub user_switch_count: usize,
}

/// One poll of the device
///
/// Units follow the device: metres, radians, metres per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSample {
    pub position: Vector3<f64>,
    #[serde(default = "identity_rotation")]
    pub rotation: Matrix3<f64>,
    #[serde(default)]
    pub gripper_angle: f64,
    pub linear_velocity: Vector3<f64>,
    #[serde(default = "zero_vector")]
    pub angular_velocity: Vector3<f64>,
    #[serde(default)]
    pub gripper_angular_velocity: f64,
    #[serde(default)]
    pub buttons: [bool; USER_SWITCH_COUNT],
}

fn identity_rotation() -> Matrix3<f64> {
    Matrix3::identity()
}

fn zero_vector() -> Vector3<f64> {
    Vector3::zeros()
}

impl DeviceSample {
    /// Stationary sample at `position`
    pub fn at_rest(position: Vector3<f64>) -> Self {
        Self::moving(position, Vector3::zeros())
    }

    /// Sample with the given position and linear velocity, everything else neutral
    pub fn moving(position: Vector3<f64>, linear_velocity: Vector3<f64>) -> Self {
        Self {
            position,
            rotation: identity_rotation(),
            gripper_angle: 0.0,
            linear_velocity,
            angular_velocity: zero_vector(),
            gripper_angular_velocity: 0.0,
            buttons: [false; USER_SWITCH_COUNT],
        }
    }

    /// First field holding a NaN or infinite value, if any
    pub fn first_non_finite(&self) -> Option<&'static str> {
        if !self.position.iter().all(|v| v.is_finite()) {
            Some("position")
        } else if !self.rotation.iter().all(|v| v.is_finite()) {
            Some("rotation")
        } else if !self.gripper_angle.is_finite() {
            Some("gripper_angle")
        } else if !self.linear_velocity.iter().all(|v| v.is_finite()) {
            Some("linear_velocity")
        } else if !self.angular_velocity.iter().all(|v| v.is_finite()) {
            Some("angular_velocity")
        } else if !self.gripper_angular_velocity.is_finite() {
            Some("gripper_angular_velocity")
        } else {
            None
        }
    }

    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }
}

impl Default for DeviceSample {
    fn default() -> Self {
        Self::at_rest(Vector3::zeros())
    }
}
