//! Velocity filtering and position prediction for haptic device streams
//!
//! Turns the raw linear velocity reported by a haptic device into a
//! jitter-filtered velocity, a running-average velocity and a predicted
//! position one velocity step ahead of the cursor.
//!
//! ```text
//! raw velocity → [AxisClamp] → [JitterFilter] ─┬→ [DeadZoneReset]
//!                                              ├→ [RunningAverageTracker]
//!                                              └→ [predict_position]
//! ```
//!
//! Every stage is a plain value type with no I/O or allocation, so the
//! real-time loop owns them directly. [`MotionPipeline`] runs them in order.

pub mod average;
pub mod clamp;
pub mod dead_zone;
pub mod jitter;
pub mod pipeline;
pub mod predictor;

pub use average::{running_average, AverageState, RunningAverageTracker};
pub use clamp::{clamp_axis, AxisClamp};
pub use dead_zone::DeadZoneReset;
pub use jitter::{FilterState, JitterFilter};
pub use pipeline::{KinematicSample, MotionPipeline, PipelineOutput};
pub use predictor::predict_position;

/// Three-component vector used for positions and velocities (device units)
pub type Vec3 = nalgebra::Vector3<f64>;

/// Per-axis bound applied to raw velocity before any filtering
pub const CLAMP_LIMIT: f64 = 0.05;

/// Sample-to-sample velocity change treated as jitter
pub const JITTER_THRESHOLD: f64 = 0.009;

/// Sum of absolute clamped velocity components below which the device is still
pub const DEAD_ZONE_THRESHOLD: f64 = 0.001;

/// Largest running-average weight index before it wraps
pub const AVERAGE_MAX_INDEX: u32 = 30;
