//! Per-iteration filter chain
//!
//! Runs the stages in the fixed order the control loop depends on:
//!
//! 1. clamp raw velocity per axis
//! 2. jitter filter the clamped velocity
//! 3. dead-zone test on the clamped velocity; inside it the downstream
//!    velocity is zero and the prediction collapses onto the position
//! 4. running average of the downstream velocity
//! 5. predicted position from the downstream (never the averaged) velocity

use serde::{Deserialize, Serialize};

use crate::average::RunningAverageTracker;
use crate::clamp::AxisClamp;
use crate::dead_zone::DeadZoneReset;
use crate::jitter::JitterFilter;
use crate::predictor::predict_position;
use crate::Vec3;

/// Position and raw linear velocity read from the device in one poll
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KinematicSample {
    pub position: Vec3,
    pub raw_velocity: Vec3,
}

impl KinematicSample {
    pub fn new(position: Vec3, raw_velocity: Vec3) -> Self {
        Self {
            position,
            raw_velocity,
        }
    }
}

/// Everything one iteration of the filter chain produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub position: Vec3,
    /// Raw velocity after the per-axis limit
    pub clamped: Vec3,
    /// Jitter-filtered velocity, zeroed inside the dead zone
    pub filtered: Vec3,
    /// Running average after this iteration's update
    pub average: Vec3,
    /// Weight index the average was updated with
    pub average_index: u32,
    pub predicted: Vec3,
    /// The clamped velocity was inside the dead zone
    pub dead_zone: bool,
    /// The jitter filter substituted the held velocity
    pub jitter_held: bool,
}

/// Owns every filter stage and its state for the lifetime of the loop
#[derive(Debug, Clone, Default)]
pub struct MotionPipeline {
    clamp: AxisClamp,
    jitter: JitterFilter,
    dead_zone: DeadZoneReset,
    average: RunningAverageTracker,
}

impl MotionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicitly configured stages
    pub fn with_stages(
        clamp: AxisClamp,
        jitter: JitterFilter,
        dead_zone: DeadZoneReset,
        average: RunningAverageTracker,
    ) -> Self {
        Self {
            clamp,
            jitter,
            dead_zone,
            average,
        }
    }

    pub fn jitter(&self) -> &JitterFilter {
        &self.jitter
    }

    pub fn average(&self) -> &RunningAverageTracker {
        &self.average
    }

    /// Run one sample through the chain
    pub fn process(&mut self, sample: &KinematicSample) -> PipelineOutput {
        let clamped = self.clamp.apply(&sample.raw_velocity);
        let held = self.jitter.filter(&clamped);
        let jitter_held = held != clamped;

        let dead_zone = self.dead_zone.contains(&clamped);
        let filtered = if dead_zone { Vec3::zeros() } else { held };

        let average_index = self.average.index();
        let average = self.average.update(&filtered);

        let predicted = if dead_zone {
            sample.position
        } else {
            predict_position(&sample.position, &filtered)
        };

        PipelineOutput {
            position: sample.position,
            clamped,
            filtered,
            average,
            average_index,
            predicted,
            dead_zone,
            jitter_held,
        }
    }

    /// Return every stage to its initial state
    pub fn reset(&mut self) {
        self.jitter.reset();
        self.average.reset();
    }
}
