//! Incrementally weighted running average with a cycling weight index
//!
//! The average is updated as `avg = (avg * n + value) / (n + 1)` where `n`
//! counts 0, 1, ..., 30 on the first cycle and 1, ..., 30 on every cycle
//! after it. The counter passes through 0 at the wrap but advances before it
//! is used again, so a weight of 0 only ever applies to the very first
//! sample. The accumulated average therefore survives the wrap; only the
//! weighting restarts. This is neither a sliding window (no samples are
//! stored) nor a plain cumulative mean.

use serde::{Deserialize, Serialize};

use crate::{Vec3, AVERAGE_MAX_INDEX};

/// One step of the weighted average recurrence
pub fn running_average(previous: f64, value: f64, operand: f64) -> f64 {
    (previous * operand + value) / (operand + 1.0)
}

/// Weight index and accumulated average
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageState {
    /// Weight used by the next update, in `0..=max_index`
    pub index: u32,
    pub running_average: Vec3,
}

#[derive(Debug, Clone)]
pub struct RunningAverageTracker {
    max_index: u32,
    state: AverageState,
}

impl RunningAverageTracker {
    /// Tracker starting at index zero, then cycling through `1..=AVERAGE_MAX_INDEX`
    pub fn new() -> Self {
        Self::with_max_index(AVERAGE_MAX_INDEX)
    }

    pub fn with_max_index(max_index: u32) -> Self {
        Self {
            max_index,
            state: AverageState::default(),
        }
    }

    pub fn max_index(&self) -> u32 {
        self.max_index
    }

    pub fn state(&self) -> &AverageState {
        &self.state
    }

    /// Index the next update will weight with
    pub fn index(&self) -> u32 {
        self.state.index
    }

    pub fn average(&self) -> Vec3 {
        self.state.running_average
    }

    /// Fold `value` into the average and advance the index
    pub fn update(&mut self, value: &Vec3) -> Vec3 {
        let operand = f64::from(self.state.index);
        let previous = self.state.running_average;
        self.state.running_average =
            previous.zip_map(value, |avg, v| running_average(avg, v, operand));

        // Wrap through 0 straight to the first weight of the next cycle
        self.state.index = if self.state.index >= self.max_index {
            1.min(self.max_index)
        } else {
            self.state.index + 1
        };

        self.state.running_average
    }

    /// Zero the average and restart the index
    pub fn reset(&mut self) {
        self.state = AverageState::default();
    }
}

impl Default for RunningAverageTracker {
    fn default() -> Self {
        Self::new()
    }
}
