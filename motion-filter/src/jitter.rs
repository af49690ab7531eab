//! Hold filter for single-sample velocity spikes
//!
//! Each axis is compared against the held velocity in x, y, z order. A
//! failing axis replaces the whole working vector with the held vector; a
//! passing axis copies the working vector into the held vector. The checks
//! run sequentially over shared state, so once an earlier axis passes and
//! commits the current velocity, a later failing axis restores that same
//! current velocity. In practice the first axis evaluated decides the
//! outcome. Axes are not filtered independently.

use serde::{Deserialize, Serialize};

use crate::{Vec3, JITTER_THRESHOLD};

/// Held velocity carried between iterations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub previous_velocity: Vec3,
}

/// Rejects velocity changes at or above the threshold by holding the
/// previous accepted velocity
#[derive(Debug, Clone)]
pub struct JitterFilter {
    threshold: f64,
    /// `None` until the first sample arrives
    state: Option<FilterState>,
}

impl JitterFilter {
    /// Unprimed filter: the first sample is accepted as-is and held
    pub fn new() -> Self {
        Self::with_threshold(JITTER_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            state: None,
        }
    }

    /// Primed filter holding an explicit previous velocity
    pub fn with_previous(previous_velocity: Vec3) -> Self {
        Self {
            threshold: JITTER_THRESHOLD,
            state: Some(FilterState { previous_velocity }),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn state(&self) -> Option<&FilterState> {
        self.state.as_ref()
    }

    pub fn is_primed(&self) -> bool {
        self.state.is_some()
    }

    /// Forget the held velocity; the next sample primes the filter again
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Filter one clamped velocity, returning the velocity to use downstream
    pub fn filter(&mut self, current: &Vec3) -> Vec3 {
        let Some(state) = self.state.as_mut() else {
            self.state = Some(FilterState {
                previous_velocity: *current,
            });
            return *current;
        };

        // Deltas are taken against the held value as it was on entry
        let held_on_entry = state.previous_velocity;
        let mut output = *current;

        for axis in 0..3 {
            if (held_on_entry[axis] - current[axis]).abs() >= self.threshold {
                output = state.previous_velocity;
            } else {
                state.previous_velocity = output;
            }
        }

        output
    }
}

impl Default for JitterFilter {
    fn default() -> Self {
        Self::new()
    }
}
