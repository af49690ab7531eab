//! Published state hand-off between the loop and its readers
//!
//! The loop builds a fresh immutable [`PublishedState`] every iteration and
//! swaps it into a shared slot as a whole. Readers clone the `Arc` out of the
//! slot, so they always hold a complete snapshot from a single iteration and
//! never block the loop for longer than a pointer swap.

use motion_filter::Vec3;
use nalgebra::Matrix3;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use haptic_device::USER_SWITCH_COUNT;

/// A velocity drawn as a line from the current position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    /// `start = origin`, `end = origin + velocity`
    pub fn from_velocity(origin: Vec3, velocity: Vec3) -> Self {
        Self {
            start: origin,
            end: origin + velocity,
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }
}

/// Everything the render side needs from one loop iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedState {
    /// Iteration that produced this snapshot (0 = nothing published yet)
    pub sequence: u64,
    pub position: Vec3,
    pub predicted_position: Vec3,
    pub filtered_velocity_segment: Segment,
    pub average_velocity_segment: Segment,
    pub sample_rate_hz: f64,
    pub rotation: Matrix3<f64>,
    pub gripper_angle: f64,
    pub buttons: [bool; USER_SWITCH_COUNT],
    pub dead_zone: bool,
}

impl Default for PublishedState {
    fn default() -> Self {
        Self {
            sequence: 0,
            position: Vec3::zeros(),
            predicted_position: Vec3::zeros(),
            filtered_velocity_segment: Segment::default(),
            average_velocity_segment: Segment::default(),
            sample_rate_hz: 0.0,
            rotation: Matrix3::identity(),
            gripper_angle: 0.0,
            buttons: [false; USER_SWITCH_COUNT],
            dead_zone: false,
        }
    }
}

impl PublishedState {
    /// Segments start at the position and the prediction sits at the tip of
    /// the filtered-velocity segment
    pub fn is_consistent(&self) -> bool {
        self.filtered_velocity_segment.start == self.position
            && self.average_velocity_segment.start == self.position
            && self.filtered_velocity_segment.end == self.predicted_position
            && (!self.dead_zone || self.predicted_position == self.position)
    }
}

type Slot = Arc<Mutex<Arc<PublishedState>>>;

/// Create a connected publisher/reader pair holding the default state
pub fn snapshot_channel() -> (SnapshotPublisher, SnapshotReader) {
    let slot: Slot = Arc::new(Mutex::new(Arc::new(PublishedState::default())));
    (
        SnapshotPublisher { slot: slot.clone() },
        SnapshotReader { slot },
    )
}

/// Write side, owned by the loop
pub struct SnapshotPublisher {
    slot: Slot,
}

impl SnapshotPublisher {
    /// Replace the current snapshot
    pub fn publish(&self, state: PublishedState) {
        let next = Arc::new(state);
        let previous = std::mem::replace(&mut *self.slot.lock(), next);
        // Last reference to the old snapshot may be freed here, after unlock
        drop(previous);
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: self.slot.clone(),
        }
    }
}

/// Read side, cheap to clone and share between threads
#[derive(Clone)]
pub struct SnapshotReader {
    slot: Slot,
}

impl SnapshotReader {
    /// Most recently published snapshot
    pub fn latest(&self) -> Arc<PublishedState> {
        self.slot.lock().clone()
    }
}
