//! Prediction loop driver
//!
//! One dedicated thread polls the device, runs each sample through the
//! filter chain and publishes a snapshot, as fast as the device allows. The
//! only way out is cooperative: a shared stop flag checked once per
//! iteration, an optional iteration bound, or the device reporting end of
//! stream.
//!
//! Shutdown is ordered: set the flag, join the loop thread, and only then
//! close the device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::anyhow;
use haptic_device::{DeviceError, HapticDevice};
use motion_filter::{KinematicSample, MotionPipeline};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::rate::FrequencyCounter;
use crate::snapshot::{PublishedState, Segment, SnapshotPublisher};

/// Log the first read error and then every this many
const READ_ERROR_LOG_EVERY: u64 = 1000;

/// Shared "keep running" control, set once to request termination
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// What a single iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A sample was processed and a snapshot published
    Published,
    /// The device read failed; nothing was published
    Skipped,
    /// The device has no more samples
    EndOfStream,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    /// Loop iterations, including ones whose read failed
    pub iterations: u64,
    /// Samples processed and published
    pub published: u64,
    pub read_errors: u64,
    pub dead_zone_hits: u64,
    pub jitter_holds: u64,
    /// The loop ended because the device ran out of samples
    pub end_of_stream: bool,
}

pub struct LoopDriver<D> {
    device: D,
    pipeline: MotionPipeline,
    publisher: SnapshotPublisher,
    rate: FrequencyCounter,
    stop: StopFlag,
    max_iterations: Option<u64>,
    state: LoopState,
    stats: LoopStats,
    in_dead_zone: bool,
}

impl<D: HapticDevice> LoopDriver<D> {
    /// Driver over an already opened device
    pub fn new(device: D, publisher: SnapshotPublisher, stop: StopFlag) -> Self {
        Self {
            device,
            pipeline: MotionPipeline::new(),
            publisher,
            rate: FrequencyCounter::default(),
            stop,
            max_iterations: None,
            state: LoopState::Stopped,
            stats: LoopStats::default(),
            in_dead_zone: false,
        }
    }

    /// Stop on its own after `max` iterations
    pub fn with_max_iterations(mut self, max: Option<u64>) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_pipeline(mut self, pipeline: MotionPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn pipeline(&self) -> &MotionPipeline {
        &self.pipeline
    }

    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Run one iteration: poll, filter, publish
    pub fn step(&mut self) -> StepOutcome {
        self.stats.iterations += 1;

        let sample = match self.device.read_sample() {
            Ok(sample) => sample,
            Err(DeviceError::EndOfStream) => {
                debug!("Device reported end of stream");
                self.stats.end_of_stream = true;
                return StepOutcome::EndOfStream;
            }
            Err(e) => {
                self.stats.read_errors += 1;
                let n = self.stats.read_errors;
                if n == 1 || n % READ_ERROR_LOG_EVERY == 0 {
                    warn!("Device read failed ({n} so far): {e}");
                }
                return StepOutcome::Skipped;
            }
        };

        let out = self
            .pipeline
            .process(&KinematicSample::new(sample.position, sample.linear_velocity));
        self.rate.signal();

        if out.jitter_held {
            self.stats.jitter_holds += 1;
        }
        if out.dead_zone {
            self.stats.dead_zone_hits += 1;
        }
        if out.dead_zone != self.in_dead_zone {
            self.in_dead_zone = out.dead_zone;
            debug!(
                "{} dead zone",
                if out.dead_zone { "Entered" } else { "Left" }
            );
        }

        self.stats.published += 1;
        self.publisher.publish(PublishedState {
            sequence: self.stats.published,
            position: out.position,
            predicted_position: out.predicted,
            filtered_velocity_segment: Segment::from_velocity(out.position, out.filtered),
            average_velocity_segment: Segment::from_velocity(out.position, out.average),
            sample_rate_hz: self.rate.frequency(),
            rotation: sample.rotation,
            gripper_angle: sample.gripper_angle,
            buttons: sample.buttons,
            dead_zone: out.dead_zone,
        });

        StepOutcome::Published
    }

    fn bound_reached(&self) -> bool {
        self.max_iterations
            .is_some_and(|max| self.stats.iterations >= max)
    }

    /// Iterate until stopped, bounded, or out of samples
    pub fn run(&mut self) -> LoopStats {
        self.state = LoopState::Running;
        debug!("Loop running");

        while !self.stop.is_stopped() && !self.bound_reached() {
            if self.step() == StepOutcome::EndOfStream {
                break;
            }
        }

        self.state = LoopState::Stopped;
        debug!("Loop stopped after {} iterations", self.stats.iterations);
        self.stats.clone()
    }
}

impl<D: HapticDevice + 'static> LoopDriver<D> {
    /// Move the driver onto its own thread
    pub fn spawn(self) -> std::io::Result<LoopHandle<D>> {
        let stop = self.stop.clone();
        let thread = std::thread::Builder::new()
            .name("haptic-loop".into())
            .spawn(move || {
                let mut driver = self;
                let stats = driver.run();
                (driver.into_device(), stats)
            })?;
        Ok(LoopHandle { stop, thread })
    }
}

/// Control surface for a spawned loop
pub struct LoopHandle<D> {
    stop: StopFlag,
    thread: JoinHandle<(D, LoopStats)>,
}

impl<D: HapticDevice> LoopHandle<D> {
    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    /// Whether the loop thread is still iterating
    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Request a stop, wait for the loop to exit, then close the device
    pub fn terminate(self) -> anyhow::Result<LoopStats> {
        self.stop.stop();
        self.wait()
    }

    /// Wait for the loop to exit on its own, then close the device
    pub fn wait(self) -> anyhow::Result<LoopStats> {
        let (mut device, stats) = self
            .thread
            .join()
            .map_err(|_| anyhow!("Loop thread panicked"))?;

        if let Err(e) = device.close() {
            warn!("Failed to close device: {e}");
        }
        info!(
            "Loop finished: {} iterations, {} published, {} read errors",
            stats.iterations, stats.published, stats.read_errors
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::snapshot_channel;
    use haptic_device::{DeviceSample, ScriptStep, ScriptedDevice};
    use motion_filter::Vec3;

    fn opened(device: ScriptedDevice) -> ScriptedDevice {
        let mut device = device;
        device.open().unwrap();
        device
    }

    fn moving(x: f64, velocity: [f64; 3]) -> DeviceSample {
        DeviceSample::moving(Vec3::new(x, 0.0, 0.0), Vec3::from(velocity))
    }

    #[test]
    fn test_step_publishes_snapshot() {
        let (publisher, reader) = snapshot_channel();
        let device = opened(ScriptedDevice::new([moving(0.5, [0.02, 0.0, 0.0])]));
        let mut driver = LoopDriver::new(device, publisher, StopFlag::new());

        assert_eq!(driver.step(), StepOutcome::Published);
        let snapshot = reader.latest();
        assert_eq!(snapshot.sequence, 1);
        assert_eq!(
            snapshot.predicted_position,
            Vec3::new(0.5, 0.0, 0.0) + Vec3::new(0.02, 0.0, 0.0)
        );
        assert_eq!(snapshot.filtered_velocity_segment.end, snapshot.predicted_position);
        assert!(snapshot.is_consistent());
    }

    #[test]
    fn test_read_error_is_skipped() {
        let (publisher, reader) = snapshot_channel();
        let device = opened(ScriptedDevice::from_steps(
            vec![
                ScriptStep::ReadError,
                moving(0.0, [0.01, 0.0, 0.0]).into(),
            ],
            false,
        ));
        let mut driver = LoopDriver::new(device, publisher, StopFlag::new());

        assert_eq!(driver.step(), StepOutcome::Skipped);
        assert_eq!(reader.latest().sequence, 0);
        assert_eq!(driver.step(), StepOutcome::Published);
        assert_eq!(driver.stats().read_errors, 1);
        assert_eq!(driver.stats().published, 1);
    }

    #[test]
    fn test_run_stops_at_end_of_stream() {
        let (publisher, _reader) = snapshot_channel();
        let samples: Vec<_> = (0..7).map(|i| moving(i as f64, [0.0; 3])).collect();
        let mut driver = LoopDriver::new(opened(ScriptedDevice::new(samples)), publisher, StopFlag::new());

        let stats = driver.run();
        assert_eq!(driver.state(), LoopState::Stopped);
        assert!(stats.end_of_stream);
        assert_eq!(stats.published, 7);
        assert_eq!(stats.iterations, 8);
        assert_eq!(stats.dead_zone_hits, 7);
    }

    #[test]
    fn test_run_honors_iteration_bound() {
        let (publisher, reader) = snapshot_channel();
        let device = opened(ScriptedDevice::looping([moving(0.0, [0.01, 0.01, 0.01])]));
        let mut driver =
            LoopDriver::new(device, publisher, StopFlag::new()).with_max_iterations(Some(25));

        let stats = driver.run();
        assert_eq!(stats.iterations, 25);
        assert!(!stats.end_of_stream);
        assert_eq!(reader.latest().sequence, 25);
    }

    #[test]
    fn test_preset_stop_flag_runs_nothing() {
        let (publisher, _reader) = snapshot_channel();
        let stop = StopFlag::new();
        stop.stop();
        let device = opened(ScriptedDevice::looping([moving(0.0, [0.0; 3])]));
        let mut driver = LoopDriver::new(device, publisher, stop);

        assert_eq!(driver.run().iterations, 0);
        assert_eq!(driver.into_device().reads(), 0);
    }

    #[test]
    fn test_spawned_loop_closes_device_after_join() {
        let (publisher, reader) = snapshot_channel();
        let device = opened(ScriptedDevice::looping([moving(0.0, [0.02, 0.0, 0.0])]));
        let handle = LoopDriver::new(device, publisher, StopFlag::new())
            .spawn()
            .unwrap();

        while reader.latest().sequence < 100 {
            std::thread::yield_now();
        }
        assert!(handle.is_running());
        let stats = handle.terminate().unwrap();
        assert!(stats.published >= 100);
        assert!(!stats.end_of_stream);
    }
}
