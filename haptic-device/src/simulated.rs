//! Simulated haptic device
//!
//! Traces a horizontal circle with a small vertical bob, alternating one
//! revolution of motion with one revolution at rest. Velocity noise and
//! spikes come from a seeded RNG, so a given seed always yields the same
//! sample stream. Time advances by one sample period per read, not by wall
//! clock; pacing only throttles how fast reads return.

use nalgebra::{Rotation3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::DeviceError;
use crate::types::{DeviceInfo, DeviceSample, USER_SWITCH_COUNT};

/// Gripper openings below this press the first user switch
const GRIPPER_SWITCH_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub seed: u64,
    /// Minimum time between reads (0 = unpaced)
    pub poll_interval_us: u64,
    /// Sample clock used to advance simulated time
    pub sample_rate_hz: f64,
    /// Uniform per-axis velocity noise amplitude
    pub noise: f64,
    pub spike_probability: f64,
    pub spike_magnitude: f64,
    pub radius: f64,
    pub period_s: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            poll_interval_us: 1000,
            sample_rate_hz: 1000.0,
            noise: 0.0002,
            spike_probability: 0.002,
            spike_magnitude: 0.03,
            radius: 0.01,
            period_s: 2.0,
        }
    }
}

pub struct SimulatedDevice {
    params: SimulationParams,
    info: DeviceInfo,
    rng: StdRng,
    open: bool,
    gripper_switch: bool,
    tick: u64,
    last_poll: Option<Instant>,
}

impl SimulatedDevice {
    pub fn new(params: SimulationParams) -> Self {
        let rng = StdRng::seed_from_u64(params.seed);
        Self {
            params,
            info: DeviceInfo {
                model_name: "Simulated haptic device".into(),
                sensed_rotation: true,
                has_gripper: true,
                user_switch_count: USER_SWITCH_COUNT,
            },
            rng,
            open: false,
            gripper_switch: false,
            tick: 0,
            last_poll: None,
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Samples produced since the device was opened
    pub fn tick(&self) -> u64 {
        self.tick
    }

    fn pace(&mut self) {
        if self.params.poll_interval_us == 0 {
            return;
        }
        let interval = Duration::from_micros(self.params.poll_interval_us);
        if let Some(last) = self.last_poll {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_poll = Some(Instant::now());
    }

    /// Noise-free sample at simulated time `t`
    fn ideal_sample(&self, t: f64) -> DeviceSample {
        let p = &self.params;
        let omega = TAU / p.period_s;
        let cycle = (t / p.period_s).floor() as u64;
        let moving = cycle % 2 == 0;

        // Rest cycles park at angle 0, where the moving cycle starts and ends
        let angle = if moving { omega * t } else { 0.0 };
        let rate = if moving { omega } else { 0.0 };
        let bob = p.radius / 4.0;

        let position = Vector3::new(
            p.radius * angle.cos(),
            p.radius * angle.sin(),
            bob * (2.0 * angle).sin(),
        );
        let linear_velocity = Vector3::new(
            -p.radius * rate * angle.sin(),
            p.radius * rate * angle.cos(),
            2.0 * bob * rate * (2.0 * angle).cos(),
        );

        let gripper_angle = 0.5 * (1.0 - angle.cos());
        let mut buttons = [false; USER_SWITCH_COUNT];
        buttons[0] = self.gripper_switch && gripper_angle < GRIPPER_SWITCH_THRESHOLD;

        DeviceSample {
            position,
            rotation: Rotation3::from_axis_angle(&Vector3::z_axis(), angle).into_inner(),
            gripper_angle,
            linear_velocity,
            angular_velocity: Vector3::new(0.0, 0.0, rate),
            gripper_angular_velocity: 0.5 * rate * angle.sin(),
            buttons,
        }
    }

    fn add_noise(&mut self, velocity: &mut Vector3<f64>) {
        let noise = self.params.noise.abs();
        for v in velocity.iter_mut() {
            *v += self.rng.gen_range(-noise..=noise);
        }

        let chance = self.params.spike_probability.clamp(0.0, 1.0);
        if self.rng.gen_bool(chance) {
            let axis = self.rng.gen_range(0..3);
            let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            velocity[axis] += sign * self.params.spike_magnitude;
        }
    }
}

impl crate::HapticDevice for SimulatedDevice {
    fn open(&mut self) -> Result<(), DeviceError> {
        if self.params.period_s <= 0.0 || self.params.sample_rate_hz <= 0.0 {
            return Err(DeviceError::Internal(
                "simulation period and sample rate must be positive".into(),
            ));
        }
        self.rng = StdRng::seed_from_u64(self.params.seed);
        self.tick = 0;
        self.last_poll = None;
        self.open = true;
        debug!("Simulated device opened (seed {})", self.params.seed);
        Ok(())
    }

    fn calibrate(&mut self) -> Result<(), DeviceError> {
        if !self.open {
            return Err(DeviceError::NotOpen);
        }
        debug!("Simulated device calibrated");
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.open = false;
        Ok(())
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn enable_gripper_user_switch(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.gripper_switch = enabled;
        Ok(())
    }

    fn read_sample(&mut self) -> Result<DeviceSample, DeviceError> {
        if !self.open {
            return Err(DeviceError::NotOpen);
        }
        self.pace();

        let t = self.tick as f64 / self.params.sample_rate_hz;
        self.tick += 1;

        let mut sample = self.ideal_sample(t);
        self.add_noise(&mut sample.linear_velocity);
        Ok(sample)
    }
}
