//! Device selection and simulation settings
//!
//! Embedded as the `[device]` table of the application config, so every
//! field carries a serde default and partial tables load cleanly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::simulated::SimulationParams;
use crate::types::DeviceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub kind: DeviceKind,
    /// JSON-lines recording read by the replay backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_path: Option<PathBuf>,
    /// Restart the recording from the top when it runs out
    #[serde(default)]
    pub loop_replay: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Minimum time between simulated polls (0 = unpaced)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_us: u64,
    /// Uniform per-axis velocity noise amplitude
    #[serde(default = "default_noise")]
    pub noise: f64,
    /// Chance per sample of a velocity spike on one axis
    #[serde(default = "default_spike_probability")]
    pub spike_probability: f64,
    /// Radius of the simulated circle in metres
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Seconds per simulated revolution
    #[serde(default = "default_period")]
    pub period_s: f64,
}

fn default_seed() -> u64 {
    SimulationParams::default().seed
}

fn default_poll_interval() -> u64 {
    SimulationParams::default().poll_interval_us
}

fn default_noise() -> f64 {
    SimulationParams::default().noise
}

fn default_spike_probability() -> f64 {
    SimulationParams::default().spike_probability
}

fn default_radius() -> f64 {
    SimulationParams::default().radius
}

fn default_period() -> f64 {
    SimulationParams::default().period_s
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let sim = SimulationParams::default();
        Self {
            kind: DeviceKind::default(),
            replay_path: None,
            loop_replay: false,
            seed: sim.seed,
            poll_interval_us: sim.poll_interval_us,
            noise: sim.noise,
            spike_probability: sim.spike_probability,
            radius: sim.radius,
            period_s: sim.period_s,
        }
    }
}

impl DeviceConfig {
    /// Simulation parameters taken from this config
    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            seed: self.seed,
            poll_interval_us: self.poll_interval_us,
            noise: self.noise,
            spike_probability: self.spike_probability,
            radius: self.radius,
            period_s: self.period_s,
            ..SimulationParams::default()
        }
    }
}
