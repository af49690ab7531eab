//! Device interface for haptic input devices
//!
//! A haptic device is polled synchronously, one kinematic sample per call.
//! This crate defines that interface and the backends used to drive the
//! prediction loop without hardware attached:
//!
//! - Simulated (deterministic circular motion with seeded noise and spikes)
//! - Replay (JSON-lines recording, optionally looping)
//! - Scripted (in-memory sample list)
//!
//! Every backend opened through [`open_device`] is wrapped in [`Sanitized`],
//! so consumers never see NaN or infinite values.

pub mod config;
pub mod error;
pub mod types;

mod replay;
mod sanitize;
mod scripted;
mod simulated;

pub use config::DeviceConfig;
pub use error::DeviceError;
pub use replay::{read_jsonl, write_jsonl, ReplayDevice};
pub use sanitize::Sanitized;
pub use scripted::{ScriptStep, ScriptedDevice};
pub use simulated::{SimulatedDevice, SimulationParams};
pub use types::{DeviceInfo, DeviceKind, DeviceSample, USER_SWITCH_COUNT};

use tracing::info;

/// The core device trait - all backends implement this
///
/// Calls are blocking. The loop thread owns the device exclusively, so
/// implementations only need to be `Send`.
pub trait HapticDevice: Send {
    /// Acquire the device. Reading before this returns [`DeviceError::NotOpen`].
    fn open(&mut self) -> Result<(), DeviceError>;

    /// Run the device's calibration routine, if it has one
    fn calibrate(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Release the device
    fn close(&mut self) -> Result<(), DeviceError>;

    /// Get device information
    fn info(&self) -> &DeviceInfo;

    /// Let the gripper act as the first user switch
    fn enable_gripper_user_switch(&mut self, _enabled: bool) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Poll one sample
    ///
    /// # Returns
    /// The current sample, or [`DeviceError::EndOfStream`] once a finite
    /// source is exhausted
    fn read_sample(&mut self) -> Result<DeviceSample, DeviceError>;
}

impl<D: HapticDevice + ?Sized> HapticDevice for Box<D> {
    fn open(&mut self) -> Result<(), DeviceError> {
        (**self).open()
    }

    fn calibrate(&mut self) -> Result<(), DeviceError> {
        (**self).calibrate()
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        (**self).close()
    }

    fn info(&self) -> &DeviceInfo {
        (**self).info()
    }

    fn enable_gripper_user_switch(&mut self, enabled: bool) -> Result<(), DeviceError> {
        (**self).enable_gripper_user_switch(enabled)
    }

    fn read_sample(&mut self) -> Result<DeviceSample, DeviceError> {
        (**self).read_sample()
    }
}

/// Type alias for a boxed device
pub type BoxedDevice = Box<dyn HapticDevice>;

/// Build the backend selected by `config`, wrap it in [`Sanitized`] and open it
pub fn open_device(config: &DeviceConfig) -> Result<BoxedDevice, DeviceError> {
    let mut device: BoxedDevice = match config.kind {
        DeviceKind::Simulated => Box::new(Sanitized::new(SimulatedDevice::new(
            config.simulation_params(),
        ))),
        DeviceKind::Replay => {
            let path = config.replay_path.as_ref().ok_or_else(|| {
                DeviceError::NotFound("replay device requires a replay_path".into())
            })?;
            Box::new(Sanitized::new(ReplayDevice::new(path, config.loop_replay)))
        }
    };

    device.open()?;
    info!(
        "Opened {} device: {}",
        config.kind,
        device.info().model_name
    );
    Ok(device)
}
