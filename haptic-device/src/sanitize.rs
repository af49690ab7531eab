//! Non-finite sample repair
//!
//! Downstream filters assume finite input. `Sanitized` replaces every NaN or
//! infinite component with the last finite value seen for that component.
//! Before any sample has been read the fallback is the neutral sample (zero
//! vectors, identity rotation).

use nalgebra::SMatrix;
use tracing::warn;

use crate::error::DeviceError;
use crate::types::{DeviceInfo, DeviceSample};
use crate::HapticDevice;

/// Log the first repair and then every this many
const WARN_EVERY: u64 = 1000;

pub struct Sanitized<D> {
    inner: D,
    last_finite: DeviceSample,
    repairs: u64,
}

impl<D: HapticDevice> Sanitized<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            last_finite: DeviceSample::default(),
            repairs: 0,
        }
    }

    /// Samples that needed at least one component replaced
    pub fn repairs(&self) -> u64 {
        self.repairs
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    fn repair(&mut self, sample: &mut DeviceSample) {
        let Some(field) = sample.first_non_finite() else {
            return;
        };
        self.repairs += 1;
        if self.repairs == 1 || self.repairs % WARN_EVERY == 0 {
            let err = DeviceError::NonFinite { field };
            warn!("{err}; substituting last finite values ({} so far)", self.repairs);
        }

        let last = &self.last_finite;
        repair_matrix(&mut sample.position, &last.position);
        repair_matrix(&mut sample.rotation, &last.rotation);
        repair_scalar(&mut sample.gripper_angle, last.gripper_angle);
        repair_matrix(&mut sample.linear_velocity, &last.linear_velocity);
        repair_matrix(&mut sample.angular_velocity, &last.angular_velocity);
        repair_scalar(
            &mut sample.gripper_angular_velocity,
            last.gripper_angular_velocity,
        );
    }
}

fn repair_scalar(value: &mut f64, fallback: f64) {
    if !value.is_finite() {
        *value = fallback;
    }
}

fn repair_matrix<const R: usize, const C: usize>(
    value: &mut SMatrix<f64, R, C>,
    fallback: &SMatrix<f64, R, C>,
) {
    for (v, f) in value.iter_mut().zip(fallback.iter()) {
        repair_scalar(v, *f);
    }
}

impl<D: HapticDevice> HapticDevice for Sanitized<D> {
    fn open(&mut self) -> Result<(), DeviceError> {
        self.last_finite = DeviceSample::default();
        self.repairs = 0;
        self.inner.open()
    }

    fn calibrate(&mut self) -> Result<(), DeviceError> {
        self.inner.calibrate()
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.inner.close()
    }

    fn info(&self) -> &DeviceInfo {
        self.inner.info()
    }

    fn enable_gripper_user_switch(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.inner.enable_gripper_user_switch(enabled)
    }

    fn read_sample(&mut self) -> Result<DeviceSample, DeviceError> {
        let mut sample = self.inner.read_sample()?;
        self.repair(&mut sample);
        self.last_finite = sample.clone();
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedDevice;
    use nalgebra::{Matrix3, Vector3};

    #[test]
    fn test_nan_before_any_finite_becomes_neutral() {
        let mut bad = DeviceSample::default();
        bad.linear_velocity = Vector3::new(f64::NAN, 0.01, f64::NEG_INFINITY);
        bad.rotation[(1, 1)] = f64::NAN;

        let mut device = Sanitized::new(ScriptedDevice::new([bad]));
        device.open().unwrap();
        let sample = device.read_sample().unwrap();
        assert_eq!(sample.linear_velocity, Vector3::new(0.0, 0.01, 0.0));
        assert_eq!(sample.rotation, Matrix3::identity());
        assert_eq!(device.repairs(), 1);
    }

    #[test]
    fn test_finite_samples_pass_through() {
        let good = DeviceSample::moving(Vector3::new(0.1, 0.2, 0.3), Vector3::new(0.01, 0.0, 0.0));
        let mut device = Sanitized::new(ScriptedDevice::new([good.clone()]));
        device.open().unwrap();
        assert_eq!(device.read_sample().unwrap(), good);
        assert_eq!(device.repairs(), 0);
    }

    #[test]
    fn test_errors_pass_through() {
        let mut device = Sanitized::new(ScriptedDevice::new(Vec::new()));
        device.open().unwrap();
        assert!(matches!(device.read_sample(), Err(DeviceError::EndOfStream)));
    }
}
