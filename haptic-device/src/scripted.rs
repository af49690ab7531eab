//! In-memory device that plays back a fixed script
//!
//! Used by tests and demos to drive the loop with exact inputs.

use crate::error::DeviceError;
use crate::types::{DeviceInfo, DeviceSample, USER_SWITCH_COUNT};

/// One scripted poll result
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Sample(DeviceSample),
    /// Fail this poll with an internal error
    ReadError,
}

impl From<DeviceSample> for ScriptStep {
    fn from(sample: DeviceSample) -> Self {
        ScriptStep::Sample(sample)
    }
}

pub struct ScriptedDevice {
    steps: Vec<ScriptStep>,
    looping: bool,
    info: DeviceInfo,
    cursor: usize,
    open: bool,
    reads: u64,
}

impl ScriptedDevice {
    /// Play `samples` once, then report end of stream
    pub fn new(samples: impl IntoIterator<Item = DeviceSample>) -> Self {
        Self::from_steps(samples.into_iter().map(ScriptStep::Sample).collect(), false)
    }

    /// Play `samples` forever
    pub fn looping(samples: impl IntoIterator<Item = DeviceSample>) -> Self {
        Self::from_steps(samples.into_iter().map(ScriptStep::Sample).collect(), true)
    }

    pub fn from_steps(steps: Vec<ScriptStep>, looping: bool) -> Self {
        Self {
            steps,
            looping,
            info: DeviceInfo {
                model_name: "Scripted".into(),
                sensed_rotation: false,
                has_gripper: false,
                user_switch_count: USER_SWITCH_COUNT,
            },
            cursor: 0,
            open: false,
            reads: 0,
        }
    }

    pub fn with_info(mut self, info: DeviceInfo) -> Self {
        self.info = info;
        self
    }

    /// Polls attempted while open
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl crate::HapticDevice for ScriptedDevice {
    fn open(&mut self) -> Result<(), DeviceError> {
        self.open = true;
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.open = false;
        Ok(())
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn read_sample(&mut self) -> Result<DeviceSample, DeviceError> {
        if !self.open {
            return Err(DeviceError::NotOpen);
        }
        self.reads += 1;

        if self.cursor >= self.steps.len() {
            if !self.looping || self.steps.is_empty() {
                return Err(DeviceError::EndOfStream);
            }
            self.cursor = 0;
        }
        let step = &self.steps[self.cursor];
        self.cursor += 1;

        match step {
            ScriptStep::Sample(sample) => Ok(sample.clone()),
            ScriptStep::ReadError => Err(DeviceError::Internal(format!(
                "scripted read failure at step {}",
                self.cursor - 1
            ))),
        }
    }
}
