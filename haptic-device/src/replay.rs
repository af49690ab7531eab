//! Replay device backed by a JSON-lines recording
//!
//! One `DeviceSample` object per line. Blank lines are skipped. The whole
//! recording is loaded on `open()` so reads never touch the filesystem.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::DeviceError;
use crate::types::{DeviceInfo, DeviceSample, USER_SWITCH_COUNT};

/// Load every sample from a JSON-lines file
pub fn read_jsonl(path: &Path) -> Result<Vec<DeviceSample>, DeviceError> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sample = serde_json::from_str(&line).map_err(|source| DeviceError::Parse {
            line: i + 1,
            source,
        })?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Write samples as JSON lines, replacing any existing file
pub fn write_jsonl(path: &Path, samples: &[DeviceSample]) -> Result<(), DeviceError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for sample in samples {
        serde_json::to_writer(&mut writer, sample)
            .map_err(|e| DeviceError::Internal(format!("Failed to encode sample: {e}")))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub struct ReplayDevice {
    path: PathBuf,
    looping: bool,
    info: DeviceInfo,
    samples: Vec<DeviceSample>,
    cursor: usize,
    open: bool,
}

impl ReplayDevice {
    pub fn new(path: impl Into<PathBuf>, looping: bool) -> Self {
        Self {
            path: path.into(),
            looping,
            info: DeviceInfo {
                model_name: "Replay".into(),
                sensed_rotation: true,
                has_gripper: true,
                user_switch_count: USER_SWITCH_COUNT,
            },
            samples: Vec::new(),
            cursor: 0,
            open: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of samples in the loaded recording
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl crate::HapticDevice for ReplayDevice {
    fn open(&mut self) -> Result<(), DeviceError> {
        self.samples = read_jsonl(&self.path)?;
        self.cursor = 0;
        self.open = true;
        self.info.model_name = format!("Replay ({})", self.path.display());
        info!(
            "Loaded {} samples from {}{}",
            self.samples.len(),
            self.path.display(),
            if self.looping { " (looping)" } else { "" }
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.open = false;
        self.samples.clear();
        Ok(())
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn read_sample(&mut self) -> Result<DeviceSample, DeviceError> {
        if !self.open {
            return Err(DeviceError::NotOpen);
        }
        if self.cursor >= self.samples.len() {
            if !self.looping || self.samples.is_empty() {
                return Err(DeviceError::EndOfStream);
            }
            debug!("Replay wrapped after {} samples", self.samples.len());
            self.cursor = 0;
        }
        let sample = self.samples[self.cursor].clone();
        self.cursor += 1;
        Ok(sample)
    }
}
