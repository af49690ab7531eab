//! One prediction session: open the device, run the loop and monitor until
//! stopped, then shut everything down in order

use anyhow::Context;
use haptic_device::{open_device, HapticDevice};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::driver::{LoopDriver, LoopHandle, LoopStats, StopFlag};
use crate::monitor::{Monitor, MonitorHandle, MonitorStats};
use crate::recorder::SnapshotRecorder;
use crate::snapshot::{snapshot_channel, SnapshotReader};

#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub loop_stats: LoopStats,
    /// Absent when neither the status line nor recording was enabled
    pub monitor: Option<MonitorStats>,
}

/// Run until `stop` is set, the iteration bound is reached, or the device
/// runs out of samples
pub fn run_session(config: &AppConfig, stop: StopFlag) -> anyhow::Result<SessionReport> {
    let device = open_device(&config.device)
        .with_context(|| format!("Failed to open {} device", config.device.kind))?;
    run_session_with_device(device, config, stop)
}

/// Same as [`run_session`] for a device that is already open
///
/// The device is closed on every path, including setup failures. The stop
/// flag is set before returning once a monitor thread has been started.
pub fn run_session_with_device<D: HapticDevice + 'static>(
    mut device: D,
    config: &AppConfig,
    stop: StopFlag,
) -> anyhow::Result<SessionReport> {
    let (publisher, reader) = snapshot_channel();
    let monitor = match prepare_device(&mut device)
        .and_then(|()| start_monitor(reader, config, &stop))
    {
        Ok(monitor) => monitor,
        Err(e) => {
            if let Err(close_err) = device.close() {
                warn!("Failed to close device: {close_err}");
            }
            return Err(e);
        }
    };

    let loop_stats = LoopDriver::new(device, publisher, stop.clone())
        .with_max_iterations(config.control.max_iterations)
        .spawn()
        .context("Failed to start loop thread")
        .and_then(LoopHandle::wait);

    // The loop may have ended on its own; release the monitor either way
    stop.stop();
    let monitor = monitor.map(MonitorHandle::join).transpose();

    Ok(SessionReport {
        loop_stats: loop_stats?,
        monitor: monitor?,
    })
}

fn prepare_device<D: HapticDevice>(device: &mut D) -> anyhow::Result<()> {
    device.calibrate().context("Calibration failed")?;

    let info = device.info().clone();
    info!(
        "Device: {} (rotation: {}, gripper: {}, switches: {})",
        info.model_name,
        if info.sensed_rotation { "yes" } else { "no" },
        if info.has_gripper { "yes" } else { "no" },
        info.user_switch_count
    );
    if info.has_gripper {
        device
            .enable_gripper_user_switch(true)
            .context("Failed to enable gripper switch")?;
    }
    Ok(())
}

fn start_monitor(
    reader: SnapshotReader,
    config: &AppConfig,
    stop: &StopFlag,
) -> anyhow::Result<Option<MonitorHandle>> {
    let recorder = config
        .record
        .path
        .as_deref()
        .map(SnapshotRecorder::create)
        .transpose()?;
    if !config.monitor.enabled && recorder.is_none() {
        return Ok(None);
    }

    let mut monitor = Monitor::new(reader, stop.clone(), &config.monitor);
    if let Some(recorder) = recorder {
        info!("Recording snapshots to {}", recorder.path().display());
        monitor = monitor.with_recorder(recorder);
    }
    let handle = monitor.spawn().context("Failed to start monitor thread")?;
    Ok(Some(handle))
}
