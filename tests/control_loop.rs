//! Control loop integration tests
//!
//! Drive whole sessions and spawned loops through the public API with
//! simulated, replayed and scripted devices.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use haptic_device::{
    open_device, write_jsonl, DeviceConfig, DeviceError, DeviceInfo, DeviceKind, DeviceSample,
    HapticDevice, ScriptedDevice, SimulatedDevice, SimulationParams, USER_SWITCH_COUNT,
};
use haptic_predict::config::{ControlConfig, MonitorConfig, RecordConfig};
use haptic_predict::{
    run_session, run_session_with_device, snapshot_channel, AppConfig, LoopDriver, StopFlag,
};
use motion_filter::Vec3;
use parking_lot::Mutex;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "haptic-predict-it-{}-{name}.jsonl",
        std::process::id()
    ))
}

fn unpaced_device() -> DeviceConfig {
    DeviceConfig {
        poll_interval_us: 0,
        ..DeviceConfig::default()
    }
}

fn quiet_monitor() -> MonitorConfig {
    MonitorConfig {
        enabled: false,
        refresh_ms: 5,
    }
}

// ── Sessions ──

#[test]
fn bounded_simulated_session_records_snapshots() {
    let record = temp_path("bounded-record");
    let config = AppConfig {
        device: unpaced_device(),
        monitor: quiet_monitor(),
        record: RecordConfig {
            path: Some(record.clone()),
        },
        control: ControlConfig {
            max_iterations: Some(2000),
        },
    };

    let report = run_session(&config, StopFlag::new()).unwrap();
    assert_eq!(report.loop_stats.iterations, 2000);
    assert_eq!(report.loop_stats.published, 2000);
    assert!(!report.loop_stats.end_of_stream);

    let monitor = report.monitor.expect("recording runs the monitor");
    assert!(monitor.recorded >= 1);

    let content = std::fs::read_to_string(&record).unwrap();
    let sequences: Vec<u64> = content
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["sequence"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(sequences.len() as u64, monitor.recorded);
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    // The monitor's last frame comes after the loop has finished
    assert_eq!(sequences.last(), Some(&2000));
    std::fs::remove_file(&record).ok();
}

#[test]
fn replay_session_stops_at_end_of_recording() {
    let input = temp_path("replay-input");
    let mut sim = SimulatedDevice::new(SimulationParams {
        poll_interval_us: 0,
        ..SimulationParams::default()
    });
    sim.open().unwrap();
    let samples: Vec<DeviceSample> = (0..300).map(|_| sim.read_sample().unwrap()).collect();
    write_jsonl(&input, &samples).unwrap();

    let config = AppConfig {
        device: DeviceConfig {
            kind: DeviceKind::Replay,
            replay_path: Some(input.clone()),
            ..unpaced_device()
        },
        monitor: quiet_monitor(),
        ..AppConfig::default()
    };
    let report = run_session(&config, StopFlag::new()).unwrap();
    assert!(report.loop_stats.end_of_stream);
    assert_eq!(report.loop_stats.published, 300);
    assert!(report.monitor.is_none());
    std::fs::remove_file(&input).ok();
}

#[test]
fn stopped_session_exits_without_iterating() {
    let stop = StopFlag::new();
    stop.stop();
    let config = AppConfig {
        device: unpaced_device(),
        monitor: quiet_monitor(),
        ..AppConfig::default()
    };
    let report = run_session(&config, stop).unwrap();
    assert_eq!(report.loop_stats.iterations, 0);
}

// ── Shutdown ordering ──

/// Device that notices reads after close and where close was called from
struct WatchedDevice {
    info: DeviceInfo,
    reads: Arc<AtomicU64>,
    reads_at_close: Arc<AtomicU64>,
    read_after_close: Arc<AtomicBool>,
    close_thread: Arc<Mutex<Option<String>>>,
    closed: bool,
}

impl HapticDevice for WatchedDevice {
    fn open(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closed = true;
        self.reads_at_close
            .store(self.reads.load(Ordering::SeqCst), Ordering::SeqCst);
        *self.close_thread.lock() = std::thread::current().name().map(str::to_string);
        Ok(())
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn read_sample(&mut self) -> Result<DeviceSample, DeviceError> {
        if self.closed {
            self.read_after_close.store(true, Ordering::SeqCst);
            return Err(DeviceError::NotOpen);
        }
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(DeviceSample::moving(
            Vec3::new(n as f64 * 1e-6, 0.0, 0.0),
            Vec3::new(0.001, 0.0, 0.0),
        ))
    }
}

#[test]
fn terminate_closes_device_after_loop_exits() {
    let reads = Arc::new(AtomicU64::new(0));
    let reads_at_close = Arc::new(AtomicU64::new(u64::MAX));
    let read_after_close = Arc::new(AtomicBool::new(false));
    let close_thread = Arc::new(Mutex::new(None));

    let device = WatchedDevice {
        info: DeviceInfo {
            model_name: "Watched".into(),
            sensed_rotation: false,
            has_gripper: false,
            user_switch_count: USER_SWITCH_COUNT,
        },
        reads: reads.clone(),
        reads_at_close: reads_at_close.clone(),
        read_after_close: read_after_close.clone(),
        close_thread: close_thread.clone(),
        closed: false,
    };

    let (publisher, reader) = snapshot_channel();
    let handle = LoopDriver::new(device, publisher, StopFlag::new())
        .spawn()
        .unwrap();
    while reader.latest().sequence < 50 {
        std::thread::yield_now();
    }

    let stats = handle.terminate().unwrap();
    assert!(!read_after_close.load(Ordering::SeqCst));
    assert_eq!(reads_at_close.load(Ordering::SeqCst), reads.load(Ordering::SeqCst));
    assert_eq!(stats.published, reads.load(Ordering::SeqCst));
    assert_ne!(close_thread.lock().as_deref(), Some("haptic-loop"));
}

#[test]
fn terminate_stops_paced_simulated_device() {
    let config = DeviceConfig {
        poll_interval_us: 200,
        ..DeviceConfig::default()
    };
    let device = open_device(&config).unwrap();

    let (publisher, reader) = snapshot_channel();
    let stop = StopFlag::new();
    let handle = LoopDriver::new(device, publisher, stop.clone()).spawn().unwrap();
    while reader.latest().sequence < 20 {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    let stats = handle.terminate().unwrap();
    assert!(stop.is_stopped());
    assert!(stats.published >= 20);
    assert!(reader.latest().is_consistent());
}

// ── Filtering through the loop ──

#[test]
fn spike_is_held_in_published_prediction() {
    let velocity = Vec3::new(0.004, 0.0, 0.0);
    let spike = Vec3::new(0.04, 0.0, 0.0);
    let position = Vec3::new(0.1, 0.2, 0.3);

    let mut device = ScriptedDevice::new([
        DeviceSample::moving(position, velocity),
        DeviceSample::moving(position, spike),
        DeviceSample::moving(position, velocity),
    ]);
    device.open().unwrap();

    let (publisher, reader) = snapshot_channel();
    let mut driver = LoopDriver::new(device, publisher, StopFlag::new());

    driver.step();
    driver.step();
    let held = reader.latest();
    assert_eq!(held.sequence, 2);
    assert_eq!(held.filtered_velocity_segment.end, position + velocity);
    assert_eq!(held.predicted_position, position + velocity);
    assert_eq!(driver.stats().jitter_holds, 1);

    let stats = driver.run();
    assert!(stats.end_of_stream);
    assert_eq!(stats.published, 3);
}

// ── Setup failures ──

/// Device whose gripper switch can be made to fail; records whether it was closed
struct SetupDevice {
    info: DeviceInfo,
    fail_switch: bool,
    closed: Arc<AtomicBool>,
}

impl SetupDevice {
    fn new(fail_switch: bool, closed: Arc<AtomicBool>) -> Self {
        Self {
            info: DeviceInfo {
                model_name: "Setup".into(),
                sensed_rotation: false,
                has_gripper: true,
                user_switch_count: USER_SWITCH_COUNT,
            },
            fail_switch,
            closed,
        }
    }
}

impl HapticDevice for SetupDevice {
    fn open(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn enable_gripper_user_switch(&mut self, _enabled: bool) -> Result<(), DeviceError> {
        if self.fail_switch {
            return Err(DeviceError::Internal("switch unavailable".into()));
        }
        Ok(())
    }

    fn read_sample(&mut self) -> Result<DeviceSample, DeviceError> {
        Err(DeviceError::EndOfStream)
    }
}

#[test]
fn test_gripper_switch_failure_closes_device() {
    let closed = Arc::new(AtomicBool::new(false));
    let config = AppConfig {
        monitor: quiet_monitor(),
        ..AppConfig::default()
    };

    let result = run_session_with_device(
        SetupDevice::new(true, closed.clone()),
        &config,
        StopFlag::new(),
    );
    assert!(result.is_err());
    assert!(closed.load(Ordering::SeqCst));
}

#[test]
fn test_recording_failure_closes_device() {
    let closed = Arc::new(AtomicBool::new(false));
    let config = AppConfig {
        monitor: quiet_monitor(),
        // A directory cannot be opened as the recording file
        record: RecordConfig {
            path: Some(std::env::temp_dir()),
        },
        ..AppConfig::default()
    };

    let result = run_session_with_device(
        SetupDevice::new(false, closed.clone()),
        &config,
        StopFlag::new(),
    );
    assert!(result.is_err());
    assert!(closed.load(Ordering::SeqCst));
}

#[test]
fn test_session_end_releases_monitor() {
    let closed = Arc::new(AtomicBool::new(false));
    let stop = StopFlag::new();
    let config = AppConfig {
        monitor: MonitorConfig {
            enabled: true,
            refresh_ms: 5,
        },
        ..AppConfig::default()
    };

    let report =
        run_session_with_device(SetupDevice::new(false, closed.clone()), &config, stop.clone())
            .unwrap();
    assert!(report.loop_stats.end_of_stream);
    assert!(report.monitor.is_some());
    assert!(stop.is_stopped());
    assert!(closed.load(Ordering::SeqCst));
}
