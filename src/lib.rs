// Haptic velocity filter and position predictor - shared library
// Control loop, snapshot hand-off, monitor and configuration

pub mod cli;
pub mod config;
pub mod driver;
pub mod monitor;
pub mod rate;
pub mod recorder;
pub mod session;
pub mod snapshot;

pub use config::AppConfig;
pub use driver::{LoopDriver, LoopHandle, LoopState, LoopStats, StepOutcome, StopFlag};
pub use monitor::{Monitor, MonitorHandle, MonitorStats};
pub use rate::FrequencyCounter;
pub use recorder::SnapshotRecorder;
pub use session::{run_session, run_session_with_device, SessionReport};
pub use snapshot::{snapshot_channel, PublishedState, Segment, SnapshotPublisher, SnapshotReader};
