//! Headless monitor
//!
//! Stands in for a render path: wakes on a fixed refresh interval, reads the
//! latest snapshot and, when it changed, prints a status line and/or records
//! it. It never touches loop state beyond the snapshot slot and stop flag.

use std::io::Write;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::anyhow;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::driver::StopFlag;
use crate::recorder::SnapshotRecorder;
use crate::snapshot::{PublishedState, SnapshotReader};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Refresh ticks
    pub frames: u64,
    /// Frames that found a snapshot newer than the previous one
    pub fresh_frames: u64,
    pub recorded: u64,
}

/// One-line summary of a snapshot
pub fn format_status(state: &PublishedState) -> String {
    let p = &state.position;
    let q = &state.predicted_position;
    let v = state.filtered_velocity_segment.direction();
    let a = state.average_velocity_segment.direction();
    format!(
        "#{:<8} {:>7.1} Hz  pos [{:+.4} {:+.4} {:+.4}]  pred [{:+.4} {:+.4} {:+.4}]  vel [{:+.4} {:+.4} {:+.4}]  avg [{:+.4} {:+.4} {:+.4}]{}",
        state.sequence,
        state.sample_rate_hz,
        p.x, p.y, p.z,
        q.x, q.y, q.z,
        v.x, v.y, v.z,
        a.x, a.y, a.z,
        if state.dead_zone { "  (still)" } else { "" }
    )
}

pub struct Monitor {
    reader: SnapshotReader,
    stop: StopFlag,
    refresh: Duration,
    status_line: bool,
    recorder: Option<SnapshotRecorder>,
    last_sequence: u64,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(reader: SnapshotReader, stop: StopFlag, config: &MonitorConfig) -> Self {
        Self {
            reader,
            stop,
            refresh: Duration::from_millis(config.refresh_ms.max(1)),
            status_line: config.enabled,
            recorder: None,
            last_sequence: 0,
            stats: MonitorStats::default(),
        }
    }

    pub fn with_recorder(mut self, recorder: SnapshotRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    /// Run one refresh tick, returning whether a new snapshot was seen
    pub fn poll(&mut self) -> anyhow::Result<bool> {
        self.stats.frames += 1;
        let state = self.reader.latest();
        if state.sequence == self.last_sequence {
            return Ok(false);
        }
        self.last_sequence = state.sequence;
        self.stats.fresh_frames += 1;

        if self.status_line {
            let mut out = std::io::stdout().lock();
            write!(out, "\r{}", format_status(&state))?;
            out.flush()?;
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(&state)?;
            self.stats.recorded += 1;
        }
        Ok(true)
    }

    /// Refresh until the stop flag is set, then take one final frame
    pub fn run(mut self) -> anyhow::Result<MonitorStats> {
        debug!("Monitor running every {:?}", self.refresh);
        while !self.stop.is_stopped() {
            self.poll()?;
            std::thread::sleep(self.refresh);
        }
        self.poll()?;

        if self.status_line {
            println!();
        }
        if let Some(recorder) = self.recorder.take() {
            let path = recorder.path().display().to_string();
            let written = recorder.finish()?;
            debug!("Recorded {written} snapshots to {path}");
        }
        Ok(self.stats)
    }

    pub fn spawn(self) -> std::io::Result<MonitorHandle> {
        let thread = std::thread::Builder::new()
            .name("haptic-monitor".into())
            .spawn(move || self.run())?;
        Ok(MonitorHandle { thread })
    }
}

pub struct MonitorHandle {
    thread: JoinHandle<anyhow::Result<MonitorStats>>,
}

impl MonitorHandle {
    /// Wait for the monitor to exit; the stop flag must already be set
    pub fn join(self) -> anyhow::Result<MonitorStats> {
        self.thread
            .join()
            .map_err(|_| anyhow!("Monitor thread panicked"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::snapshot_channel;

    fn quiet() -> MonitorConfig {
        MonitorConfig {
            enabled: false,
            refresh_ms: 1,
        }
    }

    #[test]
    fn test_poll_only_counts_new_snapshots() {
        let (publisher, reader) = snapshot_channel();
        let mut monitor = Monitor::new(reader, StopFlag::new(), &quiet());

        assert!(!monitor.poll().unwrap());
        publisher.publish(PublishedState {
            sequence: 1,
            ..PublishedState::default()
        });
        assert!(monitor.poll().unwrap());
        assert!(!monitor.poll().unwrap());
        assert_eq!(monitor.stats().frames, 3);
        assert_eq!(monitor.stats().fresh_frames, 1);
    }

    #[test]
    fn test_stopped_monitor_takes_final_frame() {
        let (publisher, reader) = snapshot_channel();
        let stop = StopFlag::new();
        stop.stop();
        publisher.publish(PublishedState {
            sequence: 9,
            ..PublishedState::default()
        });

        let stats = Monitor::new(reader, stop, &quiet()).run().unwrap();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.fresh_frames, 1);
    }

    #[test]
    fn test_status_line_mentions_dead_zone() {
        let state = PublishedState {
            sequence: 3,
            dead_zone: true,
            ..PublishedState::default()
        };
        let line = format_status(&state);
        assert!(line.starts_with("#3"));
        assert!(line.ends_with("(still)"));
    }
}
