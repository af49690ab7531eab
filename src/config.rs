//! Application configuration
//!
//! Stored as TOML. Every field has a serde default so hand-edited files may
//! leave out anything they don't care about.

use haptic_device::DeviceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Headless monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Print a live status line
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Milliseconds between snapshot reads
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_ms: default_refresh_ms(),
        }
    }
}

/// Snapshot recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// JSON-lines file the monitor appends observed snapshots to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Loop bounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Stop after this many iterations (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub record: RecordConfig,
    #[serde(default)]
    pub control: ControlConfig,
}

fn default_true() -> bool {
    true
}

fn default_refresh_ms() -> u64 {
    50
}

impl AppConfig {
    /// Default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("haptic-predict")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
