// CLI definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use haptic_device::DeviceKind;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "haptic-predict")]
#[command(author, version, about = "Velocity jitter filter and position predictor for haptic devices")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/haptic-predict/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the prediction loop (default)
    Run(RunArgs),

    /// Manage the config file
    #[command(visible_alias = "cfg")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default config
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective config as TOML
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    Simulated,
    Replay,
}

impl From<DeviceArg> for DeviceKind {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Simulated => DeviceKind::Simulated,
            DeviceArg::Replay => DeviceKind::Replay,
        }
    }
}

/// Overrides for the config file; unset flags keep the file's values
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Sample source
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,

    /// JSON-lines recording to replay (implies --device replay)
    #[arg(long, value_name = "FILE")]
    pub replay_file: Option<PathBuf>,

    /// Restart the replay when it runs out
    #[arg(long)]
    pub loop_replay: bool,

    /// Seed for the simulated device
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after N loop iterations
    #[arg(short = 'n', long, value_name = "N")]
    pub iterations: Option<u64>,

    /// Record observed snapshots to a JSON-lines file
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Disable the live status line
    #[arg(long)]
    pub no_monitor: bool,
}

impl RunArgs {
    /// Apply the flags that were given on top of `config`
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.replay_file {
            config.device.kind = DeviceKind::Replay;
            config.device.replay_path = Some(path.clone());
        }
        if let Some(device) = self.device {
            config.device.kind = device.into();
        }
        if self.loop_replay {
            config.device.loop_replay = true;
        }
        if let Some(seed) = self.seed {
            config.device.seed = seed;
        }
        if let Some(n) = self.iterations {
            config.control.max_iterations = Some(n);
        }
        if let Some(path) = &self.record {
            config.record.path = Some(path.clone());
        }
        if self.no_monitor {
            config.monitor.enabled = false;
        }
    }
}
