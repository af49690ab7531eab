//! haptic-predict
//!
//! Runs the velocity filter and position predictor loop against a simulated
//! or replayed haptic device.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;
use tracing::{info, warn};

use haptic_predict::cli::{Cli, Commands, ConfigAction, RunArgs};
use haptic_predict::{run_session, AppConfig, StopFlag};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);

    match cli.command {
        None => run(&config_path, &RunArgs::default()),
        Some(Commands::Run(args)) => run(&config_path, &args),
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { force } => config_init(&config_path, force),
            ConfigAction::Show => config_show(&config_path),
        },
    }
}

fn run(config_path: &Path, args: &RunArgs) -> Result<()> {
    info!("Loading config from {:?}", config_path);
    let mut config = AppConfig::load(config_path)?;
    args.apply(&mut config);

    let stop = StopFlag::new();
    let handler_flag = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.stop()) {
        warn!("Could not set Ctrl+C handler: {e}");
    }

    let report = run_session(&config, stop)?;
    let stats = &report.loop_stats;
    info!(
        "{} samples published, {} jitter holds, {} dead-zone hits, {} read errors",
        stats.published, stats.jitter_holds, stats.dead_zone_hits, stats.read_errors
    );
    if let Some(monitor) = &report.monitor {
        if monitor.recorded > 0 {
            info!("{} snapshots recorded", monitor.recorded);
        }
    }
    Ok(())
}

fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppConfig::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn config_show(path: &Path) -> Result<()> {
    let config = AppConfig::load(path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
