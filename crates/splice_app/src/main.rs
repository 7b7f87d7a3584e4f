mod app;
mod config;
mod effects;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use engine_logging::{engine_error, engine_info, engine_warn, LogDestination};

use crate::app::Finish;
use crate::config::{ClientConfig, DEFAULT_CONFIG_FILE};

fn main() -> anyhow::Result<ExitCode> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let loaded = ClientConfig::load(&path)?;
    let mut config = loaded.config;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    engine_logging::initialize(LogDestination::from_flag(config.log_to_file));
    if !loaded.from_file {
        engine_warn!("No config at {:?}; using defaults", path);
    }

    let finish = app::run(&config).context("failed to start the batch client")?;
    match finish {
        Finish::Completed => {
            engine_info!("All videos created");
            Ok(ExitCode::SUCCESS)
        }
        other => {
            engine_error!("Run did not complete: {:?}", other);
            Ok(ExitCode::FAILURE)
        }
    }
}
