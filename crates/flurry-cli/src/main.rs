#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, CliConfig, Command};
use telemetry::init_telemetry;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match config.command {
        Command::Generate { count, padded } => {
            commands::generate(config.options, config.monotonic, count, padded, &mut out)
        }
        Command::Decode { ref ids } => commands::decode(config.options, ids, &mut out),
    }
}

fn log_startup_info(config: &CliConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting flurry with full config: {:#?}", config);
    } else {
        tracing::debug!(
            "Starting flurry with instance id {} and epoch {} ms",
            config.options.instance_id,
            config.options.epoch.as_millis()
        );
    }
}
