mod args;
mod output;
mod runner;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::warn;

use args::Cli;
use lockpick_common::CrackerConfig;
use lockpick_telemetry::LogSettings;
use runner::run_crack;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // config first: it decides the log level and log file
    let (config, config_error) = CrackerConfig::load_or_default(&cli.config);
    let _log_guard = lockpick_telemetry::init(
        &LogSettings::from_level_name(&config.log_level)
            .with_verbosity(cli.verbose)
            .with_file(config.log_file()),
    );
    if let Some(e) = config_error {
        warn!("Error loading config {}: {}. Using defaults.", cli.config.display(), e);
    }

    run_crack(cli, config).await
}
