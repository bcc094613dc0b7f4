mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    skillbook_logging::init_logging(level, config.logging.is_json())?;

    commands::run(cli, config)
}
