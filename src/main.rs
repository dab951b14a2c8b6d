//! sandbox-hmr - development server for micro-frontend modules.

#![allow(dead_code)]

mod actor;
mod build;
mod cli;
mod config;
mod core;
mod embed;
mod locale;
mod logger;
mod module_map;
mod relay;
mod reload;
mod render;
mod scenario;
mod store;
mod utils;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SandboxConfig;
use logger::Logger;

/// How long background tasks get to finish after the command returns.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SandboxConfig::load(&cli)?;
    let logger = Logger::new(config.log_level());
    config.warn_unknown_fields(&logger);

    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler(logger.clone())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let result = match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(&config, logger, &runtime),
        Commands::Map { pretty } => cli::map::print_module_map(&config, &logger, &runtime, *pretty),
    };

    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}
