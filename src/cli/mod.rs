// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod led;
pub mod scan;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::config::EdgeConfig;

/// Bookiki shelf edge programs
#[derive(Parser, Debug)]
#[command(name = "bookiki-edge")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Shelf scanner and LED indicator for Bookiki libraries", long_about = None)]
pub struct Cli {
    /// TOML config file (defaults to ./bookiki.toml when present)
    #[arg(long, global = true, env = "BOOKIKI_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the camera storage, scan each snapshot and upload the report
    Scan,

    /// Scan a single local image and print the report
    ScanOnce(scan::ScanOnceArgs),

    /// Light shelves on messages from the backend WebSocket
    Led,

    /// Bench-test server: relay LED numbers typed on stdin to clients
    LedDemoServer(led::DemoServerArgs),

    /// Bench-test client: light one rainbow LED per received number
    LedDemoClient(led::DemoClientArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli, shutdown: CancellationToken) -> Result<()> {
    let config = EdgeConfig::load(cli.config.as_deref()).context("Invalid configuration")?;

    match cli.command {
        Commands::Scan => scan::run_scanner(&config, shutdown).await,
        Commands::ScanOnce(args) => scan::scan_once(&config, args).await,
        Commands::Led => led::run_led_client(&config, shutdown).await,
        Commands::LedDemoServer(args) => led::run_demo_server(&config, args, shutdown).await,
        Commands::LedDemoClient(args) => led::run_demo_client(&config, args, shutdown).await,
    }
}
