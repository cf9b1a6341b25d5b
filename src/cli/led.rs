// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::config::EdgeConfig;
use crate::led::{open_driver, spawn_stdin_reader, DemoClient, DemoServer, LedClient, ShelfLightController};

/// Arguments for led-demo-server command
#[derive(Args, Debug)]
pub struct DemoServerArgs {
    /// Address to listen on (overrides demo.listen_addr)
    #[arg(long)]
    pub listen: Option<String>,
}

/// Arguments for led-demo-client command
#[derive(Args, Debug)]
pub struct DemoClientArgs {
    /// Server URL (overrides demo.server_url)
    #[arg(long)]
    pub url: Option<String>,
}

fn controller(config: &EdgeConfig) -> Result<ShelfLightController> {
    let driver = open_driver(config.led.spi_device.as_deref())?;
    Ok(ShelfLightController::from_config(&config.led, driver))
}

pub async fn run_led_client(config: &EdgeConfig, shutdown: CancellationToken) -> Result<()> {
    let client = LedClient::from_config(&config.led, controller(config)?);
    client.run(shutdown).await
}

pub async fn run_demo_server(
    config: &EdgeConfig,
    args: DemoServerArgs,
    shutdown: CancellationToken,
) -> Result<()> {
    let listen = args.listen.unwrap_or_else(|| config.demo.listen_addr.clone());
    println!("Enter an LED number (1-{}) to light it on every client", config.led.count);

    let server = DemoServer::new(listen, config.led.count);
    let handle = server.start(spawn_stdin_reader()?).await?;
    handle.serve_until(shutdown).await;
    Ok(())
}

pub async fn run_demo_client(
    config: &EdgeConfig,
    args: DemoClientArgs,
    shutdown: CancellationToken,
) -> Result<()> {
    let url = args.url.unwrap_or_else(|| config.demo.server_url.clone());
    DemoClient::new(url, controller(config)?).run(shutdown).await
}
