// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! WebSocket client that listens for shelf locations and lights the strip

use anyhow::Result;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::controller::ShelfLightController;
use super::message::IotMessage;
use crate::config::LedConfig;

const COMMAND_QUEUE: usize = 32;

/// Work handed to the strip worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    LightShelf(i64),
    TurnOff,
}

/// Map one text frame to a strip command, logging anything unusable
pub fn command_for_text(text: &str) -> Option<LedCommand> {
    match IotMessage::parse(text) {
        Ok(IotMessage::ConnectSuccess) => {
            info!("Backend confirmed the connection");
            None
        }
        Ok(IotMessage::ShelfLocation { shelf, book_id }) => {
            info!("Book {:?} belongs on shelf {}", book_id, shelf.id);
            Some(LedCommand::LightShelf(shelf.id))
        }
        Ok(IotMessage::Unrecognized(value)) => {
            warn!("Invalid message: {}", value);
            None
        }
        Err(e) => {
            warn!("Failed to parse message {:?}: {}", text, e);
            None
        }
    }
}

pub struct LedClient {
    url: String,
    reconnect_delay: Duration,
    controller: ShelfLightController,
}

impl LedClient {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration, controller: ShelfLightController) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
            controller,
        }
    }

    pub fn from_config(config: &LedConfig, controller: ShelfLightController) -> Self {
        Self::new(config.ws_url.clone(), config.reconnect_delay(), controller)
    }

    /// Connect, listen and reconnect until `shutdown` fires.
    ///
    /// A failed connect waits `reconnect_delay`; a connection that ends is
    /// retried at once. On shutdown queued commands are dropped and the
    /// strip is switched off.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let worker = spawn_worker(self.controller, rx, shutdown.clone());

        send(&tx, LedCommand::TurnOff);

        while !shutdown.is_cancelled() {
            info!("Connecting to {}", self.url);
            let connected = tokio::select! {
                _ = shutdown.cancelled() => break,
                res = connect_async(self.url.as_str()) => res,
            };

            let ws_stream = match connected {
                Ok((ws_stream, _)) => ws_stream,
                Err(e) => {
                    error!("Connection to {} failed: {}", self.url, e);
                    info!("Reconnecting in {:?}", self.reconnect_delay);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => continue,
                    }
                }
            };

            info!("Connected to {}", self.url);
            let (_write, mut read) = ws_stream.split();
            loop {
                let next = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    msg = read.next() => msg,
                };
                match next {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received: {}", text);
                        if let Some(cmd) = command_for_text(&text) {
                            send(&tx, cmd);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!("Server closed the connection: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("Connection ended");
                        break;
                    }
                }
            }
            // The worker switches off by itself on shutdown
            if !shutdown.is_cancelled() {
                send(&tx, LedCommand::TurnOff);
            }
        }

        drop(tx);
        if let Err(e) = worker.await {
            error!("LED worker stopped abnormally: {}", e);
        }
        info!("LED client stopped");
        Ok(())
    }
}

/// Queue a command without waiting; a full queue drops it
fn send(tx: &mpsc::Sender<LedCommand>, cmd: LedCommand) {
    match tx.try_send(cmd) {
        Ok(()) => {}
        Err(TrySendError::Full(cmd)) => warn!("LED queue full, dropping {:?}", cmd),
        Err(TrySendError::Closed(cmd)) => error!("LED worker is gone, dropping {:?}", cmd),
    }
}

/// Run strip commands in order until `shutdown`, then leave the strip dark
fn spawn_worker(
    mut controller: ShelfLightController,
    mut rx: mpsc::Receiver<LedCommand>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    controller.interrupt_on(shutdown.clone());
    tokio::spawn(async move {
        loop {
            let cmd = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                cmd = rx.recv() => match cmd {
                    Some(cmd) => cmd,
                    None => break,
                },
            };
            let res = match cmd {
                LedCommand::LightShelf(id) => controller.light_shelf(id).await,
                LedCommand::TurnOff => controller.turn_off().await,
            };
            if let Err(e) = res {
                error!("LED command {:?} failed: {}", cmd, e);
            }
        }

        rx.close();
        if let Err(e) = controller.turn_off().await {
            error!("Failed to switch LEDs off: {}", e);
        }
    })
}
