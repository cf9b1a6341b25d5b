// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bench-test pair for the strip
//!
//! The server reads LED numbers from a line channel (stdin in the CLI) and
//! broadcasts them to every connected client. The client lights the matching
//! LED in its rainbow colour.

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use std::io::BufRead;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::color::{rainbow, Rgb};
use super::controller::ShelfLightController;

const BROADCAST_CAPACITY: usize = 64;
const INPUT_QUEUE: usize = 16;

/// Parse a 1-based LED number, accepting only `1..=count`
pub fn parse_led_number(text: &str, count: usize) -> Option<usize> {
    text.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=count).contains(n))
}

/// Forward stdin lines from a detached thread
///
/// A blocked terminal read never holds up runtime shutdown; the thread ends
/// with the process or once the receiver is dropped and another line arrives.
pub fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(INPUT_QUEUE);
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            debug!("stdin reader finished");
        })
        .context("Failed to start the stdin reader")?;
    Ok(rx)
}

pub struct DemoServer {
    listen_addr: String,
    led_count: usize,
}

impl DemoServer {
    pub fn new(listen_addr: impl Into<String>, led_count: usize) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            led_count,
        }
    }

    /// Bind, then serve clients and relay `input` lines until shutdown
    pub async fn start(&self, mut input: mpsc::Receiver<String>) -> Result<DemoServerHandle> {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.listen_addr))?;
        let local_addr = listener.local_addr()?;
        info!("LED demo server listening on {}", local_addr);

        let (tx, _) = broadcast::channel::<String>(BROADCAST_CAPACITY);
        let shutdown = CancellationToken::new();

        let accept_tx = tx.clone();
        let accept_shutdown = shutdown.clone();
        let accept_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = accept_shutdown.cancelled() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, addr)) => {
                            let rx = accept_tx.subscribe();
                            tokio::spawn(handle_connection(stream, addr, rx, accept_shutdown.clone()));
                        }
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                }
            }
        });

        let input_tx = tx.clone();
        let input_shutdown = shutdown.clone();
        let count = self.led_count;
        let input_handle = tokio::spawn(async move {
            loop {
                let line = tokio::select! {
                    _ = input_shutdown.cancelled() => break,
                    line = input.recv() => line,
                };
                let Some(line) = line else {
                    debug!("Input closed");
                    break;
                };
                match parse_led_number(&line, count) {
                    Some(n) => {
                        let receivers = input_tx.send(n.to_string()).unwrap_or(0);
                        info!("Sent LED {} to {} client(s)", n, receivers);
                    }
                    None => warn!("Enter a number between 1 and {}, got {:?}", count, line),
                }
            }
        });

        Ok(DemoServerHandle {
            local_addr,
            tx,
            shutdown,
            accept_handle,
            input_handle,
        })
    }
}

pub struct DemoServerHandle {
    local_addr: SocketAddr,
    tx: broadcast::Sender<String>,
    shutdown: CancellationToken,
    accept_handle: JoinHandle<()>,
    input_handle: JoinHandle<()>,
}

impl DemoServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.accept_handle.await;
        let _ = self.input_handle.await;
        info!("LED demo server stopped");
    }

    /// Wait until `token` fires, then shut down
    pub async fn serve_until(self, token: CancellationToken) {
        token.cancelled().await;
        self.shutdown().await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    mut rx: broadcast::Receiver<String>,
    shutdown: CancellationToken,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", addr, e);
            return;
        }
    };
    info!("Client connected: {}", addr);

    let (mut write, mut read) = ws_stream.split();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            relayed = rx.recv() => match relayed {
                Ok(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        warn!("Send to {} failed: {}", addr, e);
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Client {} skipped {} message(s)", addr, n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Read from {} failed: {}", addr, e);
                    break;
                }
            },
        }
    }
    info!("Client disconnected: {}", addr);
}

/// Lights one LED per numeric message, in rainbow colours
pub struct DemoClient {
    url: String,
    controller: ShelfLightController,
    palette: Vec<Rgb>,
}

impl DemoClient {
    pub fn new(url: impl Into<String>, controller: ShelfLightController) -> Self {
        let palette = rainbow(controller.strip().len());
        Self {
            url: url.into(),
            controller,
            palette,
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        self.controller.turn_off().await?;

        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", self.url))?;
        info!("Connected to {}", self.url);
        let (_write, mut read) = ws_stream.split();

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = read.next() => msg,
            };
            match next {
                Some(Ok(Message::Text(text))) => self.handle(&text)?,
                Some(Ok(Message::Close(_))) | None => {
                    info!("Server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
            }
        }

        self.controller.turn_off().await?;
        Ok(())
    }

    fn handle(&mut self, text: &str) -> Result<()> {
        match parse_led_number(text, self.palette.len()) {
            Some(n) => {
                let index = n - 1;
                self.controller.light_single(index, self.palette[index])?;
                info!("LED {} on", n);
            }
            None => warn!("Ignoring message {:?}", text),
        }
        Ok(())
    }
}
