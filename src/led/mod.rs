// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! LED shelf indicator
//!
//! A WS2812 strip mounted along the shelves. The backend pushes a message
//! over WebSocket when a returned book is placed, and the shelf it belongs
//! on lights up for a few seconds.

pub mod client;
pub mod color;
pub mod controller;
pub mod demo;
pub mod driver;
pub mod message;
pub mod spi;
pub mod strip;

pub use client::{LedClient, LedCommand};
pub use color::{rainbow, ColorOrder, Rgb};
pub use controller::ShelfLightController;
pub use demo::{spawn_stdin_reader, DemoClient, DemoServer, DemoServerHandle};
pub use driver::{encode_ws2812, LogDriver, MemoryDriver, PixelDriver, Ws2812Spi};
pub use message::IotMessage;
pub use spi::open_driver;
pub use strip::LedStrip;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedError {
    #[error("LED bus I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("LED index {index} out of range for a strip of {count}")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("SPI output is not supported on this platform")]
    Unsupported,

    #[error("LED driver error: {0}")]
    Driver(String),
}
