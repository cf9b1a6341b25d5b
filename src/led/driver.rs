// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pixel drivers: where a rendered frame of wire bytes ends up

use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

use super::LedError;

/// SPI clock used for WS2812 timing: one SPI byte per data bit
pub const WS2812_SPI_HZ: u32 = 6_400_000;

/// SPI byte emitted for a `1` data bit (long high pulse)
pub const BIT_ONE: u8 = 0b1111_0000;

/// SPI byte emitted for a `0` data bit (short high pulse)
pub const BIT_ZERO: u8 = 0b1100_0000;

/// Zero bytes appended to latch the frame (80us low at 6.4 MHz)
pub const RESET_BYTES: usize = 64;

/// Sink for one frame of pixel bytes, already in wire channel order
pub trait PixelDriver: Send + Sync {
    fn write(&mut self, pixel_bytes: &[u8]) -> Result<(), LedError>;
}

/// Expand pixel bytes into the SPI bit pattern, MSB first, plus the latch
pub fn encode_ws2812(pixel_bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixel_bytes.len() * 8 + RESET_BYTES);
    for byte in pixel_bytes {
        for bit in (0..8).rev() {
            out.push(if byte & (1 << bit) != 0 { BIT_ONE } else { BIT_ZERO });
        }
    }
    out.resize(out.len() + RESET_BYTES, 0);
    out
}

/// WS2812 strip on an SPI MOSI line
pub struct Ws2812Spi<W> {
    bus: W,
}

impl<W: Write + Send + Sync> Ws2812Spi<W> {
    pub fn new(bus: W) -> Self {
        Self { bus }
    }

    pub fn into_inner(self) -> W {
        self.bus
    }
}

impl<W: Write + Send + Sync> PixelDriver for Ws2812Spi<W> {
    fn write(&mut self, pixel_bytes: &[u8]) -> Result<(), LedError> {
        let encoded = encode_ws2812(pixel_bytes);
        self.bus.write_all(&encoded)?;
        self.bus.flush()?;
        trace!("Wrote {} SPI bytes", encoded.len());
        Ok(())
    }
}

/// Driver used without hardware: frames are only logged
#[derive(Debug, Default)]
pub struct LogDriver;

impl PixelDriver for LogDriver {
    fn write(&mut self, pixel_bytes: &[u8]) -> Result<(), LedError> {
        let lit = pixel_bytes
            .chunks(3)
            .filter(|px| px.iter().any(|b| *b != 0))
            .count();
        debug!("LED frame: {} of {} pixels lit", lit, pixel_bytes.len() / 3);
        Ok(())
    }
}

/// Driver that keeps every frame in memory, shareable across tasks
#[derive(Debug, Default, Clone)]
pub struct MemoryDriver {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.frames.lock().ok().and_then(|f| f.last().cloned())
    }
}

impl PixelDriver for MemoryDriver {
    fn write(&mut self, pixel_bytes: &[u8]) -> Result<(), LedError> {
        self.frames
            .lock()
            .map_err(|_| LedError::Driver("frame buffer lock poisoned".to_string()))?
            .push(pixel_bytes.to_vec());
        Ok(())
    }
}
